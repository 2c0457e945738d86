//! Provides input functionality for structure file formats.
//!
//! Only the lattice information of a structure file is consumed; atomic coordinates are the
//! business of external tooling.

pub mod poscar;
pub mod traits;
