//! # Core Module
//!
//! Fundamental data structures for describing periodic crystal cells.
//!
//! - **Cell Representation** ([`cell`]) - Lattice matrix with derived lengths, angles,
//!   volume and reciprocal vectors.
//! - **File I/O** ([`io`]) - Reading cell geometry from structure files.

pub mod cell;
pub mod io;
