//! # kmesh Core Library
//!
//! A small library for sizing k-point sampling grids for periodic electronic-structure
//! calculations from the geometry of a crystal cell.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout so that the numerical core stays free of I/O.
//!
//! - **[`core`]: The Foundation.** Holds the [`Cell`](core::cell::Cell) representation
//!   (lattice vectors, lengths, angles, volume, reciprocal cell) and readers that populate it
//!   from structure files such as VASP POSCARs.
//!
//! - **[`engine`]: The Logic Core.** Implements the grid solver, its configuration, the
//!   closeness tolerance used for tie detection, the error taxonomy, and the diagnostic report.
//!
//! - **[`workflows`]: The Public API.** Ties a cell and a solver configuration together into a
//!   single call that returns a [`GridReport`](engine::report::GridReport) and logs it.

pub mod core;
pub mod engine;
pub mod workflows;
