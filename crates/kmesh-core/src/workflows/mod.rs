//! # Workflows Module
//!
//! High-level entry points that take a [`Cell`](crate::core::cell::Cell) and a solver
//! configuration through grid sizing and return a diagnostic report.
//!
//! - **Grid Workflow** ([`grid`]) - Solve a k-point grid for one cell and log the outcome.

pub mod grid;
