//! # Engine Module
//!
//! This module implements the k-point grid sizing engine: given the geometry of a cell and a
//! target k-point density it derives an integer sampling grid that meets the density while
//! staying as isotropic as possible.
//!
//! ## Architecture
//!
//! - **Solver** ([`solver`]) - The grid sizing algorithms and the [`solver::KGrid`] result type
//! - **Configuration** ([`config`]) - Grid step, strategy selection and tie tolerance
//! - **Tolerance** ([`tolerance`]) - Floating-point closeness used to detect near-equal axes
//! - **Reporting** ([`report`]) - Achieved versus target density and per-axis densities
//! - **Error Handling** ([`error`]) - Input-contract violations surfaced before any computation

pub mod config;
pub mod error;
pub mod report;
pub mod solver;
pub mod tolerance;
