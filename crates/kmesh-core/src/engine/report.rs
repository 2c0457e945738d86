use super::config::{SolverConfig, Strategy};
use super::solver::KGrid;
use crate::core::cell::Cell;
use serde::Serialize;
use std::fmt;

/// Diagnostic summary of a solved grid.
///
/// `axis_densities[i]` is the number of points along reciprocal vector `i` per unit of its
/// length (`n_i / |b_i|`), which equals `n_i * a_i` for orthogonal cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridReport {
    pub grid: KGrid,
    pub strategy: Strategy,
    pub step: u32,
    pub target_density: f64,
    pub actual_density: f64,
    pub axis_densities: [f64; 3],
}

impl GridReport {
    pub fn new(grid: KGrid, cell: &Cell, config: &SolverConfig, target_density: f64) -> Self {
        let rlengths = cell.reciprocal_lengths();
        let counts = grid.as_array();
        Self {
            grid,
            strategy: config.strategy,
            step: config.step.value(),
            target_density,
            actual_density: cell.volume() * grid.total_points() as f64,
            axis_densities: [0, 1, 2].map(|i| f64::from(counts[i]) / rlengths[i]),
        }
    }

    pub fn meets_target(&self) -> bool {
        self.actual_density >= self.target_density
    }
}

impl fmt::Display for GridReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "kgrid: {}", self.grid)?;
        write!(
            f,
            "kpd target: {:.3}, actual kpd: {:.3}",
            self.target_density, self.actual_density
        )?;
        for (i, density) in self.axis_densities.iter().enumerate() {
            write!(f, "\nkvec{} density: {:.3}", i, density)?;
        }
        Ok(())
    }
}
