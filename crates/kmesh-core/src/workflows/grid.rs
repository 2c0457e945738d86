use crate::core::cell::Cell;
use crate::engine::config::SolverConfig;
use crate::engine::error::KGridError;
use crate::engine::report::GridReport;
use crate::engine::solver::KGridSolver;
use tracing::{debug, info, instrument, warn};

#[instrument(skip(cell, config), name = "grid_workflow")]
pub fn run(
    cell: &Cell,
    config: &SolverConfig,
    target_density: f64,
) -> Result<GridReport, KGridError> {
    let geometry = cell.geometry();
    debug!(
        lengths = ?geometry.lengths,
        volume = geometry.volume,
        angles = ?cell.angles(),
        "Solving k-point grid."
    );

    let solver = KGridSolver::new(config.clone());
    let grid = solver.solve(&geometry, target_density)?;
    let report = GridReport::new(grid, cell, config, target_density);

    info!(
        "kgrid: {} (kpd target: {:.3}, actual kpd: {:.3})",
        report.grid, report.target_density, report.actual_density
    );
    for (i, density) in report.axis_densities.iter().enumerate() {
        debug!("kvec{} density: {:.3}", i, density);
    }
    if !report.meets_target() {
        warn!(
            "Grid {} undershoots the target density ({:.3} < {:.3}).",
            report.grid, report.actual_density, report.target_density
        );
    }

    Ok(report)
}
