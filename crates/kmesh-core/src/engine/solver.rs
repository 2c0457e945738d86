use super::config::{GridStep, SolverConfig, Strategy};
use super::error::KGridError;
use crate::core::cell::CellGeometry;
use serde::Serialize;
use std::fmt;
use tracing::{instrument, trace};

/// An immutable k-point sampling grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct KGrid {
    pub nx: u32,
    pub ny: u32,
    pub nz: u32,
}

impl KGrid {
    pub fn new(nx: u32, ny: u32, nz: u32) -> Self {
        Self { nx, ny, nz }
    }

    pub fn as_array(&self) -> [u32; 3] {
        [self.nx, self.ny, self.nz]
    }

    /// Number of k-points in the grid. Cannot overflow: three `u32` factors fit in `u128`.
    pub fn total_points(&self) -> u128 {
        u128::from(self.nx) * u128::from(self.ny) * u128::from(self.nz)
    }

    fn from_counts(counts: [f64; 3], target_density: f64) -> Result<Self, KGridError> {
        let max = f64::from(u32::MAX);
        if counts.iter().any(|&n| n > max) {
            return Err(KGridError::GridTooLarge { target_density });
        }
        Ok(Self::new(counts[0] as u32, counts[1] as u32, counts[2] as u32))
    }
}

impl fmt::Display for KGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {} x {}", self.nx, self.ny, self.nz)
    }
}

/// Sizes k-point grids from cell geometry and a target k-point density.
///
/// The achieved density of a grid is `V * nx * ny * nz`, since the reciprocal-cell volume is
/// `1 / V` when the `2π` factor is left out.
#[derive(Debug, Clone, Default)]
pub struct KGridSolver {
    config: SolverConfig,
}

impl KGridSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Computes the grid for `geometry` at `target_density`.
    ///
    /// # Errors
    ///
    /// Returns [`KGridError::InvalidGeometry`] for non-positive or non-finite lengths or volume
    /// and [`KGridError::InvalidDensity`] for a non-positive or non-finite target. Validation
    /// happens before any arithmetic.
    #[instrument(level = "debug", skip(self, geometry), fields(strategy = %self.config.strategy, step = self.config.step.value()))]
    pub fn solve(
        &self,
        geometry: &CellGeometry,
        target_density: f64,
    ) -> Result<KGrid, KGridError> {
        validate(geometry, target_density)?;

        let counts = match self.config.strategy {
            Strategy::Balanced => self.balanced(geometry, target_density),
            Strategy::FloorCeil => self.floor_ceil(geometry, target_density),
        };
        KGrid::from_counts(counts, target_density)
    }

    fn balanced(&self, geometry: &CellGeometry, target_density: f64) -> [f64; 3] {
        let step = self.config.step.as_f64();
        let volume = geometry.volume;
        let density = |n: &[f64; 3]| volume * n[0] * n[1] * n[2];

        let frac = fractional_counts(geometry, target_density, step);
        let mut counts = frac.map(|f| (f / step).floor() * step);
        let delta_ceil = frac.map(|f| (f / step).ceil() * step - f);

        // Axes closest to their next multiple of `step` are rounded up first.
        let mut order = [0usize, 1, 2];
        order.sort_by(|&i, &j| delta_ceil[i].total_cmp(&delta_ceil[j]));
        trace!(?frac, ?delta_ceil, ?order, "Initial floor grid {:?}", counts);

        let mut actual = density(&counts);
        let mut visited = 0;

        if actual < target_density {
            let tolerance = &self.config.tolerance;
            let [r0, r1, r2] = order;
            let near_pair = tolerance.is_close(frac[r0], frac[r1]);
            let far_pair = tolerance.is_close(frac[r1], frac[r2]);

            if near_pair && far_pair {
                for axis in order {
                    counts[axis] += step;
                }
                visited = 3;
            } else if near_pair {
                counts[r0] += step;
                counts[r1] += step;
                visited = 2;
            } else if far_pair {
                counts[r0] += step;
                if density(&counts) < target_density {
                    counts[r1] += step;
                    counts[r2] += step;
                }
                visited = 3;
            }
            actual = density(&counts);
            trace!(visited, ?counts, actual, "Batch bump applied");
        }

        while actual < target_density && visited < 3 {
            counts[order[visited]] += step;
            actual = density(&counts);
            visited += 1;
        }

        counts
    }

    fn floor_ceil(&self, geometry: &CellGeometry, target_density: f64) -> [f64; 3] {
        let step = self.config.step.as_f64();
        let volume = geometry.volume;
        let relative_error = |n: &[f64; 3]| {
            let actual = volume * n[0] * n[1] * n[2];
            (target_density - actual).abs() / actual
        };

        let frac = fractional_counts(geometry, target_density, step);
        let floor = frac.map(|f| (f / step).floor() * step);
        let ceil = frac.map(|f| (f / step).ceil() * step);

        let (floor_error, ceil_error) = (relative_error(&floor), relative_error(&ceil));
        trace!(?floor, floor_error, ?ceil, ceil_error, "Floor/ceil candidates");

        if ceil_error < floor_error { ceil } else { floor }
    }
}

/// Computes the grid for the given lengths, volume, target density and step (1 or 2) with the
/// default balanced strategy.
pub fn solve(
    lengths: [f64; 3],
    volume: f64,
    target_density: f64,
    step: u32,
) -> Result<KGrid, KGridError> {
    let step = GridStep::try_from(step)?;
    let solver = KGridSolver::new(SolverConfig {
        step,
        ..SolverConfig::default()
    });
    solver.solve(&CellGeometry::new(lengths, volume), target_density)
}

fn validate(geometry: &CellGeometry, target_density: f64) -> Result<(), KGridError> {
    for (axis, &length) in geometry.lengths.iter().enumerate() {
        if !length.is_finite() || length <= 0.0 {
            return Err(KGridError::InvalidGeometry(format!(
                "lattice vector {} has length {}",
                axis, length
            )));
        }
    }
    if !geometry.volume.is_finite() || geometry.volume <= 0.0 {
        return Err(KGridError::InvalidGeometry(format!(
            "cell volume is {}",
            geometry.volume
        )));
    }
    if !target_density.is_finite() || target_density <= 0.0 {
        return Err(KGridError::InvalidDensity(target_density));
    }
    Ok(())
}

/// Fractional axis counts that equalize point density across axes, floored at one step.
fn fractional_counts(geometry: &CellGeometry, target_density: f64, step: f64) -> [f64; 3] {
    let [a, b, c] = geometry.lengths;
    let min_kpts = target_density / geometry.volume;
    let mult = (min_kpts * a * b * c).cbrt();
    geometry.lengths.map(|l| (mult / l).max(step))
}
