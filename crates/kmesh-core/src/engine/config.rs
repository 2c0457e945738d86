use super::error::KGridError;
use super::tolerance::Tolerance;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid tolerance (relative={relative}, absolute={absolute}): both must be finite and non-negative")]
    InvalidTolerance { relative: f64, absolute: f64 },
}

/// Granularity of the axis counts: every count is a positive multiple of the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridStep {
    #[default]
    One,
    /// Even-only grids.
    Two,
}

impl GridStep {
    pub fn from_only_even(only_even: bool) -> Self {
        if only_even { GridStep::Two } else { GridStep::One }
    }

    pub fn value(self) -> u32 {
        match self {
            GridStep::One => 1,
            GridStep::Two => 2,
        }
    }

    pub(crate) fn as_f64(self) -> f64 {
        f64::from(self.value())
    }
}

impl TryFrom<u32> for GridStep {
    type Error = KGridError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(GridStep::One),
            2 => Ok(GridStep::Two),
            other => Err(KGridError::InvalidStep(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Floor every axis, then round up axes closest to their next multiple first, bumping
    /// near-equal axes together.
    #[default]
    Balanced,
    /// Choose between the all-floor and all-ceil grids by relative density error. Does not
    /// guarantee the target density is reached.
    FloorCeil,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Balanced => write!(f, "balanced"),
            Strategy::FloorCeil => write!(f, "floor-ceil"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolverConfig {
    pub step: GridStep,
    pub strategy: Strategy,
    pub tolerance: Tolerance,
}

#[derive(Default)]
pub struct SolverConfigBuilder {
    step: Option<GridStep>,
    strategy: Option<Strategy>,
    tolerance: Option<Tolerance>,
}

impl SolverConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: GridStep) -> Self {
        self.step = Some(step);
        self
    }
    pub fn only_even(mut self, only_even: bool) -> Self {
        self.step = Some(GridStep::from_only_even(only_even));
        self
    }
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
    pub fn tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn build(self) -> Result<SolverConfig, ConfigError> {
        let tolerance = self.tolerance.unwrap_or_default();
        if !tolerance.is_valid() {
            return Err(ConfigError::InvalidTolerance {
                relative: tolerance.relative,
                absolute: tolerance.absolute,
            });
        }

        Ok(SolverConfig {
            step: self.step.unwrap_or_default(),
            strategy: self.strategy.unwrap_or_default(),
            tolerance,
        })
    }
}
