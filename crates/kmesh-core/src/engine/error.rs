use crate::core::cell::CellError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum KGridError {
    #[error("Invalid cell geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid target k-point density {0}: must be positive and finite")]
    InvalidDensity(f64),

    #[error("Target k-point density {target_density} needs more grid points per axis than fit in a u32")]
    GridTooLarge { target_density: f64 },

    #[error("Invalid grid step {0}: must be 1 or 2")]
    InvalidStep(u32),
}

impl From<CellError> for KGridError {
    fn from(e: CellError) -> Self {
        KGridError::InvalidGeometry(e.to_string())
    }
}
