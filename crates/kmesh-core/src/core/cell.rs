use nalgebra::{Matrix3, Vector3};
use serde::Serialize;
use thiserror::Error;

const RIGHT_ANGLE_TOLERANCE_DEGREES: f64 = 1e-10;
const SINGULARITY_RATIO: f64 = 1e-10;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CellError {
    #[error("Lattice contains a non-finite component")]
    NonFinite,
    #[error("Lattice vector {index} has zero length")]
    ZeroLengthVector { index: usize },
    #[error("Lattice vectors are linearly dependent (volume {volume:e})")]
    Singular { volume: f64 },
    #[error("Cell parameter '{name}' must be positive and finite, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error(
        "Cell angles alpha={alpha}, beta={beta}, gamma={gamma} do not close a three-dimensional cell"
    )]
    InvalidAngles { alpha: f64, beta: f64, gamma: f64 },
}

/// The six scalar parameters of a unit cell: edge lengths in Å and inter-axial angles in degrees.
///
/// `alpha` is the angle between the second and third lattice vectors, `beta` between the first
/// and third, and `gamma` between the first and second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// The primitive geometric quantities the grid solver consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellGeometry {
    pub lengths: [f64; 3],
    pub volume: f64,
}

impl CellGeometry {
    pub fn new(lengths: [f64; 3], volume: f64) -> Self {
        Self { lengths, volume }
    }
}

/// A periodic simulation cell described by its lattice matrix.
///
/// Rows of the matrix are the lattice vectors `a1`, `a2`, `a3`. The reciprocal cell is stored
/// alongside without the `2π` factor, so that `ai · bj = δij` and the reciprocal-cell volume is
/// the inverse of the real-space volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    lattice: Matrix3<f64>,
    reciprocal: Matrix3<f64>,
}

impl Cell {
    /// Builds a cell from a lattice matrix whose rows are the lattice vectors.
    ///
    /// # Errors
    ///
    /// Returns [`CellError`] if the matrix has non-finite entries, a zero-length row, or the
    /// rows are (numerically) linearly dependent.
    pub fn from_lattice(lattice: Matrix3<f64>) -> Result<Self, CellError> {
        if lattice.iter().any(|x| !x.is_finite()) {
            return Err(CellError::NonFinite);
        }

        let lengths = row_norms(&lattice);
        if let Some(index) = lengths.iter().position(|&l| l <= 0.0) {
            return Err(CellError::ZeroLengthVector { index });
        }

        let volume = lattice.determinant().abs();
        if volume <= SINGULARITY_RATIO * lengths[0] * lengths[1] * lengths[2] {
            return Err(CellError::Singular { volume });
        }

        let inverse = lattice
            .try_inverse()
            .ok_or(CellError::Singular { volume })?;

        Ok(Self {
            lattice,
            reciprocal: inverse.transpose(),
        })
    }

    pub fn from_vectors(vectors: [[f64; 3]; 3]) -> Result<Self, CellError> {
        Self::from_lattice(Matrix3::from_fn(|i, j| vectors[i][j]))
    }

    /// Builds a cell in the standard orientation from its six parameters.
    ///
    /// The first vector lies along x, the second in the xy-plane, and the third completes a
    /// right-handed cell.
    pub fn from_parameters(params: CellParameters) -> Result<Self, CellError> {
        for (name, value) in [("a", params.a), ("b", params.b), ("c", params.c)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CellError::InvalidParameter { name, value });
            }
        }
        for (name, value) in [
            ("alpha", params.alpha),
            ("beta", params.beta),
            ("gamma", params.gamma),
        ] {
            if !value.is_finite() || value <= 0.0 || value >= 180.0 {
                return Err(CellError::InvalidParameter { name, value });
            }
        }

        let invalid_angles = CellError::InvalidAngles {
            alpha: params.alpha,
            beta: params.beta,
            gamma: params.gamma,
        };

        let cos_alpha = cos_degrees(params.alpha);
        let cos_beta = cos_degrees(params.beta);
        let cos_gamma = cos_degrees(params.gamma);
        let sin_gamma = params.gamma.to_radians().sin();

        let cx = cos_beta;
        let cy = (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let cz_squared = 1.0 - cx * cx - cy * cy;
        if cz_squared <= 0.0 {
            return Err(invalid_angles);
        }

        let a1 = Vector3::new(params.a, 0.0, 0.0);
        let a2 = Vector3::new(params.b * cos_gamma, params.b * sin_gamma, 0.0);
        let a3 = Vector3::new(cx, cy, cz_squared.sqrt()) * params.c;

        Self::from_lattice(Matrix3::from_rows(&[
            a1.transpose(),
            a2.transpose(),
            a3.transpose(),
        ]))
        .map_err(|e| match e {
            CellError::Singular { .. } => invalid_angles,
            other => other,
        })
    }

    pub fn lattice(&self) -> &Matrix3<f64> {
        &self.lattice
    }

    pub fn vector(&self, index: usize) -> Vector3<f64> {
        self.lattice.row(index).transpose()
    }

    pub fn lengths(&self) -> [f64; 3] {
        row_norms(&self.lattice)
    }

    /// Returns `[alpha, beta, gamma]` in degrees.
    pub fn angles(&self) -> [f64; 3] {
        let (a1, a2, a3) = (self.vector(0), self.vector(1), self.vector(2));
        [
            angle_degrees(&a2, &a3),
            angle_degrees(&a1, &a3),
            angle_degrees(&a1, &a2),
        ]
    }

    pub fn parameters(&self) -> CellParameters {
        let [a, b, c] = self.lengths();
        let [alpha, beta, gamma] = self.angles();
        CellParameters {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        }
    }

    pub fn volume(&self) -> f64 {
        self.lattice.determinant().abs()
    }

    /// Reciprocal lattice vectors as rows, without the `2π` factor.
    pub fn reciprocal(&self) -> &Matrix3<f64> {
        &self.reciprocal
    }

    pub fn reciprocal_lengths(&self) -> [f64; 3] {
        row_norms(&self.reciprocal)
    }

    pub fn geometry(&self) -> CellGeometry {
        CellGeometry::new(self.lengths(), self.volume())
    }

    pub fn scaled(&self, factor: f64) -> Result<Self, CellError> {
        Self::from_lattice(self.lattice * factor)
    }

    /// Scales the cell uniformly so that its volume becomes `target_volume`.
    pub fn rescaled_to_volume(&self, target_volume: f64) -> Result<Self, CellError> {
        if !target_volume.is_finite() || target_volume <= 0.0 {
            return Err(CellError::InvalidParameter {
                name: "volume",
                value: target_volume,
            });
        }
        self.scaled((target_volume / self.volume()).cbrt())
    }
}

fn row_norms(m: &Matrix3<f64>) -> [f64; 3] {
    [m.row(0).norm(), m.row(1).norm(), m.row(2).norm()]
}

fn cos_degrees(angle: f64) -> f64 {
    if (angle - 90.0).abs() < RIGHT_ANGLE_TOLERANCE_DEGREES {
        0.0
    } else {
        angle.to_radians().cos()
    }
}

fn angle_degrees(u: &Vector3<f64>, v: &Vector3<f64>) -> f64 {
    let cos = (u.dot(v) / (u.norm() * v.norm())).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn cubic(a: f64) -> Cell {
        Cell::from_vectors([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]]).unwrap()
    }

    #[test]
    fn cubic_cell_has_expected_lengths_angles_and_volume() {
        let cell = cubic(5.0);

        assert_eq!(cell.lengths(), [5.0, 5.0, 5.0]);
        for angle in cell.angles() {
            assert!(f64_approx_equal(angle, 90.0));
        }
        assert!(f64_approx_equal(cell.volume(), 125.0));
    }

    #[test]
    fn orthorhombic_reciprocal_lengths_are_inverse_lengths() {
        let cell = Cell::from_vectors([[2.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 8.0]]).unwrap();
        let rlengths = cell.reciprocal_lengths();

        assert!(f64_approx_equal(rlengths[0], 0.5));
        assert!(f64_approx_equal(rlengths[1], 0.25));
        assert!(f64_approx_equal(rlengths[2], 0.125));
    }

    #[test]
    fn reciprocal_cell_is_dual_to_lattice() {
        let cell = Cell::from_vectors([[3.0, 0.2, 0.0], [1.1, 2.9, 0.3], [0.4, -0.5, 6.0]]).unwrap();
        let product = cell.lattice() * cell.reciprocal().transpose();

        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(f64_approx_equal(product[(i, j)], expected));
            }
        }
    }

    #[test]
    fn hexagonal_parameters_build_expected_volume() {
        let cell = Cell::from_parameters(CellParameters {
            a: 3.0,
            b: 3.0,
            c: 5.0,
            alpha: 90.0,
            beta: 90.0,
            gamma: 120.0,
        })
        .unwrap();

        let expected = 3.0 * 3.0 * 5.0 * 120f64.to_radians().sin();
        assert!(f64_approx_equal(cell.volume(), expected));
        assert!(f64_approx_equal(cell.angles()[2], 120.0));
    }

    #[test]
    fn right_angles_produce_exact_zero_off_axis_components() {
        let cell = Cell::from_parameters(CellParameters {
            a: 4.0,
            b: 5.0,
            c: 6.0,
            alpha: 90.0,
            beta: 90.0,
            gamma: 90.0,
        })
        .unwrap();

        assert_eq!(cell.vector(1)[0], 0.0);
        assert_eq!(cell.vector(2)[0], 0.0);
        assert_eq!(cell.vector(2)[1], 0.0);
    }

    #[test]
    fn parameters_survive_construction_for_triclinic_cell() {
        let params = CellParameters {
            a: 4.2,
            b: 5.1,
            c: 6.3,
            alpha: 80.0,
            beta: 95.0,
            gamma: 105.0,
        };
        let recovered = Cell::from_parameters(params).unwrap().parameters();

        assert!(f64_approx_equal(recovered.a, params.a));
        assert!(f64_approx_equal(recovered.b, params.b));
        assert!(f64_approx_equal(recovered.c, params.c));
        assert!(f64_approx_equal(recovered.alpha, params.alpha));
        assert!(f64_approx_equal(recovered.beta, params.beta));
        assert!(f64_approx_equal(recovered.gamma, params.gamma));
    }

    #[test]
    fn impossible_angles_are_rejected() {
        let result = Cell::from_parameters(CellParameters {
            a: 1.0,
            b: 1.0,
            c: 1.0,
            alpha: 10.0,
            beta: 10.0,
            gamma: 100.0,
        });
        assert!(matches!(result, Err(CellError::InvalidAngles { .. })));
    }

    #[test]
    fn non_positive_length_parameter_is_rejected() {
        let result = Cell::from_parameters(CellParameters {
            a: 0.0,
            b: 1.0,
            c: 1.0,
            alpha: 90.0,
            beta: 90.0,
            gamma: 90.0,
        });
        assert!(matches!(
            result,
            Err(CellError::InvalidParameter { name: "a", .. })
        ));
    }

    #[test]
    fn coplanar_vectors_are_singular() {
        let result = Cell::from_vectors([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]]);
        assert!(matches!(result, Err(CellError::Singular { .. })));
    }

    #[test]
    fn zero_vector_is_rejected() {
        let result = Cell::from_vectors([[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        assert_eq!(result, Err(CellError::ZeroLengthVector { index: 1 }));
    }

    #[test]
    fn non_finite_lattice_is_rejected() {
        let result = Cell::from_vectors([[f64::NAN, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert_eq!(result, Err(CellError::NonFinite));
    }

    #[test]
    fn rescaling_to_volume_preserves_shape() {
        let cell = Cell::from_vectors([[2.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 4.0]]).unwrap();
        let rescaled = cell.rescaled_to_volume(24.0 * 8.0).unwrap();

        assert!(f64_approx_equal(rescaled.volume(), 192.0));
        let [a, b, c] = rescaled.lengths();
        assert!(f64_approx_equal(a, 4.0));
        assert!(f64_approx_equal(b, 6.0));
        assert!(f64_approx_equal(c, 8.0));
    }

    #[test]
    fn geometry_carries_lengths_and_volume() {
        let geometry = cubic(3.0).geometry();
        assert_eq!(geometry.lengths, [3.0, 3.0, 3.0]);
        assert!(f64_approx_equal(geometry.volume, 27.0));
    }
}
