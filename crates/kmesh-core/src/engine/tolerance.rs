use serde::Serialize;

/// Closeness test used to decide whether two fractional axis counts are "the same".
///
/// Two values `a` and `b` are close when `|a - b| <= absolute + relative * |b|`. The test is
/// intentionally asymmetric in `b`, matching the closeness check common numeric libraries use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tolerance {
    pub relative: f64,
    pub absolute: f64,
}

impl Tolerance {
    pub const DEFAULT_RELATIVE: f64 = 1e-5;
    pub const DEFAULT_ABSOLUTE: f64 = 1e-8;

    pub fn new(relative: f64, absolute: f64) -> Self {
        Self { relative, absolute }
    }

    /// Exact comparison; only bit-identical values are close.
    pub fn exact() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn is_valid(&self) -> bool {
        self.relative.is_finite()
            && self.absolute.is_finite()
            && self.relative >= 0.0
            && self.absolute >= 0.0
    }

    #[inline]
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.absolute + self.relative * b.abs()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RELATIVE, Self::DEFAULT_ABSOLUTE)
    }
}
