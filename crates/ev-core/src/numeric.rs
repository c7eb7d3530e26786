use crate::EvError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, EvError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(EvError::NonFinite { what, value: v })
    }
}

/// Require `v > 0` and finite.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, EvError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(EvError::OutOfRange { what, value: v })
    }
}

/// Require `v >= 0` and finite.
pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, EvError> {
    let v = ensure_finite(v, what)?;
    if v >= 0.0 {
        Ok(v)
    } else {
        Err(EvError::OutOfRange { what, value: v })
    }
}

/// Require an efficiency on the half-open range (0, 1].
pub fn ensure_fraction(v: Real, what: &'static str) -> Result<Real, EvError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 && v <= 1.0 {
        Ok(v)
    } else {
        Err(EvError::OutOfRange { what, value: v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn range_guards() {
        assert!(ensure_positive(1.0, "x").is_ok());
        assert!(ensure_positive(0.0, "x").is_err());
        assert!(ensure_non_negative(0.0, "x").is_ok());
        assert!(ensure_non_negative(-1e-9, "x").is_err());
        assert!(ensure_fraction(1.0, "eta").is_ok());
        assert!(ensure_fraction(0.0, "eta").is_err());
        assert!(ensure_fraction(1.01, "eta").is_err());
        assert!(ensure_fraction(Real::NAN, "eta").is_err());
    }
}
