use std::ops::Mul;

use thiserror::Error;

/// A value guaranteed to lie in `[0.0, 1.0]`.
///
/// Used for independent fission-yield fractions, which the matrix builder
/// multiplies into production terms without re-checking.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Fraction(f64);

/// Errors returned when a value cannot be a [`Fraction`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum FractionError {
    #[error("fraction is not finite: {0}")]
    NotFinite(f64),

    #[error("fraction {0} is outside [0, 1]")]
    OutOfRange(f64),
}

impl Fraction {
    /// Creates a `Fraction` if `value` is finite and within `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`FractionError`] describing why `value` was rejected.
    pub fn new(value: f64) -> Result<Self, FractionError> {
        if !value.is_finite() {
            return Err(FractionError::NotFinite(value));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(FractionError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Fraction {
    type Error = FractionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Mul<f64> for Fraction {
    type Output = f64;

    fn mul(self, rhs: f64) -> f64 {
        self.0 * rhs
    }
}

impl Mul<Fraction> for f64 {
    type Output = f64;

    fn mul(self, rhs: Fraction) -> f64 {
        self * rhs.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_closed_unit_interval() {
        assert_eq!(Fraction::new(0.0).unwrap().get(), 0.0);
        assert_eq!(Fraction::new(1.0).unwrap().get(), 1.0);
        assert_eq!(Fraction::new(0.9).unwrap() * 2.0, 1.8);
    }

    #[test]
    fn rejects_out_of_range_and_nan() {
        assert_eq!(Fraction::new(1.5), Err(FractionError::OutOfRange(1.5)));
        assert_eq!(Fraction::new(-0.1), Err(FractionError::OutOfRange(-0.1)));
        assert!(matches!(
            Fraction::new(f64::NAN),
            Err(FractionError::NotFinite(_))
        ));
    }
}
