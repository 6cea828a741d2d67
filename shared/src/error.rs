//! Construction errors for bounded domain values

use thiserror::Error;

/// Raised when a model value violates its documented bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("Invalid band [{min}, {max}]")]
    InvalidBand { min: f64, max: f64 },
}

/// Check that `value` is finite and lies inside `[min, max]`
pub fn ensure_in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64, ModelError> {
    if !value.is_finite() {
        return Err(ModelError::NonFinite { field });
    }
    if value < min || value > max {
        return Err(ModelError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(value)
}

/// Check that `value` is finite and not negative
pub fn ensure_non_negative(field: &'static str, value: f64) -> Result<f64, ModelError> {
    if !value.is_finite() {
        return Err(ModelError::NonFinite { field });
    }
    if value < 0.0 {
        return Err(ModelError::Negative { field, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_check() {
        assert_eq!(ensure_in_range("ndvi", 0.5, -1.0, 1.0), Ok(0.5));
        assert!(matches!(
            ensure_in_range("ndvi", 1.5, -1.0, 1.0),
            Err(ModelError::OutOfRange { field: "ndvi", .. })
        ));
        assert!(matches!(
            ensure_in_range("ndvi", f64::NAN, -1.0, 1.0),
            Err(ModelError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(ensure_non_negative("precipitation", 0.0), Ok(0.0));
        assert!(ensure_non_negative("precipitation", -0.1).is_err());
        assert!(ensure_non_negative("precipitation", f64::INFINITY).is_err());
    }
}
