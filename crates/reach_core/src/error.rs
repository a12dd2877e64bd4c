//! Constructor validation errors.
//!
//! All configuration is rejected at construction time; per-tick paths never
//! produce errors. Constructors surface `anyhow::Result`, with a
//! [`ConfigError`] underneath so hosts can match on what was rejected via
//! `Error::downcast_ref::<ConfigError>`.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must be non-negative and finite, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("fov_y must lie in (0, pi), got {0}")]
    FovOutOfRange(f32),
    #[error("viewport rectangle corner is behind the camera")]
    RectBehindCamera,
    #[error("degenerate viewport rectangle")]
    DegenerateRect,
    #[error("at least one transform mode is required")]
    NoModes,
}

pub(crate) fn ensure_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

pub(crate) fn ensure_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_check_rejects_zero_nan_and_infinity() {
        assert!(ensure_positive("x", 1.0).is_ok());
        assert!(ensure_positive("x", 0.0).is_err());
        assert!(ensure_positive("x", f32::NAN).is_err());
        assert!(ensure_positive("x", f32::INFINITY).is_err());
    }

    #[test]
    fn non_negative_check_admits_zero() {
        assert!(ensure_non_negative("x", 0.0).is_ok());
        assert!(ensure_non_negative("x", -0.1).is_err());
        assert!(ensure_non_negative("x", f32::NAN).is_err());
    }

    #[test]
    fn message_names_the_offending_field() {
        let err = ensure_positive("view_offset", -1.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "view_offset must be positive and finite, got -1"
        );
    }
}
