//! Error types for controller and shape configuration.
//!
//! Runtime geometry never produces errors: unresolved penetration, degenerate
//! vectors and sweep misses are handled by policy inside the controller. Only
//! invalid construction parameters are reported.

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised when validating controller or shape parameters.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// A distance or factor is NaN or infinite.
    #[error("`{field}` must be finite, got {value}")]
    NonFinite {
        /// Name of the offending field.
        field: &'static str,
        /// Value that was provided.
        value: f32,
    },

    /// A distance that must not be negative is negative.
    #[error("`{field}` must not be negative, got {value}")]
    Negative {
        /// Name of the offending field.
        field: &'static str,
        /// Value that was provided.
        value: f32,
    },

    /// A shape dimension that must be strictly positive is not.
    #[error("shape dimension `{field}` must be positive, got {value}")]
    NonPositiveDimension {
        /// Name of the offending dimension.
        field: &'static str,
        /// Value that was provided.
        value: f32,
    },

    /// An iteration cap is zero.
    #[error("`{field}` must allow at least one iteration")]
    ZeroIterations {
        /// Name of the offending cap.
        field: &'static str,
    },

    /// A factor lies outside its allowed range.
    #[error("`{field}` must lie in {range}, got {value}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Human readable description of the allowed range.
        range: &'static str,
        /// Value that was provided.
        value: f32,
    },
}

/// Reject NaN and infinities.
pub(crate) fn ensure_finite(field: &'static str, value: f32) -> ConfigResult<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

/// Reject NaN, infinities and negative values.
pub(crate) fn ensure_non_negative(field: &'static str, value: f32) -> ConfigResult<f32> {
    let value = ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(value)
}

/// Reject NaN, infinities, zero and negative values.
pub(crate) fn ensure_positive(field: &'static str, value: f32) -> ConfigResult<f32> {
    let value = ensure_finite(field, value)?;
    if value <= 0.0 {
        return Err(ConfigError::NonPositiveDimension { field, value });
    }
    Ok(value)
}
