use thiserror::Error;

/// Errors that can occur when constructing a controller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("expected {expected} gains, got {actual}")]
    GainCount { expected: &'static str, actual: usize },

    #[error("gain {index} must be finite and positive, got {value}")]
    Gain { index: usize, value: f64 },

    #[error("{name} must be finite and positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must be finite and non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("{name} ({value}) must lie within [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("unknown controller `{0}`")]
    UnknownController(String),
}

pub(crate) fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

pub(crate) fn non_negative(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Negative { name, value })
    }
}

pub(crate) fn within(name: &'static str, value: f64, min: f64, max: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

/// Checks that every gain is finite and positive.
pub(crate) fn positive_gains(gains: &[f64]) -> Result<(), ConfigError> {
    match gains
        .iter()
        .enumerate()
        .find(|(_, value)| !(value.is_finite() && **value > 0.0))
    {
        Some((index, &value)) => Err(ConfigError::Gain { index, value }),
        None => Ok(()),
    }
}
