use thiserror::Error;

/// Errors that can occur when validating an integrator configuration.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("abs_tol must be finite and positive")]
    AbsTol,

    #[error("rel_tol must be finite and non-negative")]
    RelTol,

    #[error("step bounds must satisfy 0 < min_dt ({min_dt}) <= max_dt ({max_dt})")]
    StepBounds { min_dt: f64, max_dt: f64 },

    #[error("max_retries must be at least 1")]
    Retries,
}
