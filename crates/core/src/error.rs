use std::fmt;

use thiserror::Error;

/// The point in a computation where a non-finite value was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Evaluating the equations of motion.
    Derivative,
    /// One of the intermediate stages of a multi-stage integrator (1-based).
    Integrator(usize),
    /// The half-step velocity update of the symplectic scheme.
    HalfStepVelocity,
    /// The embedded error estimate of the adaptive scheme.
    ErrorEstimate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Derivative => f.write_str("equations of motion"),
            Self::Integrator(stage) => write!(f, "integrator stage {stage}"),
            Self::HalfStepVelocity => f.write_str("half-step velocity"),
            Self::ErrorEstimate => f.write_str("error estimate"),
        }
    }
}

/// A numerical failure in the dynamics.
///
/// Every path that could otherwise produce NaN or infinite values reports one
/// of these instead. Callers should treat it as fatal for the current run.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum NumericalInstability {
    #[error("inertia matrix has non-finite entries")]
    NonFiniteMatrix,

    #[error(
        "inertia matrix remains ill-conditioned after regularization \
         (smallest singular value {smallest_singular_value:e})"
    )]
    IllConditioned { smallest_singular_value: f64 },

    #[error(
        "inertia matrix singular: condition number {condition_number:e} \
         with determinant {determinant:e}"
    )]
    Singular {
        condition_number: f64,
        determinant: f64,
    },

    #[error("non-finite values in {0}")]
    NonFinite(Stage),

    #[error("state became non-finite after integration")]
    NonFiniteState,

    #[error("adaptive step rejected {retries} times (error ratio {error_ratio:e}, dt {dt:e})")]
    RetryBudgetExhausted {
        retries: usize,
        error_ratio: f64,
        dt: f64,
    },

    #[error("step size must be finite and positive, got {0}")]
    InvalidStep(f64),
}

/// Errors that can occur when validating physical parameters.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ParamsError {
    #[error("{name} must be finite and positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must be finite and non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("{name} ({com}) must be strictly less than the link length ({length})")]
    CenterOfMassBeyondLink {
        name: &'static str,
        com: f64,
        length: f64,
    },
}
