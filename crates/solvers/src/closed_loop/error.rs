use dip_core::NumericalInstability;

/// Errors that abort a closed-loop run.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("numerical instability at step {step}: {source}")]
    Instability {
        /// The step whose integration failed (1-based).
        step: usize,
        #[source]
        source: NumericalInstability,
    },

    #[error("time step must be finite and positive, got {0}")]
    InvalidStep(f64),
}
