//! Batched closed-loop simulation over many controller configurations.
//!
//! Every run owns a freshly built controller and a fresh dynamics instance, so
//! runs are fully independent and a failure in one does not affect the others.

use dip_controllers::{AnyState, ConfigError, ControllerSpec};
use dip_core::State;
use dip_dynamics::Dynamics;
use thiserror::Error;
use tracing::debug;

use crate::closed_loop::{self, Solution};

/// Errors that prevent a batch from starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("{states} initial states given for {runs} gain vectors; expected 1 or {runs}")]
    LengthMismatch { runs: usize, states: usize },
}

/// Why a single run in a batch failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("invalid controller configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Simulation(#[from] closed_loop::Error),
}

/// The outcome of one run, in the order the gain vectors were given.
pub type RunResult = Result<Solution<AnyState>, RunError>;

/// Simulates one closed-loop run per gain vector.
///
/// `template` supplies the controller kind, `dt`, and `max_force`; its own
/// gains are ignored. `initial` holds either one state, shared by every run,
/// or one state per gain vector. `make_dynamics` is called once per run.
///
/// # Errors
///
/// Returns [`BatchError::LengthMismatch`] if `initial` has neither one entry
/// nor one per gain vector. Per-run failures are reported in the returned
/// results rather than aborting the batch.
pub fn simulate_batch<D, F>(
    template: &ControllerSpec,
    gains: &[Vec<f64>],
    initial: &[State],
    steps: usize,
    mut make_dynamics: F,
) -> Result<Vec<RunResult>, BatchError>
where
    D: Dynamics,
    F: FnMut() -> D,
{
    let runs = gains.len();
    if initial.len() != 1 && initial.len() != runs {
        return Err(BatchError::LengthMismatch {
            runs,
            states: initial.len(),
        });
    }
    let shared = initial.len() == 1;

    let results: Vec<RunResult> = gains
        .iter()
        .enumerate()
        .map(|(index, gains)| -> RunResult {
            let spec = ControllerSpec {
                gains: gains.clone(),
                ..template.clone()
            };
            let controller = spec.build()?;
            let mut dynamics = make_dynamics();
            let solution = closed_loop::simulate_unobserved(
                &controller,
                &mut dynamics,
                initial[if shared { 0 } else { index }],
                spec.dt,
                steps,
            )?;
            Ok(solution)
        })
        .collect();

    debug!(
        runs,
        failed = results.iter().filter(|result| result.is_err()).count(),
        "batch finished"
    );
    Ok(results)
}
