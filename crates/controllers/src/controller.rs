use std::fmt::Debug;

use dip_core::State;

use crate::History;

/// The result of one control step.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlOutput<S> {
    /// Cart force, always within `±max_force`.
    pub u: f64,
    /// Internal state to pass to the next call.
    pub state: S,
    /// The history with this step's samples appended.
    pub history: History,
    /// Sliding surface value, for diagnostics only.
    pub sigma: f64,
}

/// Common contract of the sliding-mode controller family.
///
/// Controllers hold only configuration. The evolving internal state is
/// threaded explicitly: each call consumes the previous `internal` value and
/// returns the next one in [`ControlOutput::state`].
pub trait SlidingModeController {
    /// Adaptive quantities carried between steps.
    type Internal: Clone + Debug;

    /// Actuator limit applied to every output.
    fn max_force(&self) -> f64;

    fn initialize_state(&self) -> Self::Internal;

    fn initialize_history(&self) -> History {
        History::new()
    }

    /// Computes the saturated cart force for `state`.
    ///
    /// Never fails: degraded equivalent control falls back to zero and
    /// saturation is silent clamping.
    fn compute_control(
        &self,
        state: &State,
        internal: &Self::Internal,
        history: History,
    ) -> ControlOutput<Self::Internal>;
}

/// Clamps a force to `±max_force`, mapping NaN to zero.
pub(crate) fn saturate(u: f64, max_force: f64) -> f64 {
    if u.is_nan() {
        0.0
    } else {
        u.clamp(-max_force, max_force)
    }
}

pub(crate) fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}
