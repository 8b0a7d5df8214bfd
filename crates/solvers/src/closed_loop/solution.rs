use dip_controllers::History;
use dip_core::State;

/// Indicates how the run terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Completed all requested steps.
    Complete,

    /// Stopped early due to an observer action.
    StoppedByObserver,
}

/// The recorded trajectory of a closed-loop run.
///
/// `times` and `states` include the initial state, so they hold one more
/// entry than `controls` and `sigmas`.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<I> {
    pub status: Status,
    pub times: Vec<f64>,
    pub states: Vec<State>,
    pub controls: Vec<f64>,
    pub sigmas: Vec<f64>,
    /// Diagnostic series recorded by the controller.
    pub history: History,
    /// Controller internal state after the last step.
    pub internal: I,
    /// Number of integration steps completed.
    pub steps: usize,
}

impl<I> Solution<I> {
    /// The last recorded state.
    #[must_use]
    pub fn final_state(&self) -> Option<&State> {
        self.states.last()
    }

    /// Largest `|u|` applied during the run, or zero if no step was taken.
    #[must_use]
    pub fn peak_control(&self) -> f64 {
        self.controls.iter().fold(0.0, |peak, u| peak.max(u.abs()))
    }
}
