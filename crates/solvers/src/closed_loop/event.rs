use dip_core::State;

/// Event emitted by the closed-loop driver for each recorded state.
///
/// Step 0 is the initial state, before any control is applied, so `u` and
/// `sigma` are `None`. Steps 1..N follow each integration step and carry the
/// control that produced the state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub step: usize,
    pub time: f64,
    pub state: State,
    /// Cart force applied over the step that ended here.
    pub u: Option<f64>,
    /// Sliding surface value the force was computed from.
    pub sigma: Option<f64>,
}
