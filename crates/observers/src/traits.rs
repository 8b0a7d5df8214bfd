//! Capability traits for simulation observers.
//!
//! These traits abstract over driver-specific event and action types, so an
//! observer can be written once and reused with any driver that exposes the
//! needed capabilities.
//!
//! # Event traits
//!
//! - [`HasState`]: events that carry a time-stamped pendulum state
//! - [`HasControl`]: events that carry the applied cart force
//!
//! # Action traits
//!
//! - [`CanStopEarly`]: actions that can signal early termination
//!
//! # Example
//!
//! ```rust
//! use dip_core::Observer;
//! use dip_observers::traits::{CanStopEarly, HasState};
//!
//! struct StopAfter {
//!     time: f64,
//! }
//!
//! impl<E: HasState, A: CanStopEarly> Observer<E, A> for StopAfter {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         (event.time() >= self.time).then(A::stop_early)
//!     }
//! }
//! ```

use dip_core::State;
use dip_solvers::closed_loop;

/// An event that carries a time-stamped pendulum state.
pub trait HasState {
    /// Returns the step index of this event.
    fn step(&self) -> usize;

    /// Returns the simulation time of this event.
    fn time(&self) -> f64;

    /// Returns the pendulum state at this event.
    fn state(&self) -> &State;
}

/// An event that carries the cart force applied to reach it.
pub trait HasControl {
    /// Returns the applied force, or `None` for the initial event.
    fn control(&self) -> Option<f64>;
}

/// An action type that can signal early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the driver early.
    fn stop_early() -> Self;
}

// --- closed_loop impls ---

impl HasState for closed_loop::Event {
    fn step(&self) -> usize {
        self.step
    }

    fn time(&self) -> f64 {
        self.time
    }

    fn state(&self) -> &State {
        &self.state
    }
}

impl HasControl for closed_loop::Event {
    fn control(&self) -> Option<f64> {
        self.u
    }
}

impl CanStopEarly for closed_loop::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}
