//! Closed-loop simulation of a sliding-mode controller and a dynamics model.
//!
//! Each step computes the control from the current state, then integrates the
//! dynamics over `dt` with that force held constant:
//!
//! ```text
//! (u_n, internal_{n+1}) = controller(state_n, internal_n)
//! state_{n+1}           = dynamics.step(state_n, u_n, dt)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use dip_solvers::closed_loop;
//!
//! let solution = closed_loop::simulate_unobserved(&controller, &mut model, initial, 0.001, 5000)?;
//!
//! for (time, state) in solution.times.iter().zip(&solution.states) {
//!     println!("t={time}: θ1={}", state.theta1());
//! }
//! ```

mod action;
mod error;
mod event;
mod solution;

pub use action::Action;
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Status};

use dip_controllers::SlidingModeController;
use dip_core::{Observer, State};
use dip_dynamics::Dynamics;
use tracing::{debug, warn};

/// Runs `controller` against `dynamics` for `steps` steps of size `dt`.
///
/// # Algorithm
///
/// 1. Reset the dynamics and initialize the controller state and history.
/// 2. Emit the initial event (step 0).
/// 3. For each step:
///    - Compute the control from the current state and internal state.
///    - Integrate the dynamics over `dt` with that control.
///    - Record time, state, control, and `σ`.
///    - Emit an [`Event`] to the observer.
///    - If the observer returns `StopEarly`, terminate.
/// 4. Return the solution with the full trajectory and controller history.
///
/// # Errors
///
/// Returns [`Error::InvalidStep`] if `dt` is not finite and positive, and
/// [`Error::Instability`] with the failing step if the dynamics report a
/// numerical instability. No partial trajectory is returned on failure.
pub fn simulate<C, D, Obs>(
    controller: &C,
    dynamics: &mut D,
    initial: State,
    dt: f64,
    steps: usize,
    mut observer: Obs,
) -> Result<Solution<C::Internal>, Error>
where
    C: SlidingModeController,
    D: Dynamics,
    Obs: Observer<Event, Action>,
{
    if !(dt.is_finite() && dt > 0.0) {
        return Err(Error::InvalidStep(dt));
    }

    dynamics.reset();
    let mut internal = controller.initialize_state();
    let mut history = controller.initialize_history();

    let mut times = Vec::with_capacity(steps + 1);
    let mut states = Vec::with_capacity(steps + 1);
    let mut controls = Vec::with_capacity(steps);
    let mut sigmas = Vec::with_capacity(steps);
    times.push(0.0);
    states.push(initial);

    let event = Event {
        step: 0,
        time: 0.0,
        state: initial,
        u: None,
        sigma: None,
    };
    if let Some(Action::StopEarly) = observer.observe(&event) {
        return Ok(Solution {
            status: Status::StoppedByObserver,
            times,
            states,
            controls,
            sigmas,
            history,
            internal,
            steps: 0,
        });
    }

    let mut current = initial;

    for step in 1..=steps {
        let output = controller.compute_control(&current, &internal, history);
        internal = output.state;
        history = output.history;

        let next = dynamics
            .step(&current, output.u, dt)
            .map_err(|source| {
                warn!(step, u = output.u, %source, "closed-loop run aborted");
                Error::Instability { step, source }
            })?;

        #[allow(clippy::cast_precision_loss)]
        let time = step as f64 * dt;
        times.push(time);
        states.push(next);
        controls.push(output.u);
        sigmas.push(output.sigma);

        let event = Event {
            step,
            time,
            state: next,
            u: Some(output.u),
            sigma: Some(output.sigma),
        };
        if let Some(Action::StopEarly) = observer.observe(&event) {
            debug!(step, time, "closed-loop run stopped by observer");
            return Ok(Solution {
                status: Status::StoppedByObserver,
                times,
                states,
                controls,
                sigmas,
                history,
                internal,
                steps: step,
            });
        }

        current = next;
    }

    Ok(Solution {
        status: Status::Complete,
        times,
        states,
        controls,
        sigmas,
        history,
        internal,
        steps,
    })
}

/// Runs a closed-loop simulation without observation.
///
/// This is a convenience wrapper around [`simulate`] that discards events.
///
/// # Errors
///
/// See [`simulate`].
pub fn simulate_unobserved<C, D>(
    controller: &C,
    dynamics: &mut D,
    initial: State,
    dt: f64,
    steps: usize,
) -> Result<Solution<C::Internal>, Error>
where
    C: SlidingModeController,
    D: Dynamics,
{
    simulate(controller, dynamics, initial, dt, steps, ())
}
