use dip_core::{NumericalInstability, Stage, State, StateDerivative};

use super::{Integrator, evaluate, finite};

/// Symplectic velocity-Verlet scheme.
///
/// Kicks the velocities by half a step, drifts the configuration a full step
/// with the half-step velocities, then completes the kick with the
/// acceleration at the new configuration. Long-horizon energy error stays
/// bounded for conservative, low-friction motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VelocityVerlet;

impl Integrator for VelocityVerlet {
    fn integrate<F>(&mut self, rhs: F, state: &State, dt: f64) -> Result<State, NumericalInstability>
    where
        F: Fn(&State) -> Result<StateDerivative, NumericalInstability>,
    {
        let half = 0.5 * dt;
        let start = evaluate(&rhs, state, Stage::Integrator(1))?.accelerations();

        let half_velocities = state.velocities() + start * half;
        if !half_velocities.iter().all(|v| v.is_finite()) {
            return Err(NumericalInstability::NonFinite(Stage::HalfStepVelocity));
        }

        let positions = state.positions() + half_velocities * dt;
        let drifted = State::from_parts(positions, half_velocities);
        let end = evaluate(&rhs, &drifted, Stage::Integrator(2))?.accelerations();

        finite(State::from_parts(positions, half_velocities + end * half))
    }
}
