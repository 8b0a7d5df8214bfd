use dip_core::{NumericalInstability, Stage, State, StateDerivative, StepIntegrable};

use super::{Integrator, evaluate, finite};

/// Classical fourth-order Runge–Kutta with a fixed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rk4;

impl Integrator for Rk4 {
    fn integrate<F>(&mut self, rhs: F, state: &State, dt: f64) -> Result<State, NumericalInstability>
    where
        F: Fn(&State) -> Result<StateDerivative, NumericalInstability>,
    {
        let half = 0.5 * dt;
        let k1 = evaluate(&rhs, state, Stage::Integrator(1))?;
        let k2 = evaluate(&rhs, &state.step(k1, half), Stage::Integrator(2))?;
        let k3 = evaluate(&rhs, &state.step(k2, half), Stage::Integrator(3))?;
        let k4 = evaluate(&rhs, &state.step(k3, dt), Stage::Integrator(4))?;

        let slope = (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (1.0 / 6.0);
        finite(state.step(slope, dt))
    }
}
