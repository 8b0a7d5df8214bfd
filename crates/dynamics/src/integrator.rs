//! Time integration schemes.
//!
//! Each scheme advances a [`State`] by `dt` given a right-hand side
//! `rhs(state) -> Result<StateDerivative, NumericalInstability>`. The control
//! input is held constant across the step, so the right-hand side is a
//! closure over it.
//!
//! - [`Rk4`]: classical fixed-step fourth-order Runge–Kutta
//! - [`DormandPrince`]: embedded 5(4) pair with local error control
//! - [`VelocityVerlet`]: symplectic half-step velocity scheme

mod dormand_prince;
mod rk4;
mod verlet;

pub use dormand_prince::{DormandPrince, DormandPrinceConfig};
pub use rk4::Rk4;
pub use verlet::VelocityVerlet;

use dip_core::{NumericalInstability, Stage, State, StateDerivative};

/// A time integration strategy.
pub trait Integrator {
    /// Advances `state` by `dt`.
    ///
    /// # Errors
    ///
    /// Returns an error if the right-hand side fails, any intermediate stage
    /// is not finite, or (for adaptive schemes) tolerances cannot be met.
    fn integrate<F>(&mut self, rhs: F, state: &State, dt: f64) -> Result<State, NumericalInstability>
    where
        F: Fn(&State) -> Result<StateDerivative, NumericalInstability>;

    /// Clears any bookkeeping carried between steps.
    fn reset(&mut self) {}
}

/// The closed set of available schemes.
#[derive(Debug, Clone, PartialEq)]
pub enum IntegrationScheme {
    Rk4(Rk4),
    DormandPrince(DormandPrince),
    VelocityVerlet(VelocityVerlet),
}

impl Default for IntegrationScheme {
    fn default() -> Self {
        Self::Rk4(Rk4)
    }
}

impl From<Rk4> for IntegrationScheme {
    fn from(scheme: Rk4) -> Self {
        Self::Rk4(scheme)
    }
}

impl From<DormandPrince> for IntegrationScheme {
    fn from(scheme: DormandPrince) -> Self {
        Self::DormandPrince(scheme)
    }
}

impl From<VelocityVerlet> for IntegrationScheme {
    fn from(scheme: VelocityVerlet) -> Self {
        Self::VelocityVerlet(scheme)
    }
}

impl Integrator for IntegrationScheme {
    fn integrate<F>(&mut self, rhs: F, state: &State, dt: f64) -> Result<State, NumericalInstability>
    where
        F: Fn(&State) -> Result<StateDerivative, NumericalInstability>,
    {
        match self {
            Self::Rk4(scheme) => scheme.integrate(rhs, state, dt),
            Self::DormandPrince(scheme) => scheme.integrate(rhs, state, dt),
            Self::VelocityVerlet(scheme) => scheme.integrate(rhs, state, dt),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Rk4(scheme) => scheme.reset(),
            Self::DormandPrince(scheme) => scheme.reset(),
            Self::VelocityVerlet(scheme) => scheme.reset(),
        }
    }
}

/// Evaluates `rhs` and rejects non-finite results, tagging them with `stage`.
fn evaluate<F>(rhs: &F, state: &State, stage: Stage) -> Result<StateDerivative, NumericalInstability>
where
    F: Fn(&State) -> Result<StateDerivative, NumericalInstability>,
{
    let derivative = rhs(state)?;
    if derivative.is_finite() {
        Ok(derivative)
    } else {
        Err(NumericalInstability::NonFinite(stage))
    }
}

fn finite(state: State) -> Result<State, NumericalInstability> {
    if state.is_finite() {
        Ok(state)
    } else {
        Err(NumericalInstability::NonFiniteState)
    }
}
