use std::sync::Arc;

use dip_core::{NumericalInstability, State, StateDerivative};

use crate::Matrices;

/// Provides the mass matrix, Coriolis, and gravity terms at a state.
///
/// This is the narrow view of the dynamics that controllers need to compute
/// equivalent control.
pub trait PhysicsMatrices {
    fn matrices(&self, state: &State) -> Matrices;
}

/// Continuous-time equations of motion `ẋ = f(x, u)`.
pub trait EquationsOfMotion: PhysicsMatrices {
    /// Evaluates the state derivative for a cart force `u`.
    ///
    /// # Errors
    ///
    /// Returns an error if the mass matrix cannot be inverted safely or the
    /// derivative is not finite.
    fn derivative(&self, state: &State, u: f64) -> Result<StateDerivative, NumericalInstability>;

    fn kinetic_energy(&self, state: &State) -> f64;

    fn potential_energy(&self, state: &State) -> f64;

    fn total_energy(&self, state: &State) -> f64 {
        self.kinetic_energy(state) + self.potential_energy(state)
    }
}

impl<T: PhysicsMatrices + ?Sized> PhysicsMatrices for Arc<T> {
    fn matrices(&self, state: &State) -> Matrices {
        (**self).matrices(state)
    }
}

impl<T: EquationsOfMotion + ?Sized> EquationsOfMotion for Arc<T> {
    fn derivative(&self, state: &State, u: f64) -> Result<StateDerivative, NumericalInstability> {
        (**self).derivative(state, u)
    }

    fn kinetic_energy(&self, state: &State) -> f64 {
        (**self).kinetic_energy(state)
    }

    fn potential_energy(&self, state: &State) -> f64 {
        (**self).potential_energy(state)
    }
}
