use dip_core::{NumericalInstability, PhysicsParameters, Stage, State, StateDerivative};
use nalgebra::Matrix3;

use crate::{EquationsOfMotion, MassMatrixSolver, Matrices, PhysicsMatrices};

/// Rigid-body model with viscous friction on each absolute coordinate.
///
/// The Coriolis term is formed as `C(q, q̇)·q̇` from the explicit Coriolis
/// matrix of [`MassMatrixSolver::coriolis_matrix`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimplifiedDynamics {
    solver: MassMatrixSolver,
}

impl SimplifiedDynamics {
    #[must_use]
    pub fn new(params: PhysicsParameters) -> Self {
        Self {
            solver: MassMatrixSolver::new(params),
        }
    }

    #[must_use]
    pub fn solver(&self) -> &MassMatrixSolver {
        &self.solver
    }

    #[must_use]
    pub fn coriolis_matrix(&self, state: &State) -> Matrix3<f64> {
        self.solver.coriolis_matrix(state)
    }
}

impl PhysicsMatrices for SimplifiedDynamics {
    fn matrices(&self, state: &State) -> Matrices {
        self.solver.matrices(state)
    }
}

impl EquationsOfMotion for SimplifiedDynamics {
    fn derivative(&self, state: &State, u: f64) -> Result<StateDerivative, NumericalInstability> {
        let accelerations = self.solver.accelerations(&self.matrices(state), u)?;
        let derivative = StateDerivative::from_parts(state.velocities(), accelerations);
        if derivative.is_finite() {
            Ok(derivative)
        } else {
            Err(NumericalInstability::NonFinite(Stage::Derivative))
        }
    }

    fn kinetic_energy(&self, state: &State) -> f64 {
        self.solver.kinetic_energy(state)
    }

    fn potential_energy(&self, state: &State) -> f64 {
        self.solver.potential_energy(state)
    }
}
