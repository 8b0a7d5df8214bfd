use dip_core::{NumericalInstability, PhysicsParameters, Stage, State, StateDerivative};
use nalgebra::Vector3;
use tracing::debug;

use crate::{
    EquationsOfMotion, MassMatrixSolver, Matrices, PhysicsMatrices, Regularized,
    matrices::Coefficients,
};

/// Rejects regularized inertia matrices that are still too close to singular.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingularityCheck {
    pub max_condition_number: f64,
    pub min_determinant: f64,
}

impl SingularityCheck {
    #[must_use]
    pub fn from_params(params: &PhysicsParameters) -> Self {
        Self {
            max_condition_number: params.singularity_cond_threshold(),
            min_determinant: params.det_threshold(),
        }
    }

    /// # Errors
    ///
    /// Returns [`NumericalInstability::Singular`] if the condition number is
    /// above the threshold or the determinant magnitude is below it.
    pub fn check(&self, regularized: &Regularized) -> Result<(), NumericalInstability> {
        let condition_number = regularized.condition_number();
        let determinant = regularized.determinant();
        if condition_number > self.max_condition_number
            || !determinant.is_finite()
            || determinant.abs() < self.min_determinant
        {
            debug!(condition_number, determinant, "singular inertia matrix");
            return Err(NumericalInstability::Singular {
                condition_number,
                determinant,
            });
        }
        Ok(())
    }
}

/// Higher-fidelity rigid-body model.
///
/// Differs from [`SimplifiedDynamics`](crate::SimplifiedDynamics) in two ways:
///
/// - joint-2 friction acts on the relative joint rate `θ̇2 − θ̇1`, with the
///   reaction torque applied to link 1;
/// - after regularization the inertia matrix must pass a
///   [`SingularityCheck`].
///
/// The Coriolis/centrifugal forces are assembled directly as a vector. Without
/// friction both models produce identical derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct FullDynamics {
    solver: MassMatrixSolver,
    singularity: SingularityCheck,
}

impl FullDynamics {
    #[must_use]
    pub fn new(params: PhysicsParameters) -> Self {
        Self {
            singularity: SingularityCheck::from_params(&params),
            solver: MassMatrixSolver::new(params),
        }
    }

    #[must_use]
    pub fn solver(&self) -> &MassMatrixSolver {
        &self.solver
    }

    #[must_use]
    pub fn singularity_check(&self) -> &SingularityCheck {
        &self.singularity
    }

    fn velocity_forces(&self, state: &State) -> Vector3<f64> {
        let Coefficients { a, b, d, .. } = *self.solver.coefficients();
        let params = self.solver.params();
        let (s1, s2) = (state.theta1().sin(), state.theta2().sin());
        let s12 = (state.theta1() - state.theta2()).sin();
        let (v, w1, w2) = (state.x_dot(), state.theta1_dot(), state.theta2_dot());
        let joint2 = params.joint2_friction() * (w2 - w1);

        Vector3::new(
            a * s1 * w1 * w1 + b * s2 * w2 * w2 + params.cart_friction() * v,
            d * s12 * w2 * w2 + params.joint1_friction() * w1 - joint2,
            -d * s12 * w1 * w1 + joint2,
        )
    }
}

impl PhysicsMatrices for FullDynamics {
    fn matrices(&self, state: &State) -> Matrices {
        Matrices {
            inertia: self.solver.inertia(state),
            coriolis: self.velocity_forces(state),
            gravity: self.solver.gravity(state),
        }
    }
}

impl EquationsOfMotion for FullDynamics {
    fn derivative(&self, state: &State, u: f64) -> Result<StateDerivative, NumericalInstability> {
        let matrices = self.matrices(state);
        let regularized = self.solver.regularize(&matrices.inertia)?;
        self.singularity.check(&regularized)?;

        let accelerations = regularized.solve(&matrices.generalized_forces(u))?;
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
