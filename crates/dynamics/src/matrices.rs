use dip_core::{NumericalInstability, PhysicsParameters, State};
use nalgebra::{Matrix3, Vector3};

use crate::{Regularized, Regularizer};

/// The terms of `H(q)·q̈ + c(q, q̇) + G(q) = [u, 0, 0]` at one state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrices {
    /// Inertia matrix `H(q)`.
    pub inertia: Matrix3<f64>,
    /// Coriolis, centrifugal, and friction terms `c(q, q̇)`.
    pub coriolis: Vector3<f64>,
    /// Gravity vector `G(q)`.
    pub gravity: Vector3<f64>,
}

impl Matrices {
    /// Generalized forces `[u, 0, 0] − c − G` acting on the accelerations.
    #[must_use]
    pub fn generalized_forces(&self, u: f64) -> Vector3<f64> {
        Vector3::new(u, 0.0, 0.0) - self.coriolis - self.gravity
    }
}

/// Lumped coefficients that appear throughout the equations of motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Coefficients {
    pub total_mass: f64,
    /// `m1·lc1 + m2·l1`
    pub a: f64,
    /// `m2·lc2`
    pub b: f64,
    /// `m2·l1·lc2`
    pub d: f64,
    /// `m1·lc1² + m2·l1² + I1`
    pub h22: f64,
    /// `m2·lc2² + I2`
    pub h33: f64,
}

impl Coefficients {
    fn new(p: &PhysicsParameters) -> Self {
        let (m1, m2) = (p.pendulum1_mass(), p.pendulum2_mass());
        let (l1, lc1, lc2) = (p.pendulum1_length(), p.pendulum1_com(), p.pendulum2_com());
        Self {
            total_mass: p.cart_mass() + m1 + m2,
            a: m1 * lc1 + m2 * l1,
            b: m2 * lc2,
            d: m2 * l1 * lc2,
            h22: m1 * lc1 * lc1 + m2 * l1 * l1 + p.pendulum1_inertia(),
            h33: m2 * lc2 * lc2 + p.pendulum2_inertia(),
        }
    }
}

/// Builds and inverts the mass matrix of the cart and two links.
///
/// With `a = m1·lc1 + m2·l1`, `b = m2·lc2` and `d = m2·l1·lc2`:
///
/// ```text
/// H = [ mc+m1+m2    −a·cos θ1        −b·cos θ2      ]
///     [ −a·cos θ1   m1·lc1²+m2·l1²+I1  d·cos(θ1−θ2) ]
///     [ −b·cos θ2   d·cos(θ1−θ2)     m2·lc2²+I2     ]
///
/// G = [ 0, −a·g·sin θ1, −b·g·sin θ2 ]
/// ```
///
/// Inversion always goes through the [`Regularizer`] configured by the
/// parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MassMatrixSolver {
    params: PhysicsParameters,
    regularizer: Regularizer,
    coefficients: Coefficients,
}

impl MassMatrixSolver {
    #[must_use]
    pub fn new(params: PhysicsParameters) -> Self {
        Self {
            regularizer: Regularizer::from_params(&params),
            coefficients: Coefficients::new(&params),
            params,
        }
    }

    #[must_use]
    pub fn params(&self) -> &PhysicsParameters {
        &self.params
    }

    #[must_use]
    pub fn regularizer(&self) -> &Regularizer {
        &self.regularizer
    }

    pub(crate) fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Inertia matrix `H(q)`.
    #[must_use]
    pub fn inertia(&self, state: &State) -> Matrix3<f64> {
        let Coefficients {
            total_mass,
            a,
            b,
            d,
            h22,
            h33,
        } = self.coefficients;
        let (c1, c2) = (state.theta1().cos(), state.theta2().cos());
        let c12 = (state.theta1() - state.theta2()).cos();

        Matrix3::new(
            total_mass,
            -a * c1,
            -b * c2,
            -a * c1,
            h22,
            d * c12,
            -b * c2,
            d * c12,
            h33,
        )
    }

    /// Coriolis/centrifugal matrix `C(q, q̇)` with viscous friction on the
    /// diagonal, so that `C·q̇` gives the velocity-dependent forces.
    #[must_use]
    pub fn coriolis_matrix(&self, state: &State) -> Matrix3<f64> {
        let Coefficients { a, b, d, .. } = self.coefficients;
        let (s1, s2) = (state.theta1().sin(), state.theta2().sin());
        let s12 = (state.theta1() - state.theta2()).sin();
        let (w1, w2) = (state.theta1_dot(), state.theta2_dot());

        Matrix3::new(
            self.params.cart_friction(),
            a * s1 * w1,
            b * s2 * w2,
            0.0,
            self.params.joint1_friction(),
            d * s12 * w2,
            0.0,
            -d * s12 * w1,
            self.params.joint2_friction(),
        )
    }

    /// Gravity vector `G(q) = ∂V/∂q`.
    #[must_use]
    pub fn gravity(&self, state: &State) -> Vector3<f64> {
        let Coefficients { a, b, .. } = self.coefficients;
        let g = self.params.gravity();
        Vector3::new(0.0, -a * g * state.theta1().sin(), -b * g * state.theta2().sin())
    }

    /// All three terms, with the Coriolis matrix applied to `q̇`.
    #[must_use]
    pub fn matrices(&self, state: &State) -> Matrices {
        Matrices {
            inertia: self.inertia(state),
            coriolis: self.coriolis_matrix(state) * state.velocities(),
            gravity: self.gravity(state),
        }
    }

    /// Regularizes an inertia matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix cannot be made safely invertible.
    pub fn regularize(&self, inertia: &Matrix3<f64>) -> Result<Regularized, NumericalInstability> {
        self.regularizer.regularize(inertia)
    }

    /// Solves for the generalized accelerations `q̈`.
    ///
    /// # Errors
    ///
    /// Returns an error if regularization or the linear solve fails.
    pub fn accelerations(
        &self,
        matrices: &Matrices,
        u: f64,
    ) -> Result<Vector3<f64>, NumericalInstability> {
        self.regularize(&matrices.inertia)?
            .solve(&matrices.generalized_forces(u))
    }

    /// Kinetic energy `½·q̇ᵀ·H·q̇`.
    #[must_use]
    pub fn kinetic_energy(&self, state: &State) -> f64 {
        let velocities = state.velocities();
        0.5 * velocities.dot(&(self.inertia(state) * velocities))
    }

    /// Potential energy, zero with both links hanging straight down.
    #[must_use]
    pub fn potential_energy(&self, state: &State) -> f64 {
        let Coefficients { a, b, .. } = self.coefficients;
        let g = self.params.gravity();
        a * g * (1.0 + state.theta1().cos()) + b * g * (1.0 + state.theta2().cos())
    }
}
