use std::sync::Arc;

use dip_core::{NumericalInstability, PhysicsParameters, State};
use nalgebra::{Matrix6, Vector6};

use crate::{
    EquationsOfMotion, FullDynamics, IntegrationScheme, Integrator, SimplifiedDynamics, linearize,
};

/// Advances the pendulum one control interval at a time.
///
/// This is the stepping contract the closed-loop simulation drives. Calls take
/// `&mut self` because adaptive schemes carry step-size bookkeeping; a single
/// instance must not be shared between concurrent runs.
pub trait Dynamics {
    /// Integrates from `state` over `dt` with the cart force `u` held constant.
    ///
    /// # Errors
    ///
    /// Returns [`NumericalInstability`] if `dt` is not finite and positive, or
    /// if the solver or integrator detects ill-conditioning or non-finite
    /// values.
    fn step(&mut self, state: &State, u: f64, dt: f64) -> Result<State, NumericalInstability>;

    /// The state a simulation starts from when none is given.
    fn default_state(&self) -> State {
        State::upright()
    }

    /// Clears integrator bookkeeping before a restart.
    fn reset(&mut self) {}
}

/// Equations of motion paired with an integration scheme.
///
/// The equations sit behind an [`Arc`] so controllers can share them
/// read-only for equivalent control while the model keeps the mutable
/// integrator state.
#[derive(Debug, Clone)]
pub struct DynamicsModel<E> {
    equations: Arc<E>,
    scheme: IntegrationScheme,
}

impl DynamicsModel<SimplifiedDynamics> {
    /// Simplified-fidelity model integrated with RK4.
    #[must_use]
    pub fn simplified(params: PhysicsParameters) -> Self {
        Self::new(SimplifiedDynamics::new(params))
    }
}

impl DynamicsModel<FullDynamics> {
    /// Full-fidelity model integrated with RK4.
    #[must_use]
    pub fn full(params: PhysicsParameters) -> Self {
        Self::new(FullDynamics::new(params))
    }
}

impl<E: EquationsOfMotion> DynamicsModel<E> {
    #[must_use]
    pub fn new(equations: E) -> Self {
        Self {
            equations: Arc::new(equations),
            scheme: IntegrationScheme::default(),
        }
    }

    /// Replaces the integration scheme.
    #[must_use]
    pub fn with_scheme(self, scheme: impl Into<IntegrationScheme>) -> Self {
        Self {
            scheme: scheme.into(),
            ..self
        }
    }

    #[must_use]
    pub fn equations(&self) -> &Arc<E> {
        &self.equations
    }

    #[must_use]
    pub fn scheme(&self) -> &IntegrationScheme {
        &self.scheme
    }

    #[must_use]
    pub fn kinetic_energy(&self, state: &State) -> f64 {
        self.equations.kinetic_energy(state)
    }

    #[must_use]
    pub fn potential_energy(&self, state: &State) -> f64 {
        self.equations.potential_energy(state)
    }

    #[must_use]
    pub fn total_energy(&self, state: &State) -> f64 {
        self.equations.total_energy(state)
    }

    /// Numerical Jacobians `(A, B)` of the dynamics about `(state, u)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the equations fail at a perturbed point.
    pub fn linearize(
        &self,
        state: &State,
        u: f64,
    ) -> Result<(Matrix6<f64>, Vector6<f64>), NumericalInstability> {
        linearize::linearize(self.equations.as_ref(), state, u)
    }
}

impl<E: EquationsOfMotion> Dynamics for DynamicsModel<E> {
    fn step(&mut self, state: &State, u: f64, dt: f64) -> Result<State, NumericalInstability> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(NumericalInstability::InvalidStep(dt));
        }
        let equations = &self.equations;
        self.scheme
            .integrate(|s: &State| equations.derivative(s, u), state, dt)
    }

    fn reset(&mut self) {
        self.scheme.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use dip_core::{PhysicsConfig, Stage, StateDerivative};

    use crate::{
        Matrices, PhysicsMatrices,
        integrator::{DormandPrince, VelocityVerlet},
    };

    // --- Test fixtures ---

    /// Equations whose derivative is always NaN.
    struct Poisoned;

    impl PhysicsMatrices for Poisoned {
        fn matrices(&self, _state: &State) -> Matrices {
            Matrices {
                inertia: nalgebra::Matrix3::identity(),
                coriolis: nalgebra::Vector3::zeros(),
                gravity: nalgebra::Vector3::zeros(),
            }
        }
    }

    impl EquationsOfMotion for Poisoned {
        fn derivative(&self, _state: &State, _u: f64) -> Result<StateDerivative, NumericalInstability> {
            Ok(StateDerivative::from(Vector6::repeat(f64::NAN)))
        }

        fn kinetic_energy(&self, _state: &State) -> f64 {
            0.0
        }

        fn potential_energy(&self, _state: &State) -> f64 {
            0.0
        }
    }

    fn tilted() -> State {
        State::new(0.0, 0.05, -0.02, 0.0, 0.0, 0.0)
    }

    // --- Tests ---

    mod stepping {
        use super::*;

        #[test]
        fn nan_derivative_is_reported_by_every_scheme() {
            let schemes: [IntegrationScheme; 3] = [
                IntegrationScheme::default(),
                DormandPrince::default().into(),
                VelocityVerlet.into(),
            ];

            for scheme in schemes {
                let mut model = DynamicsModel::new(Poisoned).with_scheme(scheme);
                let result = model.step(&State::upright(), 0.0, 0.01);
                assert_eq!(
                    result,
                    Err(NumericalInstability::NonFinite(Stage::Integrator(1)))
                );
            }
        }

        #[test]
        fn invalid_step_size_is_rejected() {
            let mut model = DynamicsModel::simplified(PhysicsParameters::default());

            assert_eq!(
                model.step(&State::upright(), 0.0, 0.0),
                Err(NumericalInstability::InvalidStep(0.0))
            );
            assert!(model.step(&State::upright(), 0.0, f64::NAN).is_err());
        }

        #[test]
        fn upright_equilibrium_is_preserved() {
            let mut model = DynamicsModel::full(PhysicsParameters::default());

            let start = model.default_state();
            let next = model.step(&start, 0.0, 0.01).unwrap();

            assert_relative_eq!(next.as_vector().norm(), 0.0);
        }

        #[test]
        fn schemes_agree_over_short_horizon() {
            let params = PhysicsParameters::default();
            let mut rk4 = DynamicsModel::simplified(params);
            let mut adaptive = DynamicsModel::simplified(params).with_scheme(DormandPrince::default());
            let mut verlet = DynamicsModel::simplified(params).with_scheme(VelocityVerlet);

            let (mut a, mut b, mut c) = (tilted(), tilted(), tilted());
            for _ in 0..200 {
                a = rk4.step(&a, 0.5, 0.001).unwrap();
                b = adaptive.step(&b, 0.5, 0.001).unwrap();
                c = verlet.step(&c, 0.5, 0.001).unwrap();
            }

            assert_relative_eq!(a.as_vector(), b.as_vector(), epsilon = 1e-3);
            assert_relative_eq!(a.as_vector(), c.as_vector(), epsilon = 1e-3);
        }

        #[test]
        fn reset_clears_adaptive_bookkeeping() {
            let mut model = DynamicsModel::simplified(PhysicsParameters::default())
                .with_scheme(DormandPrince::default());
            model.step(&tilted(), 0.0, 0.01).unwrap();

            model.reset();

            let IntegrationScheme::DormandPrince(scheme) = model.scheme() else {
                panic!("scheme should be adaptive");
            };
            assert_eq!(scheme.time(), 0.0);
        }
    }

    mod energy {
        use super::*;

        #[test]
        fn total_is_kinetic_plus_potential() {
            let model = DynamicsModel::simplified(PhysicsParameters::default());
            let state = State::new(0.1, 0.3, -0.2, 0.4, -1.0, 2.0);

            assert_relative_eq!(
                model.total_energy(&state),
                model.kinetic_energy(&state) + model.potential_energy(&state)
            );
        }

        #[test]
        fn friction_dissipates_energy() {
            let mut model = DynamicsModel::simplified(PhysicsParameters::default());
            let hanging_swing = State::new(0.0, 2.8, 2.8, 0.0, 1.0, 0.5);
            let initial = model.total_energy(&hanging_swing);

            let mut state = hanging_swing;
            for _ in 0..2000 {
                state = model.step(&state, 0.0, 0.001).unwrap();
            }

            assert!(model.total_energy(&state) < initial);
        }

        #[test]
        fn frictionless_verlet_conserves_energy() {
            let params = PhysicsConfig {
                use_fixed_regularization: true,
                ..PhysicsConfig::default().frictionless()
            }
            .validate()
            .unwrap();
            let mut model = DynamicsModel::simplified(params).with_scheme(VelocityVerlet);
            let mut state = State::new(0.0, 2.9, 3.0, 0.0, 0.0, 0.0);
            let initial = model.total_energy(&state);

            for _ in 0..5000 {
                state = model.step(&state, 0.0, 0.001).unwrap();
            }

            let drift = (model.total_energy(&state) - initial).abs() / initial;
            assert!(drift < 1e-2, "relative energy drift {drift}");
        }
    }
}
