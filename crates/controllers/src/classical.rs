use dip_core::State;

use crate::{
    ConfigError, ControlOutput, EquivalentControl, History, Series, SharedPhysics,
    SlidingModeController, SlidingSurface, SwitchMethod,
    controller::saturate,
    error::{non_negative, positive, positive_gains},
};

/// Options for [`ClassicalSmc`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassicalOptions {
    /// Boundary layer thickness `ε`, strictly positive.
    pub boundary_layer: f64,
    pub switch_method: SwitchMethod,
}

impl Default for ClassicalOptions {
    fn default() -> Self {
        Self {
            boundary_layer: 0.01,
            switch_method: SwitchMethod::Tanh,
        }
    }
}

/// Classical sliding-mode control with a boundary layer.
///
/// Gains are `[k1, k2, λ1, λ2, K, kd]`, and the control law is
///
/// ```text
/// σ = k1·θ̇1 + λ1·θ1 + k2·θ̇2 + λ2·θ2
/// u = sat(u_eq − K·switch(σ/ε) − kd·σ)
/// ```
///
/// where `u_eq` is present only when a model is attached with
/// [`with_dynamics`](Self::with_dynamics).
#[derive(Debug, Clone)]
pub struct ClassicalSmc {
    surface: SlidingSurface,
    switching_gain: f64,
    damping_gain: f64,
    max_force: f64,
    options: ClassicalOptions,
    equivalent: Option<EquivalentControl>,
}

impl ClassicalSmc {
    /// # Errors
    ///
    /// Returns an error if there are not exactly six gains, a surface or
    /// switching gain is not positive, `kd` is negative, or `max_force` or
    /// the boundary layer is not positive.
    pub fn new(gains: &[f64], max_force: f64, options: ClassicalOptions) -> Result<Self, ConfigError> {
        let &[k1, k2, lambda1, lambda2, switching_gain, damping_gain] = gains else {
            return Err(ConfigError::GainCount {
                expected: "6",
                actual: gains.len(),
            });
        };
        positive_gains(&gains[..5])?;
        non_negative("kd", damping_gain)?;
        positive("max_force", max_force)?;
        positive("boundary_layer", options.boundary_layer)?;

        Ok(Self {
            surface: SlidingSurface::new(k1, lambda1, k2, lambda2),
            switching_gain,
            damping_gain,
            max_force,
            options,
            equivalent: None,
        })
    }

    /// Enables equivalent control computed from `physics`.
    #[must_use]
    pub fn with_dynamics(self, physics: SharedPhysics) -> Self {
        Self {
            equivalent: Some(EquivalentControl::new(physics, self.max_force)),
            ..self
        }
    }

    #[must_use]
    pub fn surface(&self) -> &SlidingSurface {
        &self.surface
    }
}

impl SlidingModeController for ClassicalSmc {
    type Internal = ();

    fn max_force(&self) -> f64 {
        self.max_force
    }

    fn initialize_state(&self) {}

    fn initialize_history(&self) -> History {
        History::with_series(&[Series::Sigma, Series::Control, Series::EquivalentControl])
    }

    fn compute_control(&self, state: &State, _internal: &(), mut history: History) -> ControlOutput<()> {
        let sigma = self.surface.value(state);
        let u_eq = self
            .equivalent
            .as_ref()
            .map_or(0.0, |equivalent| equivalent.compute(state, &self.surface));
        let switching = self
            .options
            .switch_method
            .apply(sigma, self.options.boundary_layer);

        let u = saturate(
            u_eq - self.switching_gain * switching - self.damping_gain * sigma,
            self.max_force,
        );

        history.record(Series::Sigma, sigma);
        history.record(Series::Control, u);
        history.record(Series::EquivalentControl, u_eq);

        ControlOutput {
            u,
            state: (),
            history,
            sigma,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use approx::assert_relative_eq;
    use dip_core::PhysicsParameters;
    use dip_dynamics::SimplifiedDynamics;

    fn controller() -> ClassicalSmc {
        ClassicalSmc::new(&[5.0, 3.0, 4.0, 2.0, 10.0, 1.0], 20.0, ClassicalOptions::default()).unwrap()
    }

    #[test]
    fn rejects_wrong_gain_count() {
        assert_eq!(
            ClassicalSmc::new(&[1.0; 5], 20.0, ClassicalOptions::default()).unwrap_err(),
            ConfigError::GainCount {
                expected: "6",
                actual: 5
            }
        );
    }

    #[test]
    fn rejects_non_positive_gain_and_boundary_layer() {
        assert_eq!(
            ClassicalSmc::new(&[5.0, 3.0, 0.0, 2.0, 10.0, 1.0], 20.0, ClassicalOptions::default())
                .unwrap_err(),
            ConfigError::Gain {
                index: 2,
                value: 0.0
            }
        );

        let options = ClassicalOptions {
            boundary_layer: 0.0,
            ..ClassicalOptions::default()
        };
        assert!(ClassicalSmc::new(&[5.0, 3.0, 4.0, 2.0, 10.0, 1.0], 20.0, options).is_err());
    }

    #[test]
    fn pushes_against_surface_sign() {
        let controller = controller();
        let leaning = State::new(0.0, 0.05, 0.0, 0.0, 0.0, 0.0);

        let output = controller.compute_control(&leaning, &(), controller.initialize_history());

        // σ = 4·0.05 = 0.2 ≫ ε, so switching is saturated at +1.
        assert_relative_eq!(output.sigma, 0.2);
        assert_relative_eq!(output.u, -10.0 - 0.2, epsilon = 1e-9);
    }

    #[test]
    fn output_is_saturated() {
        let controller = controller();
        let far = State::new(0.0, 1.0, 1.0, 0.0, 5.0, 5.0);

        let output = controller.compute_control(&far, &(), History::new());

        assert_relative_eq!(output.u, -20.0);
    }

    #[test]
    fn linear_switching_is_proportional_inside_boundary_layer() {
        let options = ClassicalOptions {
            boundary_layer: 1.0,
            switch_method: SwitchMethod::Linear,
        };
        let controller = ClassicalSmc::new(&[5.0, 3.0, 4.0, 2.0, 10.0, 0.0], 20.0, options).unwrap();
        let state = State::new(0.0, 0.05, 0.0, 0.0, 0.0, 0.0);

        let output = controller.compute_control(&state, &(), History::new());

        assert_relative_eq!(output.u, -10.0 * 0.2, epsilon = 1e-12);
    }

    #[test]
    fn records_history() {
        let controller = controller();
        let mut history = controller.initialize_history();

        for _ in 0..3 {
            history = controller
                .compute_control(&State::upright(), &(), history)
                .history;
        }

        assert_eq!(history.get(Series::Sigma).len(), 3);
        assert_eq!(history.get(Series::EquivalentControl), &[0.0; 3]);
    }

    #[test]
    fn equivalent_control_contributes_when_dynamics_attached() {
        let physics = Arc::new(SimplifiedDynamics::new(PhysicsParameters::default()));
        let controller = controller().with_dynamics(physics);
        let state = State::new(0.0, 0.05, -0.02, 0.0, 0.1, 0.0);

        let output = controller.compute_control(&state, &(), controller.initialize_history());

        assert_ne!(output.history.last(Series::EquivalentControl), Some(0.0));
        assert!(output.u.abs() <= 20.0);
    }
}
