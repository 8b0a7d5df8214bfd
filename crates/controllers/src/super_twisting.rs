use dip_core::State;

use crate::{
    ConfigError, ControlOutput, EquivalentControl, History, Series, SharedPhysics,
    SlidingModeController, SlidingSurface, SwitchMethod,
    controller::{finite_or, saturate},
    error::{non_negative, positive, positive_gains},
};

/// Options for [`SuperTwistingSmc`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuperTwistingOptions {
    pub boundary_layer: f64,
    pub switch_method: SwitchMethod,
    /// Linear damping `d·σ` added to the twisting terms.
    pub damping_gain: f64,
}

impl Default for SuperTwistingOptions {
    fn default() -> Self {
        Self {
            boundary_layer: 0.01,
            switch_method: SwitchMethod::Tanh,
            damping_gain: 0.0,
        }
    }
}

/// Integral term and last surface value of a [`SuperTwistingSmc`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SuperTwistingState {
    pub integral: f64,
    pub last_sigma: f64,
}

/// Super-twisting (second-order) sliding-mode control.
///
/// Gains are `[K1, K2, k1, k2, λ1, λ2]`, or just `[K1, K2]` with the default
/// [`SlidingSurface`]:
///
/// ```text
/// u = sat(u_eq − K1·√|σ|·switch(σ) + z − d·σ)
/// z ← clamp(z − K2·switch(σ)·dt, ±max_force)
/// ```
#[derive(Debug, Clone)]
pub struct SuperTwistingSmc {
    surface: SlidingSurface,
    k1: f64,
    k2: f64,
    dt: f64,
    max_force: f64,
    options: SuperTwistingOptions,
    equivalent: Option<EquivalentControl>,
}

impl SuperTwistingSmc {
    /// # Errors
    ///
    /// Returns an error if there are not two or six gains, any gain is not
    /// positive, or `dt`, `max_force`, the boundary layer, or the damping gain
    /// is invalid.
    pub fn new(
        gains: &[f64],
        dt: f64,
        max_force: f64,
        options: SuperTwistingOptions,
    ) -> Result<Self, ConfigError> {
        let (k1, k2, surface) = match *gains {
            [k1, k2] => (k1, k2, SlidingSurface::default()),
            [k1, k2, s1, s2, lambda1, lambda2] => (k1, k2, SlidingSurface::new(s1, lambda1, s2, lambda2)),
            _ => {
                return Err(ConfigError::GainCount {
                    expected: "2 or 6",
                    actual: gains.len(),
                });
            }
        };
        positive_gains(gains)?;
        positive("dt", dt)?;
        positive("max_force", max_force)?;
        positive("boundary_layer", options.boundary_layer)?;
        non_negative("damping_gain", options.damping_gain)?;

        Ok(Self {
            surface,
            k1,
            k2,
            dt,
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

impl SlidingModeController for SuperTwistingSmc {
    type Internal = SuperTwistingState;

    fn max_force(&self) -> f64 {
        self.max_force
    }

    fn initialize_state(&self) -> SuperTwistingState {
        SuperTwistingState::default()
    }

    fn initialize_history(&self) -> History {
        History::with_series(&[Series::Sigma, Series::Control, Series::Integral])
    }

    fn compute_control(
        &self,
        state: &State,
        internal: &SuperTwistingState,
        mut history: History,
    ) -> ControlOutput<SuperTwistingState> {
        let sigma = finite_or(self.surface.value(state), 0.0);
        let z = finite_or(internal.integral, 0.0).clamp(-self.max_force, self.max_force);
        let switching = self
            .options
            .switch_method
            .apply(sigma, self.options.boundary_layer);
        let u_eq = self
            .equivalent
            .as_ref()
            .map_or(0.0, |equivalent| equivalent.compute(state, &self.surface));

        let u = saturate(
            u_eq - self.k1 * sigma.abs().sqrt() * switching + z - self.options.damping_gain * sigma,
            self.max_force,
        );
        let integral = finite_or(z - self.k2 * switching * self.dt, z)
            .clamp(-self.max_force, self.max_force);

        history.record(Series::Sigma, sigma);
        history.record(Series::Control, u);
        history.record(Series::Integral, integral);
        if self.equivalent.is_some() {
            history.record(Series::EquivalentControl, u_eq);
        }

        ControlOutput {
            u,
            state: SuperTwistingState {
                integral,
                last_sigma: sigma,
            },
            history,
            sigma,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn controller() -> SuperTwistingSmc {
        SuperTwistingSmc::new(&[8.0, 4.0, 5.0, 3.0, 4.0, 2.0], 0.01, 20.0, SuperTwistingOptions::default())
            .unwrap()
    }

    #[test]
    fn accepts_short_gain_vector_with_default_surface() {
        let controller =
            SuperTwistingSmc::new(&[8.0, 4.0], 0.01, 20.0, SuperTwistingOptions::default()).unwrap();

        assert_eq!(*controller.surface(), SlidingSurface::default());
    }

    #[test]
    fn rejects_bad_gains() {
        let options = SuperTwistingOptions::default();
        assert!(matches!(
            SuperTwistingSmc::new(&[8.0, 4.0, 1.0], 0.01, 20.0, options),
            Err(ConfigError::GainCount { actual: 3, .. })
        ));
        assert!(matches!(
            SuperTwistingSmc::new(&[8.0, -4.0], 0.01, 20.0, options),
            Err(ConfigError::Gain { index: 1, .. })
        ));
        assert!(SuperTwistingSmc::new(&[8.0, 4.0], 0.0, 20.0, options).is_err());
    }

    #[test]
    fn twisting_law_and_integral_update() {
        let controller = controller();
        // σ = λ1·θ1 = 4·0.25 = 1.0, well outside the boundary layer.
        let state = State::new(0.0, 0.25, 0.0, 0.0, 0.0, 0.0);
        let internal = SuperTwistingState {
            integral: 0.5,
            last_sigma: 0.0,
        };

        let output = controller.compute_control(&state, &internal, History::new());

        assert_relative_eq!(output.sigma, 1.0);
        assert_relative_eq!(output.u, -8.0 + 0.5, epsilon = 1e-9);
        assert_relative_eq!(output.state.integral, 0.5 - 4.0 * 0.01, epsilon = 1e-9);
        assert_relative_eq!(output.state.last_sigma, 1.0);
    }

    #[test]
    fn integral_is_bounded_by_max_force() {
        let controller = controller();
        let state = State::new(0.0, -1.0, 0.0, 0.0, 0.0, 0.0);
        let mut internal = controller.initialize_state();
        let mut history = controller.initialize_history();

        for _ in 0..10_000 {
            let output = controller.compute_control(&state, &internal, history);
            internal = output.state;
            history = output.history;
            assert!(output.u.abs() <= 20.0);
        }

        assert_relative_eq!(internal.integral, 20.0);
        assert_eq!(history.get(Series::Integral).len(), 10_000);
    }

    #[test]
    fn non_finite_internal_state_is_sanitized() {
        let controller = controller();
        let internal = SuperTwistingState {
            integral: f64::NAN,
            last_sigma: f64::INFINITY,
        };

        let output = controller.compute_control(&State::upright(), &internal, History::new());

        assert!(output.u.is_finite());
        assert!(output.state.integral.is_finite());
    }
}
