use dip_core::State;

use crate::{
    ConfigError, ControlOutput, EquivalentControl, History, Series, SharedPhysics,
    SlidingModeController, SlidingSurface, SwitchMethod,
    controller::{finite_or, saturate},
    error::{non_negative, positive, positive_gains, within},
};

/// Relative margin below `max_force` at which the output counts as saturated.
const SATURATION_MARGIN: f64 = 1e-9;

/// Options for [`HybridAdaptiveStaSmc`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridOptions {
    pub k1_init: f64,
    pub k2_init: f64,
    /// Adaptation rate of `k1`.
    pub gamma1: f64,
    /// Adaptation rate of `k2`.
    pub gamma2: f64,
    /// Upper bound on `k1`; defaults to `max_force`.
    pub k1_max: Option<f64>,
    /// Upper bound on `k2`; defaults to `max_force`.
    pub k2_max: Option<f64>,
    /// Bound on the integral term; defaults to `max_force`.
    pub integral_limit: Option<f64>,
    /// Half-width of the band around `σ = 0` where gains and integral freeze.
    pub dead_zone: f64,
    pub adapt_rate_limit: f64,
    /// Scale of the tapering factor `|σ| / (|σ| + taper_eps)`.
    pub taper_eps: f64,
    /// Below this `|σ|`, a saturated output blocks gain growth.
    pub adaptation_sat_threshold: f64,
    /// Decay rate of both gains.
    pub gain_leak: f64,
    pub damping_gain: f64,
    /// Boundary layer of the switching function.
    pub sat_soft_width: f64,
    pub switch_method: SwitchMethod,
    pub cart_gain: f64,
    pub cart_lambda: f64,
    /// Use `θ2 − θ1` and `θ̇2 − θ̇1` for the second link's surface terms.
    pub use_relative_surface: bool,
    /// Add equivalent control when dynamics are attached.
    pub enable_equivalent: bool,
}

impl Default for HybridOptions {
    fn default() -> Self {
        Self {
            k1_init: 4.0,
            k2_init: 0.4,
            gamma1: 2.0,
            gamma2: 0.5,
            k1_max: None,
            k2_max: None,
            integral_limit: None,
            dead_zone: 0.01,
            adapt_rate_limit: 5.0,
            taper_eps: 0.05,
            adaptation_sat_threshold: 0.02,
            gain_leak: 1e-3,
            damping_gain: 3.0,
            sat_soft_width: 0.03,
            switch_method: SwitchMethod::Tanh,
            cart_gain: 0.5,
            cart_lambda: 1.0,
            use_relative_surface: false,
            enable_equivalent: false,
        }
    }
}

/// Adaptive gains and integral term of a [`HybridAdaptiveStaSmc`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridState {
    pub k1: f64,
    pub k2: f64,
    pub integral: f64,
}

/// Resolved limits, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Limits {
    k1_max: f64,
    k2_max: f64,
    integral: f64,
}

/// Super-twisting control with two independently adapting gains.
///
/// Gains are `[c1, λ1, c2, λ2]`, giving the surface
///
/// ```text
/// σ = c1·(θ̇1 + λ1·θ1) + c2·(θ̇2 + λ2·θ2) + cart_gain·(ẋ + cart_lambda·x)
/// ```
///
/// The output is computed from the gains held on entry:
/// `u = sat(u_eq − k1·√|σ|·switch(σ) + z − damping·σ)`. Adaptation then
/// applies, in order: a tapered drive `γ·|σ|·|σ|/(|σ| + taper_eps)` outside
/// the dead zone, gain leak, a freeze on growth when the output is saturated
/// with `|σ|` small, the rate limit, and clipping to `[0, k_max]`. The integral
/// is held in the dead zone and rolled back while saturated.
///
/// Every returned value is finite for any input.
#[derive(Debug, Clone)]
pub struct HybridAdaptiveStaSmc {
    c1: f64,
    lambda1: f64,
    c2: f64,
    lambda2: f64,
    dt: f64,
    max_force: f64,
    limits: Limits,
    options: HybridOptions,
    equivalent: Option<EquivalentControl>,
}

impl HybridAdaptiveStaSmc {
    /// # Errors
    ///
    /// Returns an error if there are not exactly four positive gains, or if
    /// `dt`, `max_force`, or any option is out of range.
    pub fn new(
        gains: &[f64],
        dt: f64,
        max_force: f64,
        options: HybridOptions,
    ) -> Result<Self, ConfigError> {
        let &[c1, lambda1, c2, lambda2] = gains else {
            return Err(ConfigError::GainCount {
                expected: "4",
                actual: gains.len(),
            });
        };
        positive_gains(gains)?;
        positive("dt", dt)?;
        positive("max_force", max_force)?;

        let limits = Limits {
            k1_max: positive("k1_max", options.k1_max.unwrap_or(max_force))?,
            k2_max: positive("k2_max", options.k2_max.unwrap_or(max_force))?,
            integral: positive("integral_limit", options.integral_limit.unwrap_or(max_force))?,
        };
        within("k1_init", options.k1_init, 0.0, limits.k1_max)?;
        within("k2_init", options.k2_init, 0.0, limits.k2_max)?;
        non_negative("gamma1", options.gamma1)?;
        non_negative("gamma2", options.gamma2)?;
        non_negative("dead_zone", options.dead_zone)?;
        positive("adapt_rate_limit", options.adapt_rate_limit)?;
        positive("taper_eps", options.taper_eps)?;
        non_negative("adaptation_sat_threshold", options.adaptation_sat_threshold)?;
        non_negative("gain_leak", options.gain_leak)?;
        non_negative("damping_gain", options.damping_gain)?;
        positive("sat_soft_width", options.sat_soft_width)?;
        non_negative("cart_gain", options.cart_gain)?;
        non_negative("cart_lambda", options.cart_lambda)?;

        Ok(Self {
            c1,
            lambda1,
            c2,
            lambda2,
            dt,
            max_force,
            limits,
            options,
            equivalent: None,
        })
    }

    /// Attaches a model for equivalent control, used when
    /// [`HybridOptions::enable_equivalent`] is set.
    #[must_use]
    pub fn with_dynamics(self, physics: SharedPhysics) -> Self {
        Self {
            equivalent: Some(EquivalentControl::new(physics, self.max_force)),
            ..self
        }
    }

    #[must_use]
    pub fn options(&self) -> &HybridOptions {
        &self.options
    }

    /// Sliding surface value at `state`.
    #[must_use]
    pub fn sigma(&self, state: &State) -> f64 {
        let (theta2, rate2) = if self.options.use_relative_surface {
            (state.theta2() - state.theta1(), state.theta2_dot() - state.theta1_dot())
        } else {
            (state.theta2(), state.theta2_dot())
        };
        self.c1 * (state.theta1_dot() + self.lambda1 * state.theta1())
            + self.c2 * (rate2 + self.lambda2 * theta2)
            + self.options.cart_gain * (state.x_dot() + self.options.cart_lambda * state.x())
    }

    /// Angular part of the surface in the absolute form used by
    /// equivalent control.
    fn angular_surface(&self) -> SlidingSurface {
        SlidingSurface::new(self.c1, self.c1 * self.lambda1, self.c2, self.c2 * self.lambda2)
    }

    fn sanitize(&self, internal: &HybridState) -> HybridState {
        HybridState {
            k1: finite_or(internal.k1, self.options.k1_init).clamp(0.0, self.limits.k1_max),
            k2: finite_or(internal.k2, self.options.k2_init).clamp(0.0, self.limits.k2_max),
            integral: finite_or(internal.integral, 0.0)
                .clamp(-self.limits.integral, self.limits.integral),
        }
    }

    fn adapt(&self, gain: f64, gamma: f64, drive: f64, freeze: bool, max: f64) -> f64 {
        let mut rate = gamma * drive - self.options.gain_leak * gain;
        if freeze {
            rate = rate.min(0.0);
        }
        let rate = rate.clamp(-self.options.adapt_rate_limit, self.options.adapt_rate_limit);
        finite_or(gain + rate * self.dt, gain).clamp(0.0, max)
    }
}

impl SlidingModeController for HybridAdaptiveStaSmc {
    type Internal = HybridState;

    fn max_force(&self) -> f64 {
        self.max_force
    }

    fn initialize_state(&self) -> HybridState {
        HybridState {
            k1: self.options.k1_init,
            k2: self.options.k2_init,
            integral: 0.0,
        }
    }

    fn initialize_history(&self) -> History {
        History::with_series(&[
            Series::K1,
            Series::K2,
            Series::Integral,
            Series::Sigma,
            Series::Control,
            Series::EquivalentControl,
        ])
    }

    fn compute_control(
        &self,
        state: &State,
        internal: &HybridState,
        mut history: History,
    ) -> ControlOutput<HybridState> {
        let HybridState { k1, k2, integral } = self.sanitize(internal);
        let options = &self.options;

        let sigma = finite_or(self.sigma(state), 0.0);
        let magnitude = sigma.abs();
        let switching = options.switch_method.apply(sigma, options.sat_soft_width);

        let u_eq = match &self.equivalent {
            Some(equivalent) if options.enable_equivalent => {
                equivalent.compute(state, &self.angular_surface())
            }
            _ => 0.0,
        };
        let u = saturate(
            u_eq - k1 * magnitude.sqrt() * switching + integral - options.damping_gain * sigma,
            self.max_force,
        );
        let saturated = u.abs() >= self.max_force * (1.0 - SATURATION_MARGIN);

        let in_dead_zone = magnitude <= options.dead_zone;
        let drive = if in_dead_zone {
            0.0
        } else {
            magnitude * magnitude / (magnitude + options.taper_eps)
        };
        let freeze = saturated && magnitude < options.adaptation_sat_threshold;
        let next_k1 = self.adapt(k1, options.gamma1, drive, freeze, self.limits.k1_max);
        let next_k2 = self.adapt(k2, options.gamma2, drive, freeze, self.limits.k2_max);

        let next_integral = if in_dead_zone || saturated {
            integral
        } else {
            finite_or(integral - k2 * switching * self.dt, integral)
                .clamp(-self.limits.integral, self.limits.integral)
        };

        history.record(Series::K1, next_k1);
        history.record(Series::K2, next_k2);
        history.record(Series::Integral, next_integral);
        history.record(Series::Sigma, sigma);
        history.record(Series::Control, u);
        history.record(Series::EquivalentControl, u_eq);

        ControlOutput {
            u,
            state: HybridState {
                k1: next_k1,
                k2: next_k2,
                integral: next_integral,
            },
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
    use proptest::prelude::*;

    // --- Test fixtures ---

    const GAINS: [f64; 4] = [1.0, 2.0, 1.0, 2.0];

    fn controller(dt: f64, max_force: f64, options: HybridOptions) -> HybridAdaptiveStaSmc {
        HybridAdaptiveStaSmc::new(&GAINS, dt, max_force, options).unwrap()
    }

    /// A state whose surface value is exactly `sigma` (with `c1 = 1`).
    fn with_sigma(sigma: f64) -> State {
        State::new(0.0, 0.0, 0.0, 0.0, sigma, 0.0)
    }

    // --- Tests ---

    mod construction {
        use super::*;

        #[test]
        fn rejects_wrong_gain_count() {
            assert!(matches!(
                HybridAdaptiveStaSmc::new(&[1.0; 6], 0.01, 20.0, HybridOptions::default()),
                Err(ConfigError::GainCount { actual: 6, .. })
            ));
        }

        #[test]
        fn rejects_initial_gain_above_limit() {
            let options = HybridOptions {
                k1_init: 30.0,
                ..HybridOptions::default()
            };

            assert!(matches!(
                HybridAdaptiveStaSmc::new(&GAINS, 0.01, 20.0, options),
                Err(ConfigError::OutOfRange { name: "k1_init", .. })
            ));
        }

        #[test]
        fn surface_includes_cart_terms() {
            let controller = controller(0.01, 20.0, HybridOptions::default());
            let state = State::new(0.2, 0.1, 0.05, 0.4, 0.3, -0.1);

            // 1·(0.3 + 2·0.1) + 1·(−0.1 + 2·0.05) + 0.5·(0.4 + 1·0.2)
            assert_relative_eq!(controller.sigma(&state), 0.5 + 0.0 + 0.3, epsilon = 1e-12);
        }

        #[test]
        fn relative_surface_uses_joint_coordinates() {
            let options = HybridOptions {
                use_relative_surface: true,
                cart_gain: 0.0,
                ..HybridOptions::default()
            };
            let controller = controller(0.01, 20.0, options);
            // Links aligned: relative angle and rate vanish.
            let state = State::new(0.0, 0.1, 0.1, 0.0, 0.3, 0.3);

            assert_relative_eq!(controller.sigma(&state), 0.3 + 0.2, epsilon = 1e-12);
        }
    }

    mod adaptation {
        use super::*;

        #[test]
        fn tapering_slows_growth_as_sigma_shrinks() {
            let controller = controller(0.01, 1e3, HybridOptions::default());
            let steps = 200;
            let mut internal = controller.initialize_state();
            let mut increments = Vec::with_capacity(steps);

            for i in 0..steps {
                let sigma = 1e-3f64.powf(i as f64 / (steps - 1) as f64);
                let output = controller.compute_control(&with_sigma(sigma), &internal, History::new());
                increments.push(output.state.k1 - internal.k1);
                internal = output.state;
            }

            let mean = |values: &[f64]| values.iter().sum::<f64>() / values.len() as f64;
            let (first, second) = increments.split_at(steps / 2);
            assert!(mean(second) <= mean(first));
        }

        #[test]
        fn saturation_blocks_gain_growth_near_surface() {
            let options = HybridOptions {
                adaptation_sat_threshold: 0.1,
                ..HybridOptions::default()
            };
            let controller = controller(0.01, 1.0, options);
            let internal = HybridState {
                k1: 0.5,
                k2: 0.5,
                integral: 1.0,
            };

            let output = controller.compute_control(&with_sigma(-0.05), &internal, History::new());

            assert_relative_eq!(output.u, 1.0);
            assert!(output.state.k1 <= internal.k1);
            assert!(output.state.k2 <= internal.k2);
        }

        #[test]
        fn integral_rolls_back_while_saturated() {
            let controller = controller(0.01, 1.0, HybridOptions::default());
            let internal = HybridState {
                k1: 0.5,
                k2: 0.5,
                integral: 0.8,
            };

            // Large negative σ drives u to +max_force.
            let output = controller.compute_control(&with_sigma(-2.0), &internal, History::new());

            assert_relative_eq!(output.u, 1.0);
            assert_relative_eq!(output.state.integral, 0.8);
        }

        #[test]
        fn gains_leak_without_drive() {
            let options = HybridOptions {
                gamma1: 0.0,
                gamma2: 0.0,
                gain_leak: 0.1,
                ..HybridOptions::default()
            };
            let controller = controller(0.01, 20.0, options);
            let mut internal = controller.initialize_state();

            for _ in 0..100 {
                let next = controller
                    .compute_control(&State::upright(), &internal, History::new())
                    .state;
                assert!(next.k1 < internal.k1);
                assert!(next.k1 >= 0.0);
                internal = next;
            }
        }

        #[test]
        fn dead_zone_freezes_gains_and_integral() {
            let controller = controller(0.001, 20.0, HybridOptions::default());
            let internal = HybridState {
                k1: 4.0,
                k2: 0.4,
                integral: 0.3,
            };

            let output = controller.compute_control(&with_sigma(0.005), &internal, History::new());

            assert_relative_eq!(output.state.k1, 4.0, epsilon = 5e-5);
            assert_relative_eq!(output.state.k2, 0.4, epsilon = 5e-5);
            assert_eq!(output.state.integral, 0.3);
        }

        #[test]
        fn gains_grow_outside_dead_zone() {
            let controller = controller(0.01, 20.0, HybridOptions::default());
            let internal = controller.initialize_state();

            let output = controller.compute_control(&with_sigma(0.5), &internal, History::new());

            assert!(output.state.k1 > internal.k1);
            assert!(output.state.k2 > internal.k2);
        }
    }

    mod safety {
        use super::*;

        #[test]
        fn extreme_inputs_produce_finite_outputs() {
            let controller = controller(0.01, 20.0, HybridOptions::default());

            for magnitude in [1e10, -1e10, f64::MAX, f64::NAN] {
                let state = State::from([magnitude; 6]);
                let internal = HybridState {
                    k1: magnitude,
                    k2: magnitude,
                    integral: magnitude,
                };

                let output = controller.compute_control(&state, &internal, History::new());

                assert!(output.u.is_finite());
                assert!(output.sigma.is_finite());
                assert!(output.state.k1.is_finite());
                assert!(output.state.k2.is_finite());
                assert!(output.state.integral.is_finite());
            }
        }

        #[test]
        fn equivalent_control_requires_opt_in() {
            let physics = Arc::new(SimplifiedDynamics::new(PhysicsParameters::default()));
            let state = State::new(0.0, 0.05, -0.02, 0.0, 0.1, 0.0);

            let disabled = controller(0.01, 20.0, HybridOptions::default()).with_dynamics(physics.clone());
            let output = disabled.compute_control(&state, &disabled.initialize_state(), History::new());
            assert_eq!(output.history.last(Series::EquivalentControl), Some(0.0));

            let options = HybridOptions {
                enable_equivalent: true,
                ..HybridOptions::default()
            };
            let enabled = controller(0.01, 20.0, options).with_dynamics(physics);
            let output = enabled.compute_control(&state, &enabled.initialize_state(), History::new());
            assert_ne!(output.history.last(Series::EquivalentControl), Some(0.0));
        }

        proptest! {
            #[test]
            fn gains_stay_within_zero_and_max_force(
                values in prop::array::uniform6(-1e3f64..1e3),
                k1 in -1e3f64..1e3,
                k2 in -1e3f64..1e3,
                integral in -1e3f64..1e3,
            ) {
                let controller = controller(0.01, 20.0, HybridOptions::default());
                let internal = HybridState { k1, k2, integral };

                let output = controller.compute_control(&State::from(values), &internal, History::new());

                prop_assert!(output.u.abs() <= 20.0);
                prop_assert!((0.0..=20.0).contains(&output.state.k1));
                prop_assert!((0.0..=20.0).contains(&output.state.k2));
                prop_assert!(output.state.integral.abs() <= 20.0);
            }
        }
    }
}
