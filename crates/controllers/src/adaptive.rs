use dip_core::State;

use crate::{
    ConfigError, ControlOutput, EquivalentControl, History, Series, SharedPhysics,
    SlidingModeController, SlidingSurface, SwitchMethod,
    controller::{finite_or, saturate},
    error::{non_negative, positive, positive_gains, within},
};

/// Options for [`AdaptiveSmc`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveOptions {
    /// Leak coefficient pulling the gain toward `k_min`.
    pub leak_rate: f64,
    /// Half-width of the band around `σ = 0` where adaptation stops.
    pub dead_zone: f64,
    /// Bound on `|K̇|`.
    pub adapt_rate_limit: f64,
    pub k_min: f64,
    pub k_max: f64,
    pub k_init: f64,
    /// Proportional gain on `σ`.
    pub alpha: f64,
    pub boundary_layer: f64,
    pub switch_method: SwitchMethod,
}

impl Default for AdaptiveOptions {
    fn default() -> Self {
        Self {
            leak_rate: 0.01,
            dead_zone: 0.05,
            adapt_rate_limit: 10.0,
            k_min: 0.1,
            k_max: 100.0,
            k_init: 10.0,
            alpha: 0.5,
            boundary_layer: 0.1,
            switch_method: SwitchMethod::Tanh,
        }
    }
}

/// Adaptive gain and bookkeeping of an [`AdaptiveSmc`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveState {
    pub gain: f64,
    pub last_u: f64,
    /// Time continuously spent inside the dead zone.
    pub time_in_sliding: f64,
}

/// Sliding-mode control with a leaky adaptive switching gain.
///
/// Gains are `[k1, k2, λ1, λ2, γ]`. Each step:
///
/// ```text
/// u  = sat(u_eq − K·switch(σ) − α·σ)
/// K̇  = γ·|σ| − leak·K   outside the dead zone
/// K̇  = −leak·K          inside it
/// K ← clamp(K + clamp(K̇, ±rate_limit)·dt, k_min, k_max)
/// ```
///
/// The gain stays within `[k_min, k_max]` for every input, including
/// non-finite ones.
#[derive(Debug, Clone)]
pub struct AdaptiveSmc {
    surface: SlidingSurface,
    gamma: f64,
    dt: f64,
    max_force: f64,
    options: AdaptiveOptions,
    equivalent: Option<EquivalentControl>,
}

impl AdaptiveSmc {
    /// # Errors
    ///
    /// Returns an error if there are not exactly five positive gains, or if
    /// any option is out of range (`k_min <= k_init <= k_max` is required).
    pub fn new(
        gains: &[f64],
        dt: f64,
        max_force: f64,
        options: AdaptiveOptions,
    ) -> Result<Self, ConfigError> {
        let &[k1, k2, lambda1, lambda2, gamma] = gains else {
            return Err(ConfigError::GainCount {
                expected: "5",
                actual: gains.len(),
            });
        };
        positive_gains(gains)?;
        positive("dt", dt)?;
        positive("max_force", max_force)?;
        non_negative("leak_rate", options.leak_rate)?;
        non_negative("dead_zone", options.dead_zone)?;
        positive("adapt_rate_limit", options.adapt_rate_limit)?;
        non_negative("k_min", options.k_min)?;
        within("k_max", options.k_max, options.k_min, f64::MAX)?;
        within("k_init", options.k_init, options.k_min, options.k_max)?;
        non_negative("alpha", options.alpha)?;
        positive("boundary_layer", options.boundary_layer)?;

        Ok(Self {
            surface: SlidingSurface::new(k1, lambda1, k2, lambda2),
            gamma,
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
    pub fn options(&self) -> &AdaptiveOptions {
        &self.options
    }
}

impl SlidingModeController for AdaptiveSmc {
    type Internal = AdaptiveState;

    fn max_force(&self) -> f64 {
        self.max_force
    }

    fn initialize_state(&self) -> AdaptiveState {
        AdaptiveState {
            gain: self.options.k_init,
            last_u: 0.0,
            time_in_sliding: 0.0,
        }
    }

    fn initialize_history(&self) -> History {
        History::with_series(&[Series::Sigma, Series::Control, Series::Gain, Series::GainRate])
    }

    fn compute_control(
        &self,
        state: &State,
        internal: &AdaptiveState,
        mut history: History,
    ) -> ControlOutput<AdaptiveState> {
        let AdaptiveOptions {
            leak_rate,
            dead_zone,
            adapt_rate_limit,
            k_min,
            k_max,
            k_init,
            alpha,
            boundary_layer,
            switch_method,
        } = self.options;

        let sigma = finite_or(self.surface.value(state), 0.0);
        let gain = finite_or(internal.gain, k_init).clamp(k_min, k_max);
        let u_eq = self
            .equivalent
            .as_ref()
            .map_or(0.0, |equivalent| equivalent.compute(state, &self.surface));

        let u = saturate(
            u_eq - gain * switch_method.apply(sigma, boundary_layer) - alpha * sigma,
            self.max_force,
        );

        let in_dead_zone = sigma.abs() <= dead_zone;
        let drive = if in_dead_zone { 0.0 } else { self.gamma * sigma.abs() };
        let rate = (drive - leak_rate * gain).clamp(-adapt_rate_limit, adapt_rate_limit);
        let next_gain = finite_or(gain + rate * self.dt, gain).clamp(k_min, k_max);
        let time_in_sliding = if in_dead_zone {
            finite_or(internal.time_in_sliding, 0.0) + self.dt
        } else {
            0.0
        };

        history.record(Series::Sigma, sigma);
        history.record(Series::Control, u);
        history.record(Series::Gain, next_gain);
        history.record(Series::GainRate, rate);

        ControlOutput {
            u,
            state: AdaptiveState {
                gain: next_gain,
                last_u: u,
                time_in_sliding,
            },
            history,
            sigma,
        }
    }
}
