use dip_core::{NumericalInstability, Stage, State, StateDerivative, StepIntegrable};
use tracing::{debug, trace};

use super::{Integrator, evaluate, finite};
use crate::ConfigError;

// Dormand–Prince 5(4) tableau.
const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// Fifth-order weights (also the last row of the tableau).
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Fifth-order minus embedded fourth-order weights.
const E1: f64 = B1 - 5179.0 / 57600.0;
const E3: f64 = B3 - 7571.0 / 16695.0;
const E4: f64 = B4 - 393.0 / 640.0;
const E5: f64 = B5 - (-92097.0 / 339_200.0);
const E6: f64 = B6 - 187.0 / 2100.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

/// Tolerances and step bounds for [`DormandPrince`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DormandPrinceConfig {
    abs_tol: f64,
    rel_tol: f64,
    min_dt: f64,
    max_dt: f64,
    max_retries: usize,
}

impl Default for DormandPrinceConfig {
    fn default() -> Self {
        Self {
            abs_tol: 1e-6,
            rel_tol: 1e-3,
            min_dt: 1e-5,
            max_dt: 0.05,
            max_retries: 10,
        }
    }
}

impl DormandPrinceConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `abs_tol` is not positive, `rel_tol` is negative,
    /// the step bounds are not `0 < min_dt <= max_dt`, or `max_retries` is 0.
    pub fn new(
        abs_tol: f64,
        rel_tol: f64,
        min_dt: f64,
        max_dt: f64,
        max_retries: usize,
    ) -> Result<Self, ConfigError> {
        if !abs_tol.is_finite() || abs_tol <= 0.0 {
            return Err(ConfigError::AbsTol);
        }
        if !rel_tol.is_finite() || rel_tol < 0.0 {
            return Err(ConfigError::RelTol);
        }
        if !(min_dt.is_finite() && max_dt.is_finite() && min_dt > 0.0 && min_dt <= max_dt) {
            return Err(ConfigError::StepBounds { min_dt, max_dt });
        }
        if max_retries == 0 {
            return Err(ConfigError::Retries);
        }

        Ok(Self {
            abs_tol,
            rel_tol,
            min_dt,
            max_dt,
            max_retries,
        })
    }

    #[must_use]
    pub fn abs_tol(&self) -> f64 {
        self.abs_tol
    }

    #[must_use]
    pub fn rel_tol(&self) -> f64 {
        self.rel_tol
    }

    #[must_use]
    pub fn min_dt(&self) -> f64 {
        self.min_dt
    }

    #[must_use]
    pub fn max_dt(&self) -> f64 {
        self.max_dt
    }

    /// Rejections allowed per accepted sub-step.
    #[must_use]
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }
}

/// Adaptive Dormand–Prince 5(4) integrator.
///
/// A call to [`integrate`](Integrator::integrate) always advances the full
/// requested `dt`, chaining as many accepted sub-steps as the local error
/// estimate allows. The sub-step size estimate and the integrated time carry
/// over between calls; [`reset`](Integrator::reset) clears both.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DormandPrince {
    config: DormandPrinceConfig,
    next_dt: Option<f64>,
    time: f64,
}

struct Attempt {
    state: State,
    error_ratio: f64,
}

impl DormandPrince {
    #[must_use]
    pub fn new(config: DormandPrinceConfig) -> Self {
        Self {
            config,
            next_dt: None,
            time: 0.0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DormandPrinceConfig {
        &self.config
    }

    /// Total time advanced by accepted sub-steps since the last reset.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Sub-step size the next call will try first, if one has been accepted.
    #[must_use]
    pub fn next_dt(&self) -> Option<f64> {
        self.next_dt
    }

    fn attempt<F>(&self, rhs: &F, y: &State, h: f64) -> Result<Attempt, NumericalInstability>
    where
        F: Fn(&State) -> Result<StateDerivative, NumericalInstability>,
    {
        let k1 = evaluate(rhs, y, Stage::Integrator(1))?;
        let k2 = evaluate(rhs, &y.step(k1 * A21, h), Stage::Integrator(2))?;
        let k3 = evaluate(rhs, &y.step(k1 * A31 + k2 * A32, h), Stage::Integrator(3))?;
        let k4 = evaluate(
            rhs,
            &y.step(k1 * A41 + k2 * A42 + k3 * A43, h),
            Stage::Integrator(4),
        )?;
        let k5 = evaluate(
            rhs,
            &y.step(k1 * A51 + k2 * A52 + k3 * A53 + k4 * A54, h),
            Stage::Integrator(5),
        )?;
        let k6 = evaluate(
            rhs,
            &y.step(k1 * A61 + k2 * A62 + k3 * A63 + k4 * A64 + k5 * A65, h),
            Stage::Integrator(6),
        )?;
        let next = y.step(k1 * B1 + k3 * B3 + k4 * B4 + k5 * B5 + k6 * B6, h);
        let k7 = evaluate(rhs, &next, Stage::Integrator(7))?;

        let error = (k1 * E1 + k3 * E3 + k4 * E4 + k5 * E5 + k6 * E6 + k7 * E7) * h;
        let error_ratio = error
            .as_vector()
            .iter()
            .zip(y.as_vector().iter().zip(next.as_vector().iter()))
            .map(|(e, (a, b))| e.abs() / (self.config.abs_tol + self.config.rel_tol * a.abs().max(b.abs())))
            .fold(0.0, f64::max);
        if !error_ratio.is_finite() {
            return Err(NumericalInstability::NonFinite(Stage::ErrorEstimate));
        }

        Ok(Attempt {
            state: finite(next)?,
            error_ratio,
        })
    }

    fn scale(error_ratio: f64) -> f64 {
        if error_ratio == 0.0 {
            MAX_FACTOR
        } else {
            (SAFETY * error_ratio.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
        }
    }
}

impl Integrator for DormandPrince {
    fn integrate<F>(&mut self, rhs: F, state: &State, dt: f64) -> Result<State, NumericalInstability>
    where
        F: Fn(&State) -> Result<StateDerivative, NumericalInstability>,
    {
        let DormandPrinceConfig {
            min_dt,
            max_dt,
            max_retries,
            ..
        } = self.config;

        let mut y = *state;
        let mut remaining = dt;
        let mut h = self.next_dt.unwrap_or(dt).clamp(min_dt, max_dt);

        while remaining > dt * 1e-12 {
            let mut rejections = 0;
            loop {
                let truncated = h >= remaining;
                let h_try = if truncated { remaining } else { h };
                let attempt = self.attempt(&rhs, &y, h_try)?;
                let proposed = (h_try * Self::scale(attempt.error_ratio)).clamp(min_dt, max_dt);

                if attempt.error_ratio <= 1.0 {
                    trace!(dt = h_try, error_ratio = attempt.error_ratio, "accepted sub-step");
                    y = attempt.state;
                    remaining -= h_try;
                    self.time += h_try;
                    h = if truncated { h.max(proposed) } else { proposed };
                    break;
                }

                rejections += 1;
                debug!(
                    dt = h_try,
                    error_ratio = attempt.error_ratio,
                    rejections,
                    "rejected sub-step"
                );
                if rejections >= max_retries {
                    return Err(NumericalInstability::RetryBudgetExhausted {
                        retries: rejections,
                        error_ratio: attempt.error_ratio,
                        dt: h_try,
                    });
                }
                h = proposed.min(h_try);
            }
        }

        self.next_dt = Some(h);
        Ok(y)
    }

    fn reset(&mut self) {
        self.next_dt = None;
        self.time = 0.0;
    }
}
