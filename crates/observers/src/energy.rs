use std::fmt;

use dip_core::{Observer, State};
use tracing::debug;

use crate::traits::{CanStopEarly, HasState};

/// Energies smaller than this are treated as this value when normalizing.
const ENERGY_FLOOR: f64 = 1e-12;

/// Tracks the largest relative drift of an energy function along a run.
///
/// The first observed event fixes the reference energy `E0`; every later event
/// updates `max |E − E0| / |E0|`. With a [`limit`](Self::with_limit) set, the
/// monitor stops the run as soon as the drift exceeds it.
///
/// The energy function is supplied by the caller, typically a closure over
/// the dynamics model's `total_energy`.
pub struct EnergyDriftMonitor<F> {
    energy: F,
    limit: Option<f64>,
    reference: Option<f64>,
    max_drift: f64,
    exceeded_at: Option<usize>,
}

impl<F: Fn(&State) -> f64> EnergyDriftMonitor<F> {
    #[must_use]
    pub fn new(energy: F) -> Self {
        Self {
            energy,
            limit: None,
            reference: None,
            max_drift: 0.0,
            exceeded_at: None,
        }
    }

    /// Stops the run once the relative drift exceeds `limit`.
    #[must_use]
    pub fn with_limit(self, limit: f64) -> Self {
        Self {
            limit: Some(limit),
            ..self
        }
    }

    /// The energy at the first observed event.
    #[must_use]
    pub fn reference(&self) -> Option<f64> {
        self.reference
    }

    /// Largest relative drift seen so far; infinite once the energy has
    /// turned non-finite.
    #[must_use]
    pub fn max_drift(&self) -> f64 {
        self.max_drift
    }

    /// Step at which the limit was first exceeded.
    #[must_use]
    pub fn exceeded_at(&self) -> Option<usize> {
        self.exceeded_at
    }

    fn record(&mut self, step: usize, energy: f64) -> bool {
        let Some(reference) = self.reference else {
            self.reference = Some(energy);
            return false;
        };

        let drift = if energy.is_finite() {
            (energy - reference).abs() / reference.abs().max(ENERGY_FLOOR)
        } else {
            f64::INFINITY
        };
        self.max_drift = self.max_drift.max(drift);

        match self.limit {
            Some(limit) if drift > limit && self.exceeded_at.is_none() => {
                debug!(step, drift, limit, "energy drift limit exceeded");
                self.exceeded_at = Some(step);
                true
            }
            _ => false,
        }
    }
}

impl<F, E, A> Observer<E, A> for EnergyDriftMonitor<F>
where
    F: Fn(&State) -> f64,
    E: HasState,
    A: CanStopEarly,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        let energy = (self.energy)(event.state());
        self.record(event.step(), energy).then(A::stop_early)
    }
}

impl<F> fmt::Debug for EnergyDriftMonitor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnergyDriftMonitor")
            .field("limit", &self.limit)
            .field("reference", &self.reference)
            .field("max_drift", &self.max_drift)
            .field("exceeded_at", &self.exceeded_at)
            .finish_non_exhaustive()
    }
}
