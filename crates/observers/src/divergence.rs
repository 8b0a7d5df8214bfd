use dip_core::{Observer, State};
use tracing::debug;

use crate::traits::{CanStopEarly, HasState};

/// Stops a run once the pendulum leaves a bounded region.
///
/// A state diverges when it is non-finite, when either link angle exceeds
/// `max_angle` in magnitude, or when the cart position exceeds `max_cart`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DivergenceGuard {
    max_angle: f64,
    max_cart: f64,
    tripped_at: Option<(usize, f64)>,
}

impl DivergenceGuard {
    #[must_use]
    pub fn new(max_angle: f64, max_cart: f64) -> Self {
        Self {
            max_angle,
            max_cart,
            tripped_at: None,
        }
    }

    /// Whether `state` lies outside the allowed region.
    #[must_use]
    pub fn diverged(&self, state: &State) -> bool {
        !state.is_finite()
            || state.theta1().abs() > self.max_angle
            || state.theta2().abs() > self.max_angle
            || state.x().abs() > self.max_cart
    }

    /// Step and time at which the guard first tripped.
    #[must_use]
    pub fn tripped_at(&self) -> Option<(usize, f64)> {
        self.tripped_at
    }
}

/// Angles within ±π/2 and the cart within ±5 m.
impl Default for DivergenceGuard {
    fn default() -> Self {
        Self::new(std::f64::consts::FRAC_PI_2, 5.0)
    }
}

impl<E: HasState, A: CanStopEarly> Observer<E, A> for DivergenceGuard {
    fn observe(&mut self, event: &E) -> Option<A> {
        if !self.diverged(event.state()) {
            return None;
        }
        if self.tripped_at.is_none() {
            debug!(step = event.step(), time = event.time(), "pendulum diverged");
            self.tripped_at = Some((event.step(), event.time()));
        }
        Some(A::stop_early())
    }
}
