use std::fmt;

use dip_core::State;
use dip_dynamics::Regularizer;
use nalgebra::Vector3;
use tracing::debug;

use crate::{SharedPhysics, SlidingSurface};

/// Control that holds the state on the sliding surface under the nominal
/// dynamics.
///
/// Setting `σ̇ = 0` with `σ = L·q̇ + λ·θ`, `L = [0, k1, k2]`, and
/// `H·q̈ = B·u − c − G`, `B = e₁`, gives
///
/// ```text
/// u_eq = (L·H⁻¹·B)⁻¹ · (L·H⁻¹·(c + G) − (λ1·θ̇1 + λ2·θ̇2))
/// ```
///
/// The result degrades to `0.0` when the inertia matrix is ill-conditioned,
/// the controllability scalar `L·H⁻¹·B` is too small, or the value is not
/// finite, and is otherwise clamped to `±limit`.
#[derive(Clone)]
pub struct EquivalentControl {
    physics: SharedPhysics,
    regularizer: Regularizer,
    max_condition_number: f64,
    min_controllability: f64,
    limit: f64,
}

impl fmt::Debug for EquivalentControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EquivalentControl")
            .field("regularizer", &self.regularizer)
            .field("max_condition_number", &self.max_condition_number)
            .field("min_controllability", &self.min_controllability)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl EquivalentControl {
    /// Creates an equivalent-control term clamped to twice `max_force`.
    #[must_use]
    pub fn new(physics: SharedPhysics, max_force: f64) -> Self {
        Self {
            physics,
            regularizer: Regularizer::Fixed(1e-10),
            max_condition_number: 1e8,
            min_controllability: 1e-12,
            limit: 2.0 * max_force,
        }
    }

    /// Replaces the regularization applied before inverting the inertia
    /// matrix.
    #[must_use]
    pub fn with_regularizer(self, regularizer: Regularizer) -> Self {
        Self {
            regularizer,
            ..self
        }
    }

    /// Condition number of the raw inertia matrix above which the term
    /// falls back to zero.
    #[must_use]
    pub fn with_max_condition_number(self, max_condition_number: f64) -> Self {
        Self {
            max_condition_number,
            ..self
        }
    }

    #[must_use]
    pub fn limit(&self) -> f64 {
        self.limit
    }

    #[must_use]
    pub fn compute(&self, state: &State, surface: &SlidingSurface) -> f64 {
        let matrices = self.physics.matrices(state);

        let regularized = match self.regularizer.regularize(&matrices.inertia) {
            Ok(regularized) => regularized,
            Err(error) => {
                debug!(%error, "equivalent control disabled");
                return 0.0;
            }
        };
        if regularized.original_condition_number() > self.max_condition_number {
            debug!(
                condition_number = regularized.original_condition_number(),
                "equivalent control disabled for ill-conditioned inertia"
            );
            return 0.0;
        }
        let Ok(inverse) = regularized.inverse() else {
            return 0.0;
        };

        let l = Vector3::new(0.0, surface.k1, surface.k2);
        let l_inv = inverse.transpose() * l;
        let controllability = l_inv[0];
        if controllability.abs() < self.min_controllability {
            debug!(controllability, "equivalent control disabled near singular input gain");
            return 0.0;
        }

        let drift = l_inv.dot(&(matrices.coriolis + matrices.gravity));
        let u_eq = (drift - surface.rate_terms(state)) / controllability;
        if u_eq.is_finite() {
            u_eq.clamp(-self.limit, self.limit)
        } else {
            0.0
        }
    }
}
