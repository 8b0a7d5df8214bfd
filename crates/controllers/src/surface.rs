use dip_core::State;

/// Linear sliding surface over the link angles and rates:
/// `σ = k1·θ̇1 + λ1·θ1 + k2·θ̇2 + λ2·θ2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlidingSurface {
    pub k1: f64,
    pub lambda1: f64,
    pub k2: f64,
    pub lambda2: f64,
}

impl Default for SlidingSurface {
    fn default() -> Self {
        Self {
            k1: 5.0,
            lambda1: 5.0,
            k2: 3.0,
            lambda2: 3.0,
        }
    }
}

impl SlidingSurface {
    #[must_use]
    pub fn new(k1: f64, lambda1: f64, k2: f64, lambda2: f64) -> Self {
        Self {
            k1,
            lambda1,
            k2,
            lambda2,
        }
    }

    #[must_use]
    pub fn value(&self, state: &State) -> f64 {
        self.k1 * state.theta1_dot()
            + self.lambda1 * state.theta1()
            + self.k2 * state.theta2_dot()
            + self.lambda2 * state.theta2()
    }

    /// The part of `σ̇` that does not depend on the accelerations,
    /// `λ1·θ̇1 + λ2·θ̇2`.
    #[must_use]
    pub fn rate_terms(&self, state: &State) -> f64 {
        self.lambda1 * state.theta1_dot() + self.lambda2 * state.theta2_dot()
    }
}
