/// Continuous approximation of `sign(σ)` inside a boundary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum SwitchMethod {
    /// `tanh(σ/ε)`
    #[default]
    Tanh,
    /// `clamp(σ/ε, −1, 1)`
    Linear,
}

impl SwitchMethod {
    /// Evaluates the switching function for a boundary layer `epsilon > 0`.
    #[must_use]
    pub fn apply(self, sigma: f64, epsilon: f64) -> f64 {
        let ratio = sigma / epsilon;
        match self {
            Self::Tanh => ratio.tanh(),
            Self::Linear => ratio.clamp(-1.0, 1.0),
        }
    }
}
