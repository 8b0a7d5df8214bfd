use std::ops::{Add, Mul};

use nalgebra::{Vector3, Vector6};

use crate::StepIntegrable;

/// Mechanical state of the cart and both links.
///
/// Components are ordered `[x, θ1, θ2, ẋ, θ̇1, θ̇2]`. Angles are absolute and
/// measured counter-clockwise from the upright vertical, so the zero state is
/// the unstable upright equilibrium.
///
/// States are replaced wholesale by the integrators and never partially
/// updated in place.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "[f64; 6]", into = "[f64; 6]")
)]
pub struct State(Vector6<f64>);

impl State {
    /// Creates a state from its six components.
    #[must_use]
    pub fn new(
        x: f64,
        theta1: f64,
        theta2: f64,
        x_dot: f64,
        theta1_dot: f64,
        theta2_dot: f64,
    ) -> Self {
        Self(Vector6::new(x, theta1, theta2, x_dot, theta1_dot, theta2_dot))
    }

    /// The upright equilibrium with the cart at rest at the origin.
    #[must_use]
    pub fn upright() -> Self {
        Self(Vector6::zeros())
    }

    /// Creates a state from generalized coordinates and their velocities.
    #[must_use]
    pub fn from_parts(positions: Vector3<f64>, velocities: Vector3<f64>) -> Self {
        Self(Vector6::new(
            positions[0],
            positions[1],
            positions[2],
            velocities[0],
            velocities[1],
            velocities[2],
        ))
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.0[0]
    }

    #[must_use]
    pub fn theta1(&self) -> f64 {
        self.0[1]
    }

    #[must_use]
    pub fn theta2(&self) -> f64 {
        self.0[2]
    }

    #[must_use]
    pub fn x_dot(&self) -> f64 {
        self.0[3]
    }

    #[must_use]
    pub fn theta1_dot(&self) -> f64 {
        self.0[4]
    }

    #[must_use]
    pub fn theta2_dot(&self) -> f64 {
        self.0[5]
    }

    /// Generalized coordinates `q = [x, θ1, θ2]`.
    #[must_use]
    pub fn positions(&self) -> Vector3<f64> {
        Vector3::new(self.0[0], self.0[1], self.0[2])
    }

    /// Generalized velocities `q̇ = [ẋ, θ̇1, θ̇2]`.
    #[must_use]
    pub fn velocities(&self) -> Vector3<f64> {
        Vector3::new(self.0[3], self.0[4], self.0[5])
    }

    /// Returns the underlying vector.
    #[must_use]
    pub fn as_vector(&self) -> &Vector6<f64> {
        &self.0
    }

    /// Returns `true` if every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|value| value.is_finite())
    }

    /// Largest absolute component, used for error scaling.
    #[must_use]
    pub fn max_abs(&self) -> f64 {
        self.0.iter().fold(0.0, |acc: f64, value| acc.max(value.abs()))
    }
}

impl From<Vector6<f64>> for State {
    fn from(vector: Vector6<f64>) -> Self {
        Self(vector)
    }
}

impl From<[f64; 6]> for State {
    fn from(values: [f64; 6]) -> Self {
        Self(Vector6::from(values))
    }
}

impl From<State> for [f64; 6] {
    fn from(state: State) -> Self {
        state.0.into()
    }
}

/// Time derivative of a [`State`]: `[ẋ, θ̇1, θ̇2, ẍ, θ̈1, θ̈2]`.
///
/// Derivatives form a vector space so multi-stage integrators can combine
/// them with `+` and scalar `*`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateDerivative(Vector6<f64>);

impl StateDerivative {
    /// Builds a derivative from velocities and accelerations.
    #[must_use]
    pub fn from_parts(velocities: Vector3<f64>, accelerations: Vector3<f64>) -> Self {
        Self(Vector6::new(
            velocities[0],
            velocities[1],
            velocities[2],
            accelerations[0],
            accelerations[1],
            accelerations[2],
        ))
    }

    /// Generalized accelerations `q̈`.
    #[must_use]
    pub fn accelerations(&self) -> Vector3<f64> {
        Vector3::new(self.0[3], self.0[4], self.0[5])
    }

    #[must_use]
    pub fn as_vector(&self) -> &Vector6<f64> {
        &self.0
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|value| value.is_finite())
    }
}

impl From<Vector6<f64>> for StateDerivative {
    fn from(vector: Vector6<f64>) -> Self {
        Self(vector)
    }
}

impl Add for StateDerivative {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<f64> for StateDerivative {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self(self.0 * rhs)
    }
}

impl StepIntegrable<f64> for State {
    type Derivative = StateDerivative;

    fn step(&self, derivative: StateDerivative, dt: f64) -> Self {
        Self(self.0 + derivative.0 * dt)
    }
}
