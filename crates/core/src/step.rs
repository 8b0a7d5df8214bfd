/// A trait for types that can be stepped using their derivative.
///
/// Implementing this trait lets the integration schemes advance a value by
/// `derivative * delta`, where the derivative is taken with respect to
/// `Delta`. For the pendulum, `Delta` is time in seconds and the derivative of
/// a [`State`](crate::State) is a [`StateDerivative`](crate::StateDerivative).
pub trait StepIntegrable<Delta> {
    /// The derivative of the type with respect to `Delta`.
    type Derivative;

    /// Returns the value after stepping with a derivative and step size.
    #[must_use]
    fn step(&self, derivative: Self::Derivative, delta: Delta) -> Self;
}

/// Type alias for the derivative of a `StepIntegrable` type.
pub type DerivativeOf<T, Delta> = <T as StepIntegrable<Delta>>::Derivative;

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    // Single link angle driven by a constant angular rate.
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Angle(f64);
    struct AngularRate(f64);

    impl StepIntegrable<f64> for Angle {
        type Derivative = AngularRate;

        fn step(&self, derivative: AngularRate, dt: f64) -> Self {
            Angle(self.0 + derivative.0 * dt)
        }
    }

    fn advance<T: StepIntegrable<f64> + Copy>(
        value: T,
        rate: impl Fn() -> DerivativeOf<T, f64>,
        dt: f64,
        steps: usize,
    ) -> T {
        (0..steps).fold(value, |current, _| current.step(rate(), dt))
    }

    #[test]
    fn repeated_steps_accumulate() {
        let angle = advance(Angle(0.1), || AngularRate(-0.5), 0.01, 20);

        assert_relative_eq!(angle.0, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_step_leaves_value_unchanged() {
        let angle = Angle(0.3).step(AngularRate(100.0), 0.0);

        assert_eq!(angle, Angle(0.3));
    }
}
