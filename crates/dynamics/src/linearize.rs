//! Linearization and controllability/observability analysis.

use dip_core::{NumericalInstability, State};
use nalgebra::{DMatrix, Matrix6, Vector6};

use crate::EquationsOfMotion;

const PERTURBATION: f64 = 1e-6;
const RANK_TOLERANCE: f64 = 1e-12;

/// Central-difference Jacobians of `ẋ = f(x, u)` about `(state, u)`.
///
/// Returns `(A, B)` with `A = ∂f/∂x` (6×6) and `B = ∂f/∂u` (6).
///
/// # Errors
///
/// Returns an error if the equations fail at any perturbed point.
pub fn linearize<E: EquationsOfMotion + ?Sized>(
    equations: &E,
    state: &State,
    u: f64,
) -> Result<(Matrix6<f64>, Vector6<f64>), NumericalInstability> {
    let f = |x: Vector6<f64>, u: f64| {
        equations
            .derivative(&State::from(x), u)
            .map(|d| *d.as_vector())
    };
    let x0 = *state.as_vector();

    let mut a = Matrix6::zeros();
    for j in 0..6 {
        let h = PERTURBATION * x0[j].abs().max(1.0);
        let mut plus = x0;
        let mut minus = x0;
        plus[j] += h;
        minus[j] -= h;
        a.set_column(j, &((f(plus, u)? - f(minus, u)?) / (2.0 * h)));
    }

    let h = PERTURBATION * u.abs().max(1.0);
    let b = (f(x0, u + h)? - f(x0, u - h)?) / (2.0 * h);

    Ok((a, b))
}

/// Kalman controllability matrix `[B, AB, A²B, …, A⁵B]`.
#[must_use]
pub fn controllability_matrix(a: &Matrix6<f64>, b: &Vector6<f64>) -> Matrix6<f64> {
    let mut matrix = Matrix6::zeros();
    let mut column = *b;
    for j in 0..6 {
        matrix.set_column(j, &column);
        column = a * column;
    }
    matrix
}

/// Observability matrix `[C; CA; …; CA⁵]` for an output matrix `C` with six
/// columns.
///
/// # Panics
///
/// Panics if `c` does not have six columns.
#[must_use]
pub fn observability_matrix(a: &Matrix6<f64>, c: &DMatrix<f64>) -> DMatrix<f64> {
    assert_eq!(c.ncols(), 6, "output matrix must have six columns");
    let rows = c.nrows();
    let a = DMatrix::from_column_slice(6, 6, a.as_slice());

    let mut matrix = DMatrix::zeros(rows * 6, 6);
    let mut block = c.clone();
    for k in 0..6 {
        matrix.view_mut((k * rows, 0), (rows, 6)).copy_from(&block);
        block = &block * &a;
    }
    matrix
}

/// Returns `true` if the pair `(A, B)` is controllable.
#[must_use]
pub fn is_controllable(a: &Matrix6<f64>, b: &Vector6<f64>) -> bool {
    let matrix = controllability_matrix(a, b);
    numerical_rank(&DMatrix::from_column_slice(6, 6, matrix.as_slice())) == 6
}

/// Returns `true` if the pair `(A, C)` is observable.
#[must_use]
pub fn is_observable(a: &Matrix6<f64>, c: &DMatrix<f64>) -> bool {
    numerical_rank(&observability_matrix(a, c)) == 6
}

/// Rank with a tolerance relative to the largest singular value.
fn numerical_rank(matrix: &DMatrix<f64>) -> usize {
    let singular_values = matrix.singular_values();
    let largest = singular_values.iter().copied().fold(0.0, f64::max);
    if largest == 0.0 || !largest.is_finite() {
        return 0;
    }
    singular_values
        .iter()
        .filter(|&&value| value > RANK_TOLERANCE * largest)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use dip_core::PhysicsParameters;

    use crate::SimplifiedDynamics;

    fn upright() -> (Matrix6<f64>, Vector6<f64>) {
        let model = SimplifiedDynamics::new(PhysicsParameters::default());
        linearize(&model, &State::upright(), 0.0).unwrap()
    }

    #[test]
    fn position_rows_are_velocity_identity() {
        let (a, b) = upright();

        for i in 0..3 {
            for j in 0..6 {
                let expected = if j == i + 3 { 1.0 } else { 0.0 };
                assert_relative_eq!(a[(i, j)], expected, epsilon = 1e-6);
            }
            assert_relative_eq!(b[i], 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn force_pushes_cart_and_lower_link() {
        let (_, b) = upright();

        assert!(b[3] > 0.0);
        assert!(b[4] > 0.0);
    }

    #[test]
    fn upright_equilibrium_is_unstable() {
        let (a, _) = upright();

        let eigenvalues = a.complex_eigenvalues();
        assert!(eigenvalues.iter().any(|lambda| lambda.re > 1.0));
    }

    #[test]
    fn upright_equilibrium_is_controllable() {
        let (a, b) = upright();

        assert!(is_controllable(&a, &b));
        assert!(!is_controllable(&a, &Vector6::zeros()));
    }

    #[test]
    fn cart_and_angle_measurements_make_system_observable() {
        let (a, _) = upright();
        let mut c = DMatrix::zeros(3, 6);
        c[(0, 0)] = 1.0;
        c[(1, 1)] = 1.0;
        c[(2, 2)] = 1.0;

        assert!(is_observable(&a, &c));
        assert_eq!(observability_matrix(&a, &c).nrows(), 18);
    }
}
