use dip_core::{NumericalInstability, PhysicsParameters};
use nalgebra::{Matrix3, Vector3};
use tracing::debug;

/// Tikhonov regularization for 3×3 inertia matrices.
///
/// The adaptive mode adds `max(alpha·σ_max, min_regularization)` to the
/// diagonal and scales that amount up in proportion to how far the estimated
/// condition number exceeds `max_condition_number`. The fixed mode always adds
/// the same constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Regularizer {
    Fixed(f64),
    Adaptive {
        alpha: f64,
        max_condition_number: f64,
        min_regularization: f64,
        condition_tol_factor: f64,
    },
}

impl Regularizer {
    /// Builds the regularizer described by validated physical parameters.
    #[must_use]
    pub fn from_params(params: &PhysicsParameters) -> Self {
        if params.use_fixed_regularization() {
            Self::Fixed(params.min_regularization())
        } else {
            Self::Adaptive {
                alpha: params.regularization_alpha(),
                max_condition_number: params.max_condition_number(),
                min_regularization: params.min_regularization(),
                condition_tol_factor: params.condition_tol_factor(),
            }
        }
    }

    /// Regularizes `matrix`.
    ///
    /// # Errors
    ///
    /// Returns [`NumericalInstability::NonFiniteMatrix`] if `matrix` has a
    /// non-finite entry, or [`NumericalInstability::IllConditioned`] if the
    /// regularized matrix has a non-finite or non-positive singular value.
    pub fn regularize(&self, matrix: &Matrix3<f64>) -> Result<Regularized, NumericalInstability> {
        if !matrix.iter().all(|value| value.is_finite()) {
            return Err(NumericalInstability::NonFiniteMatrix);
        }

        let (sigma_max, sigma_min) = extremes(&matrix.singular_values());

        let (regularization, condition_number) = match *self {
            Self::Fixed(regularization) => (regularization, condition(sigma_max, sigma_min)),
            Self::Adaptive {
                alpha,
                max_condition_number,
                min_regularization,
                condition_tol_factor,
            } => {
                let mut regularization = (alpha * sigma_max).max(min_regularization);
                let floor = sigma_min.max(condition_tol_factor * sigma_max);
                let estimate = condition(sigma_max, floor);
                if sigma_max > 0.0 && estimate > max_condition_number {
                    regularization *= estimate / max_condition_number;
                    debug!(
                        condition_number = estimate,
                        regularization, "escalated inertia matrix regularization"
                    );
                }
                (regularization, estimate)
            }
        };

        let regularized = matrix + Matrix3::identity() * regularization;
        let singular_values = if regularized.iter().all(|value| value.is_finite()) {
            regularized.singular_values()
        } else {
            Vector3::repeat(f64::NAN)
        };
        let (_, smallest) = extremes(&singular_values);
        if !singular_values.iter().all(|value| value.is_finite()) || smallest <= 0.0 {
            return Err(NumericalInstability::IllConditioned {
                smallest_singular_value: smallest,
            });
        }

        Ok(Regularized {
            matrix: regularized,
            regularization,
            condition_number,
            singular_values,
        })
    }
}

/// A regularized matrix that is guaranteed to have finite, strictly positive
/// singular values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regularized {
    matrix: Matrix3<f64>,
    regularization: f64,
    condition_number: f64,
    singular_values: Vector3<f64>,
}

impl Regularized {
    /// The regularized matrix `H + reg·I`.
    #[must_use]
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// The amount added to the diagonal.
    #[must_use]
    pub fn regularization(&self) -> f64 {
        self.regularization
    }

    /// Condition number estimate of the matrix before regularization.
    #[must_use]
    pub fn original_condition_number(&self) -> f64 {
        self.condition_number
    }

    /// Condition number of the regularized matrix.
    #[must_use]
    pub fn condition_number(&self) -> f64 {
        let (largest, smallest) = extremes(&self.singular_values);
        largest / smallest
    }

    /// Smallest singular value of the regularized matrix.
    #[must_use]
    pub fn smallest_singular_value(&self) -> f64 {
        extremes(&self.singular_values).1
    }

    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.matrix.determinant()
    }

    /// Solves `matrix · x = rhs`.
    ///
    /// # Errors
    ///
    /// Returns [`NumericalInstability::IllConditioned`] if the factorization
    /// fails or the solution is not finite.
    pub fn solve(&self, rhs: &Vector3<f64>) -> Result<Vector3<f64>, NumericalInstability> {
        self.matrix
            .lu()
            .solve(rhs)
            .filter(|x| x.iter().all(|value| value.is_finite()))
            .ok_or(NumericalInstability::IllConditioned {
                smallest_singular_value: self.smallest_singular_value(),
            })
    }

    /// Returns the inverse of the regularized matrix.
    ///
    /// # Errors
    ///
    /// Returns [`NumericalInstability::IllConditioned`] if inversion fails.
    pub fn inverse(&self) -> Result<Matrix3<f64>, NumericalInstability> {
        self.matrix
            .try_inverse()
            .filter(|inverse| inverse.iter().all(|value| value.is_finite()))
            .ok_or(NumericalInstability::IllConditioned {
                smallest_singular_value: self.smallest_singular_value(),
            })
    }
}

fn extremes(values: &Vector3<f64>) -> (f64, f64) {
    values
        .iter()
        .fold((f64::NEG_INFINITY, f64::INFINITY), |(max, min), &v| {
            (max.max(v), min.min(v))
        })
}

fn condition(largest: f64, smallest: f64) -> f64 {
    if smallest > 0.0 {
        largest / smallest
    } else {
        f64::INFINITY
    }
}
