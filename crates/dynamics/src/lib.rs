//! Dynamics engine for a double inverted pendulum on a cart.
//!
//! The engine is assembled from three layers:
//!
//! - [`MassMatrixSolver`] builds the inertia matrix, Coriolis/friction terms,
//!   and gravity vector, and inverts the inertia matrix through a
//!   [`Regularizer`] that never returns non-finite results.
//! - [`SimplifiedDynamics`] and [`FullDynamics`] implement
//!   [`EquationsOfMotion`] at two fidelity levels.
//! - [`DynamicsModel`] pairs a set of equations with an
//!   [`IntegrationScheme`] (fixed RK4, adaptive Dormand–Prince, or
//!   velocity Verlet) behind the [`Dynamics`] stepping contract.
//!
//! Every numerical failure is reported as a
//! [`NumericalInstability`](dip_core::NumericalInstability).

mod equations;
mod error;
mod full;
pub mod integrator;
pub mod linearize;
mod matrices;
mod model;
mod regularization;
mod simplified;

pub use equations::{EquationsOfMotion, PhysicsMatrices};
pub use error::ConfigError;
pub use full::{FullDynamics, SingularityCheck};
pub use integrator::{IntegrationScheme, Integrator};
pub use matrices::{MassMatrixSolver, Matrices};
pub use model::{Dynamics, DynamicsModel};
pub use regularization::{Regularized, Regularizer};
pub use simplified::SimplifiedDynamics;
