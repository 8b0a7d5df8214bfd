//! Core types for simulating and controlling a double inverted pendulum on a
//! cart.
//!
//! This crate defines the shared abstractions that the dynamics, controller,
//! and solver crates build on:
//!
//! - [`State`] and [`StateDerivative`]: the six-dimensional mechanical state
//!   `[x, θ1, θ2, ẋ, θ̇1, θ̇2]` and its time derivative
//! - [`StepIntegrable`]: stepping a state by `derivative * dt`
//! - [`PhysicsConfig`] and [`PhysicsParameters`]: raw and validated physical
//!   constants plus mass-matrix regularization knobs
//! - [`NumericalInstability`]: the error every numerical failure surfaces as
//! - [`Observer`]: receives solver events and optionally returns control actions
//!
//! # Features
//!
//! - `serde`: derives `Serialize`/`Deserialize` for [`State`] and
//!   [`PhysicsConfig`] so configuration loaders can build them.

mod error;
mod observer;
mod params;
mod state;
mod step;

pub use error::{NumericalInstability, ParamsError, Stage};
pub use observer::Observer;
pub use params::{PhysicsConfig, PhysicsParameters};
pub use state::{State, StateDerivative};
pub use step::{DerivativeOf, StepIntegrable};
