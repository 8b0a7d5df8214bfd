//! Sliding-mode controllers for the double inverted pendulum.
//!
//! Four variants share the [`SlidingModeController`] contract:
//!
//! - [`ClassicalSmc`]: boundary-layer switching plus linear damping
//! - [`SuperTwistingSmc`]: second-order super-twisting algorithm
//! - [`AdaptiveSmc`]: switching gain adapted by a leaky integrator
//! - [`HybridAdaptiveStaSmc`]: super-twisting with two adaptive gains,
//!   tapering, saturation-aware freezing, and gain leak
//!
//! Controllers are immutable after construction. Everything that evolves from
//! step to step (adaptive gains, integral terms) is returned from
//! [`SlidingModeController::compute_control`] and handed back on the next
//! call, so callers can snapshot and restore a run at any point. Diagnostic
//! series accumulate in a caller-owned [`History`].
//!
//! [`ControllerKind`] and [`AnyController`] provide a closed registry of the
//! variants for configuration-driven construction.

mod adaptive;
mod classical;
mod controller;
mod equivalent;
mod error;
mod history;
mod hybrid;
mod registry;
mod super_twisting;
mod surface;
mod switching;

pub use adaptive::{AdaptiveOptions, AdaptiveSmc, AdaptiveState};
pub use classical::{ClassicalOptions, ClassicalSmc};
pub use controller::{ControlOutput, SlidingModeController};
pub use equivalent::EquivalentControl;
pub use error::ConfigError;
pub use history::{History, Series};
pub use hybrid::{HybridAdaptiveStaSmc, HybridOptions, HybridState};
pub use registry::{AnyController, AnyState, ControllerKind, ControllerSpec};
pub use super_twisting::{SuperTwistingOptions, SuperTwistingSmc, SuperTwistingState};
pub use surface::SlidingSurface;
pub use switching::SwitchMethod;

/// Shared, read-only access to a model's physics terms.
pub type SharedPhysics = std::sync::Arc<dyn dip_dynamics::PhysicsMatrices + Send + Sync>;
