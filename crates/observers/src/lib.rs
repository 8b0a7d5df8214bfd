//! Reusable observers for closed-loop pendulum simulations.
//!
//! This crate provides [`Observer`] implementations and the capability traits
//! they are written against, so they work with any event that exposes a
//! pendulum state.
//!
//! # Modules
//!
//! - [`traits`]: Capability traits ([`HasState`], [`HasControl`],
//!   [`CanStopEarly`])
//!
//! # Observers
//!
//! - [`EnergyDriftMonitor`] tracks the largest relative drift of a
//!   user-supplied energy function.
//! - [`DivergenceGuard`] stops a run once the pendulum leaves a bounded
//!   region or the state turns non-finite.
//!
//! [`Observer`]: dip_core::Observer
//! [`HasState`]: traits::HasState
//! [`HasControl`]: traits::HasControl
//! [`CanStopEarly`]: traits::CanStopEarly

mod divergence;
mod energy;
pub mod traits;

pub use divergence::DivergenceGuard;
pub use energy::EnergyDriftMonitor;
