//! Simulation drivers that close the loop between a controller and the
//! pendulum dynamics.
//!
//! - [`closed_loop`] runs one controller against one dynamics model,
//!   emitting an event per step to an observer.
//! - [`batch`] runs many independent configurations with the same semantics.

pub mod batch;
pub mod closed_loop;
