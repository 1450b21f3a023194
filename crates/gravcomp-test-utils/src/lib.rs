//! Shared test fixtures and utilities for gravcomp crates.
//!
//! Provides robot descriptions, parameter store and simulated hardware
//! builders, and mock dynamics models that record what a controller feeds
//! them.

pub mod hardware;
pub mod mocks;
pub mod params;
pub mod urdf;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use hardware::{hardware, set_states};
pub use mocks::{MockLoader, MockModel};
pub use params::{GRAVCOMP_TYPE, controller_params, managed_controller_params};
pub use urdf::{ARM_URDF, PENDULUM_COM, PENDULUM_MASS, PENDULUM_URDF};
