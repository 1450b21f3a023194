//! Real-time effort controllers for gravcomp.
//!
//! [`GravityCompensationController`] drives a set of joints with the torques
//! that cancel gravity at their sensed state. Controllers are created by type
//! name through a [`ControllerRegistry`] and driven by a
//! [`ControllerManager`].

pub mod controller;
pub mod error;
pub mod gravity_compensation;
pub mod manager;
pub mod registry;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use controller::Controller;
pub use error::ControllerError;
pub use gravity_compensation::GravityCompensationController;
pub use manager::ControllerManager;
pub use registry::{ControllerFactory, ControllerRegistry};
