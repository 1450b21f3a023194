//! Rigid-body dynamics for gravcomp.
//!
//! Turns a parsed robot description into a fixed-base [`Skeleton`] and
//! evaluates its inverse dynamics with the recursive Newton–Euler algorithm.
//! Controllers depend only on the [`DynamicsModel`] and [`ModelLoader`]
//! traits, so another engine can be slotted in behind them.

pub mod error;
pub mod group;
pub mod model;
mod rnea;
pub mod skeleton;
pub mod spatial;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use error::DynamicsError;
pub use group::DofGroup;
pub use model::{DofIndex, DofState, DynamicsModel, ModelLoader};
pub use skeleton::{STANDARD_GRAVITY, Skeleton, UrdfModelLoader};
