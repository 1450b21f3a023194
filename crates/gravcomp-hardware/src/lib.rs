//! Hardware abstraction for gravcomp controllers.
//!
//! Joints are exposed through two interfaces: [`JointStateInterface`]
//! (read-only position, velocity and effort) and [`EffortJointInterface`]
//! (state plus an effort command). Handles share lock-free slots with the
//! hardware driver.

pub mod error;
pub mod handle;
pub mod interface;
pub mod robot;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use error::HardwareInterfaceError;
pub use handle::{JointHandle, JointSlot, JointStateHandle};
pub use interface::{EffortJointInterface, JointStateInterface};
pub use robot::{RobotHardware, RobotHw};
