//! URDF parsing and robot description types for gravcomp.
//!
//! Provides the in-memory representation of a robot's kinematic tree, a
//! parser on top of `urdf-rs`, and resolution of `package://` resources.

pub mod error;
pub mod parser;
pub mod resource;
pub mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use error::UrdfError;
pub use parser::{parse_file, parse_string, parse_string_with};
pub use resource::{LocalResourceRetriever, PackageResourceRetriever, ResourceRetriever};
pub use types::{
    Geometry, Inertial, JointData, JointDynamics, JointLimits, JointType, LinkData, Origin,
    RobotModel,
};
