//! In-memory robot description.
//!
//! These types are the crate's canonical representation of a robot
//! description, independent of the XML parsing layer. Only what the dynamics
//! model and resource resolution need is kept: kinematic tree, inertia, joint
//! limits and referenced mesh resources. Values stay in `f64`.

use std::collections::HashMap;

use crate::error::UrdfError;

// ---------------------------------------------------------------------------
// JointType
// ---------------------------------------------------------------------------

/// URDF joint type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointType {
    /// Rotation about a single axis, with position limits.
    Revolute,
    /// Unlimited rotation about a single axis.
    Continuous,
    /// Translation along an axis, with position limits.
    Prismatic,
    /// No relative motion between parent and child.
    Fixed,
    /// Unconstrained 6-DOF joint.
    Floating,
    /// Motion in a plane.
    Planar,
}

impl JointType {
    /// Whether this joint type contributes exactly one degree of freedom.
    pub const fn is_single_dof(self) -> bool {
        matches!(self, Self::Revolute | Self::Continuous | Self::Prismatic)
    }

    /// Whether motion along the axis is rotational.
    pub const fn is_rotational(self) -> bool {
        matches!(self, Self::Revolute | Self::Continuous)
    }

    /// URDF spelling of the type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Revolute => "revolute",
            Self::Continuous => "continuous",
            Self::Prismatic => "prismatic",
            Self::Fixed => "fixed",
            Self::Floating => "floating",
            Self::Planar => "planar",
        }
    }
}

// ---------------------------------------------------------------------------
// JointLimits / JointDynamics
// ---------------------------------------------------------------------------

/// Limits on a joint's motion, effort, and velocity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointLimits {
    /// Lower position limit (rad or m). `None` means unbounded.
    pub lower: Option<f64>,
    /// Upper position limit (rad or m). `None` means unbounded.
    pub upper: Option<f64>,
    /// Maximum effort (Nm or N).
    pub effort: f64,
    /// Maximum velocity (rad/s or m/s).
    pub velocity: f64,
}

/// Damping and friction declared on a joint. Carried for completeness; the
/// gravity solve ignores both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointDynamics {
    pub damping: f64,
    pub friction: f64,
}

// ---------------------------------------------------------------------------
// Origin
// ---------------------------------------------------------------------------

/// A 3D pose specified as position + roll-pitch-yaw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Origin {
    /// Translation `[x, y, z]` in meters.
    pub xyz: [f64; 3],
    /// Rotation `[roll, pitch, yaw]` in radians.
    pub rpy: [f64; 3],
}

impl Origin {
    /// Pure translation.
    pub const fn from_xyz(xyz: [f64; 3]) -> Self {
        Self { xyz, rpy: [0.0; 3] }
    }
}

// ---------------------------------------------------------------------------
// Inertial
// ---------------------------------------------------------------------------

/// Inertial properties of a link.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inertial {
    /// Center of mass frame relative to the link frame.
    pub origin: Origin,
    /// Mass in kilograms.
    pub mass: f64,
    /// Inertia tensor about the center of mass, `[ixx, ixy, ixz, iyy, iyz, izz]`.
    pub inertia: [f64; 6],
}

impl Inertial {
    /// Point mass at `com`.
    pub const fn point_mass(mass: f64, com: [f64; 3]) -> Self {
        Self {
            origin: Origin::from_xyz(com),
            mass,
            inertia: [0.0; 6],
        }
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Geometric shape attached to a link. Only meshes matter here, because they
/// reference external resources.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Primitive,
    Mesh { filename: String, scale: [f64; 3] },
}

// ---------------------------------------------------------------------------
// LinkData
// ---------------------------------------------------------------------------

/// In-memory representation of a URDF link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkData {
    pub name: String,
    /// Inertial properties. `None` for massless links.
    pub inertial: Option<Inertial>,
    /// Visual and collision geometry, in declaration order.
    pub geometry: Vec<Geometry>,
}

impl LinkData {
    /// Create a massless link with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inertial: None,
            geometry: Vec::new(),
        }
    }

    /// Builder: set inertial properties.
    #[must_use]
    pub const fn with_inertial(mut self, inertial: Inertial) -> Self {
        self.inertial = Some(inertial);
        self
    }
}

// ---------------------------------------------------------------------------
// JointData
// ---------------------------------------------------------------------------

/// In-memory representation of a URDF joint.
#[derive(Debug, Clone, PartialEq)]
pub struct JointData {
    pub name: String,
    pub joint_type: JointType,
    /// Parent link name.
    pub parent: String,
    /// Child link name.
    pub child: String,
    /// Joint frame relative to the parent link frame.
    pub origin: Origin,
    /// Joint axis in the joint frame (default `[1, 0, 0]` per URDF).
    pub axis: [f64; 3],
    pub limits: JointLimits,
    pub dynamics: JointDynamics,
}

// ---------------------------------------------------------------------------
// RobotModel
// ---------------------------------------------------------------------------

/// Complete in-memory representation of a URDF robot.
///
/// Constructed by the parser and consumed by the dynamics model loader.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotModel {
    pub name: String,
    /// All links, keyed by name.
    pub links: HashMap<String, LinkData>,
    /// All joints, keyed by name.
    pub joints: HashMap<String, JointData>,
    /// Name of the root link (the one never referenced as a child).
    pub root_link: String,
}

impl RobotModel {
    /// Get a link by name.
    pub fn link(&self, name: &str) -> Result<&LinkData, UrdfError> {
        self.links
            .get(name)
            .ok_or_else(|| UrdfError::MissingLink(name.into()))
    }

    /// Get a joint by name.
    pub fn joint(&self, name: &str) -> Result<&JointData, UrdfError> {
        self.joints
            .get(name)
            .ok_or_else(|| UrdfError::MissingJoint(name.into()))
    }

    /// Number of single-DOF joints (revolute, continuous, prismatic).
    pub fn dof(&self) -> usize {
        self.joints
            .values()
            .filter(|j| j.joint_type.is_single_dof())
            .count()
    }

    /// Names of all joints, sorted alphabetically.
    pub fn joint_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.joints.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Joints whose parent is `link`, sorted by joint name.
    pub fn child_joints(&self, link: &str) -> Vec<&JointData> {
        let mut children: Vec<&JointData> =
            self.joints.values().filter(|j| j.parent == link).collect();
        children.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        children
    }

    /// Mesh filenames referenced by any link, sorted and deduplicated.
    pub fn mesh_filenames(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .links
            .values()
            .flat_map(|l| l.geometry.iter())
            .filter_map(|g| match g {
                Geometry::Mesh { filename, .. } => Some(filename.as_str()),
                Geometry::Primitive => None,
            })
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
