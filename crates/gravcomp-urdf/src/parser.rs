//! URDF XML parsing using `urdf-rs`.
//!
//! Converts `urdf_rs` types into the crate's canonical [`RobotModel`]
//! representation, optionally resolving mesh resources through a
//! [`ResourceRetriever`].

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::UrdfError;
use crate::resource::ResourceRetriever;
use crate::types::{
    Geometry, Inertial, JointData, JointDynamics, JointLimits, JointType, LinkData, Origin,
    RobotModel,
};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a URDF file from disk into a [`RobotModel`].
pub fn parse_file(path: impl AsRef<Path>) -> Result<RobotModel, UrdfError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| UrdfError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_string(&content)
}

/// Parse a URDF XML string into a [`RobotModel`]. Mesh URIs are kept verbatim.
pub fn parse_string(xml: &str) -> Result<RobotModel, UrdfError> {
    let robot = urdf_rs::read_from_string(xml).map_err(|e| UrdfError::Parse(e.to_string()))?;
    convert_robot(&robot)
}

/// Parse a URDF XML string and rewrite every mesh URI to the local path
/// `retriever` resolves it to.
///
/// Unresolvable meshes are logged and left untouched: geometry does not take
/// part in the dynamics, so a missing mesh never fails the parse.
pub fn parse_string_with(
    xml: &str,
    retriever: &dyn ResourceRetriever,
) -> Result<RobotModel, UrdfError> {
    let mut model = parse_string(xml)?;
    resolve_meshes(&mut model, retriever);
    Ok(model)
}

fn resolve_meshes(model: &mut RobotModel, retriever: &dyn ResourceRetriever) {
    let mut resolved: HashMap<String, Option<String>> = HashMap::new();
    for link in model.links.values_mut() {
        for geometry in &mut link.geometry {
            let Geometry::Mesh { filename, .. } = geometry else {
                continue;
            };
            let entry = resolved
                .entry(filename.clone())
                .or_insert_with(|| match retriever.resolve(filename) {
                    Ok(path) => {
                        debug!(uri = %filename, path = %path.display(), "resolved mesh resource");
                        Some(path.to_string_lossy().into_owned())
                    }
                    Err(e) => {
                        warn!(link = %link.name, "{e}");
                        None
                    }
                });
            if let Some(path) = entry {
                filename.clone_from(path);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

fn convert_robot(robot: &urdf_rs::Robot) -> Result<RobotModel, UrdfError> {
    let links: HashMap<String, LinkData> = robot
        .links
        .iter()
        .map(|l| (l.name.clone(), convert_link(l)))
        .collect();

    let joints: HashMap<String, JointData> = robot
        .joints
        .iter()
        .map(|j| convert_joint(j).map(|jd| (jd.name.clone(), jd)))
        .collect::<Result<_, _>>()?;

    for joint in joints.values() {
        for link in [&joint.parent, &joint.child] {
            if !links.contains_key(link) {
                return Err(UrdfError::MissingLink(link.clone()));
            }
        }
    }

    // Root link = a link that is never a child of any joint. Sorted so that a
    // forest picks the same root on every run.
    let child_links: HashSet<&str> = joints.values().map(|j| j.child.as_str()).collect();
    let mut roots: Vec<&String> = links
        .keys()
        .filter(|name| !child_links.contains(name.as_str()))
        .collect();
    roots.sort_unstable();
    let root_link = roots.first().ok_or(UrdfError::NoRootLink)?.to_string();

    Ok(RobotModel {
        name: robot.name.clone(),
        links,
        joints,
        root_link,
    })
}

fn convert_link(link: &urdf_rs::Link) -> LinkData {
    let has_inertia = link.inertial.mass.value > 0.0;
    LinkData {
        name: link.name.clone(),
        inertial: has_inertia.then(|| convert_inertial(&link.inertial)),
        geometry: link
            .visual
            .iter()
            .map(|v| &v.geometry)
            .chain(link.collision.iter().map(|c| &c.geometry))
            .map(convert_geometry)
            .collect(),
    }
}

fn convert_joint(joint: &urdf_rs::Joint) -> Result<JointData, UrdfError> {
    let joint_type = convert_joint_type(&joint.joint_type)?;

    let dynamics = joint
        .dynamics
        .as_ref()
        .map(convert_dynamics)
        .unwrap_or_default();

    Ok(JointData {
        name: joint.name.clone(),
        joint_type,
        parent: joint.parent.link.clone(),
        child: joint.child.link.clone(),
        origin: convert_pose(&joint.origin),
        axis: *joint.axis.xyz,
        limits: convert_limits(&joint.limit),
        dynamics,
    })
}

fn convert_joint_type(jt: &urdf_rs::JointType) -> Result<JointType, UrdfError> {
    match jt {
        urdf_rs::JointType::Revolute => Ok(JointType::Revolute),
        urdf_rs::JointType::Continuous => Ok(JointType::Continuous),
        urdf_rs::JointType::Prismatic => Ok(JointType::Prismatic),
        urdf_rs::JointType::Fixed => Ok(JointType::Fixed),
        urdf_rs::JointType::Floating => Ok(JointType::Floating),
        urdf_rs::JointType::Planar => Ok(JointType::Planar),
        urdf_rs::JointType::Spherical => Err(UrdfError::UnsupportedJointType("spherical".into())),
    }
}

fn convert_limits(limit: &urdf_rs::JointLimit) -> JointLimits {
    // urdf-rs defaults lower/upper to 0.0 for joints without limits.
    let has_limits = (limit.lower - limit.upper).abs() > f64::EPSILON;
    JointLimits {
        lower: has_limits.then_some(limit.lower),
        upper: has_limits.then_some(limit.upper),
        effort: limit.effort,
        velocity: limit.velocity,
    }
}

const fn convert_dynamics(dyn_: &urdf_rs::Dynamics) -> JointDynamics {
    JointDynamics {
        damping: dyn_.damping,
        friction: dyn_.friction,
    }
}

fn convert_pose(pose: &urdf_rs::Pose) -> Origin {
    Origin {
        xyz: *pose.xyz,
        rpy: *pose.rpy,
    }
}

fn convert_inertial(inertial: &urdf_rs::Inertial) -> Inertial {
    let i = &inertial.inertia;
    Inertial {
        origin: convert_pose(&inertial.origin),
        mass: inertial.mass.value,
        inertia: [i.ixx, i.ixy, i.ixz, i.iyy, i.iyz, i.izz],
    }
}

fn convert_geometry(geom: &urdf_rs::Geometry) -> Geometry {
    match geom {
        urdf_rs::Geometry::Mesh { filename, scale } => Geometry::Mesh {
            filename: filename.clone(),
            scale: scale.as_ref().map_or([1.0, 1.0, 1.0], |s| **s),
        },
        _ => Geometry::Primitive,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
