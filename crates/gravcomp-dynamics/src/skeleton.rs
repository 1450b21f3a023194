//! Fixed-base kinematic tree built from a [`RobotModel`].

use std::collections::{HashMap, HashSet};

use nalgebra::{UnitVector3, Vector3};
use tracing::debug;

use gravcomp_urdf::{JointData, JointType, LinkData, ResourceRetriever, RobotModel};

use crate::error::DynamicsError;
use crate::model::{DofIndex, DofState, DynamicsModel, ModelLoader};
use crate::rnea::{self, Attachment, Body, RneaScratch};
use crate::spatial::{Motion, SpatialInertia, origin_to_isometry};

/// Standard gravity, pointing down the world z axis.
pub const STANDARD_GRAVITY: Vector3<f64> = Vector3::new(0.0, 0.0, -9.81);

// ---------------------------------------------------------------------------
// Skeleton
// ---------------------------------------------------------------------------

/// A rigid-body tree whose root link is welded to the world.
///
/// Bodies are stored in depth-first order from the root, visiting child
/// joints by name. Every revolute, continuous or prismatic joint contributes
/// one DOF named after the joint, in the same order. A fixed joint keeps its
/// child as a separate body with no DOF and a zero motion subspace, so the
/// child moves rigidly with its parent. Floating and planar joints are
/// rejected.
#[derive(Debug, Clone)]
pub struct Skeleton {
    name: String,
    bodies: Vec<Body>,
    dof_names: Vec<String>,
    dof_lookup: HashMap<String, usize>,
    states: Vec<DofState>,
    gravity: Vector3<f64>,
    scratch: RneaScratch,
}

impl Skeleton {
    /// Build the tree rooted at `model.root_link`.
    ///
    /// Fails if a joint type is unsupported, a DOF axis is degenerate, a link
    /// has more than one parent, or some link is not reachable from the root.
    pub fn from_model(model: &RobotModel) -> Result<Self, DynamicsError> {
        let root = model.link(&model.root_link)?;
        let mut bodies = vec![Body {
            link: root.name.clone(),
            inertia: link_inertia(root),
            attachment: None,
        }];
        let mut dof_names = Vec::new();
        let mut visited: HashSet<&str> = HashSet::from([root.name.as_str()]);

        let mut stack: Vec<(usize, &JointData)> = model
            .child_joints(&root.name)
            .into_iter()
            .rev()
            .map(|j| (0, j))
            .collect();

        while let Some((parent, joint)) = stack.pop() {
            if !visited.insert(joint.child.as_str()) {
                return Err(DynamicsError::InvalidTree(format!(
                    "link '{}' has more than one parent",
                    joint.child
                )));
            }
            let child = model.link(&joint.child)?;
            let dof = joint.joint_type.is_single_dof().then_some(dof_names.len());
            let attachment = attach(joint, parent, dof)?;
            if dof.is_some() {
                dof_names.push(joint.name.clone());
            }

            let index = bodies.len();
            bodies.push(Body {
                link: child.name.clone(),
                inertia: link_inertia(child),
                attachment: Some(attachment),
            });
            stack.extend(
                model
                    .child_joints(&child.name)
                    .into_iter()
                    .rev()
                    .map(|j| (index, j)),
            );
        }

        if bodies.len() != model.links.len() {
            let mut orphans: Vec<&str> = model
                .links
                .keys()
                .map(String::as_str)
                .filter(|l| !visited.contains(l))
                .collect();
            orphans.sort_unstable();
            return Err(DynamicsError::InvalidTree(format!(
                "links not connected to root '{}': {}",
                root.name,
                orphans.join(", ")
            )));
        }

        let dof_lookup = dof_names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        let states = vec![DofState::default(); dof_names.len()];
        let scratch = RneaScratch::with_bodies(bodies.len());

        debug!(
            robot = %model.name,
            bodies = bodies.len(),
            dofs = dof_names.len(),
            "built skeleton"
        );

        Ok(Self {
            name: model.name.clone(),
            bodies,
            dof_names,
            dof_lookup,
            states,
            gravity: STANDARD_GRAVITY,
            scratch,
        })
    }

    /// Builder: set the world gravity vector.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn set_gravity(&mut self, gravity: Vector3<f64>) {
        self.gravity = gravity;
    }

    pub const fn gravity(&self) -> &Vector3<f64> {
        &self.gravity
    }

    /// Number of rigid bodies, root included.
    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    /// Link names in body order.
    pub fn link_names(&self) -> impl Iterator<Item = &str> {
        self.bodies.iter().map(|b| b.link.as_str())
    }

    /// Name of the joint that attaches `link` to its parent.
    pub fn parent_joint(&self, link: &str) -> Option<&str> {
        self.bodies
            .iter()
            .find(|b| b.link == link)
            .and_then(|b| b.attachment.as_ref())
            .map(|a| a.joint.as_str())
    }

    /// Sum of all body masses.
    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(|b| b.inertia.mass).sum()
    }

    /// Set every DOF's position, velocity and acceleration to zero.
    pub fn reset(&mut self) {
        self.states.fill(DofState::default());
    }
}

impl DynamicsModel for Skeleton {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_dofs(&self) -> usize {
        self.states.len()
    }

    fn dof_index(&self, name: &str) -> Option<DofIndex> {
        self.dof_lookup.get(name).copied().map(DofIndex)
    }

    fn dof_name(&self, index: DofIndex) -> Option<&str> {
        self.dof_names.get(index.0).map(String::as_str)
    }

    fn dof(&self, index: DofIndex) -> Option<&DofState> {
        self.states.get(index.0)
    }

    fn dof_mut(&mut self, index: DofIndex) -> Option<&mut DofState> {
        self.states.get_mut(index.0)
    }

    fn compute_inverse_dynamics(&mut self) {
        rnea::inverse_dynamics(
            &self.bodies,
            &self.gravity,
            &mut self.states,
            &mut self.scratch,
        );
    }
}

fn link_inertia(link: &LinkData) -> SpatialInertia {
    link.inertial
        .as_ref()
        .map_or_else(SpatialInertia::zero, SpatialInertia::from_inertial)
}

fn attach(
    joint: &JointData,
    parent: usize,
    dof: Option<usize>,
) -> Result<Attachment, DynamicsError> {
    let (axis, subspace) = match joint.joint_type {
        JointType::Revolute | JointType::Continuous | JointType::Prismatic => {
            let axis = UnitVector3::try_new(Vector3::from(joint.axis), 1e-9)
                .ok_or_else(|| DynamicsError::DegenerateAxis(joint.name.clone()))?;
            let subspace = if joint.joint_type.is_rotational() {
                Motion::new(axis.into_inner(), Vector3::zeros())
            } else {
                Motion::new(Vector3::zeros(), axis.into_inner())
            };
            (axis, subspace)
        }
        JointType::Fixed => (Vector3::x_axis(), Motion::zeros()),
        other @ (JointType::Floating | JointType::Planar) => {
            return Err(DynamicsError::UnsupportedJoint {
                joint: joint.name.clone(),
                kind: other.as_str(),
            });
        }
    };

    Ok(Attachment {
        parent,
        joint: joint.name.clone(),
        origin: origin_to_isometry(&joint.origin),
        axis,
        rotational: joint.joint_type.is_rotational(),
        dof,
        subspace,
    })
}

// ---------------------------------------------------------------------------
// UrdfModelLoader
// ---------------------------------------------------------------------------

/// [`ModelLoader`] that parses URDF text into a [`Skeleton`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UrdfModelLoader {
    gravity: Vector3<f64>,
}

impl UrdfModelLoader {
    pub const fn new() -> Self {
        Self {
            gravity: STANDARD_GRAVITY,
        }
    }

    /// Builder: gravity given to every loaded skeleton.
    #[must_use]
    pub const fn with_gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = gravity;
        self
    }
}

impl Default for UrdfModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelLoader for UrdfModelLoader {
    type Model = Skeleton;

    fn load(
        &self,
        description: &str,
        retriever: &dyn ResourceRetriever,
    ) -> Result<Skeleton, DynamicsError> {
        let model = gravcomp_urdf::parse_string_with(description, retriever)?;
        Ok(Skeleton::from_model(&model)?.with_gravity(self.gravity))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gravcomp_urdf::{LocalResourceRetriever, UrdfError, parse_string};
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    const G: f64 = 9.81;

    /// One link on a y-axis hinge with a point mass `m` at `l` along x and
    /// rotational inertia `iyy` about its COM.
    fn pendulum_urdf(m: f64, l: f64, iyy: f64) -> String {
        format!(
            r#"<robot name="pendulum">
                <link name="world"/>
                <link name="bob">
                    <inertial>
                        <origin xyz="{l} 0 0"/>
                        <mass value="{m}"/>
                        <inertia ixx="0" ixy="0" ixz="0" iyy="{iyy}" iyz="0" izz="0"/>
                    </inertial>
                </link>
                <joint name="hinge" type="continuous">
                    <parent link="world"/>
                    <child link="bob"/>
                    <axis xyz="0 1 0"/>
                </joint>
            </robot>"#
        )
    }

    /// Planar two-link arm, both hinges about y.
    fn two_link_urdf(m1: f64, l1c: f64, len1: f64, m2: f64, l2c: f64) -> String {
        format!(
            r#"<robot name="two_link">
                <link name="base"/>
                <link name="link1">
                    <inertial>
                        <origin xyz="{l1c} 0 0"/>
                        <mass value="{m1}"/>
                        <inertia ixx="0.01" ixy="0" ixz="0" iyy="0.02" iyz="0" izz="0.02"/>
                    </inertial>
                </link>
                <link name="link2">
                    <inertial>
                        <origin xyz="{l2c} 0 0"/>
                        <mass value="{m2}"/>
                        <inertia ixx="0.01" ixy="0" ixz="0" iyy="0.02" iyz="0" izz="0.02"/>
                    </inertial>
                </link>
                <joint name="j1" type="revolute">
                    <parent link="base"/>
                    <child link="link1"/>
                    <axis xyz="0 1 0"/>
                    <limit lower="-3" upper="3" effort="50" velocity="2"/>
                </joint>
                <joint name="j2" type="revolute">
                    <parent link="link1"/>
                    <child link="link2"/>
                    <origin xyz="{len1} 0 0"/>
                    <axis xyz="0 1 0"/>
                    <limit lower="-3" upper="3" effort="50" velocity="2"/>
                </joint>
            </robot>"#
        )
    }

    const SLIDER_URDF: &str = r#"
        <robot name="slider">
            <link name="rail"/>
            <link name="carriage">
                <inertial><mass value="2.0"/><inertia ixx="0.1" ixy="0" ixz="0" iyy="0.1" iyz="0" izz="0.1"/></inertial>
            </link>
            <link name="payload">
                <inertial>
                    <origin xyz="0.3 0 0"/>
                    <mass value="0.5"/>
                    <inertia ixx="0" ixy="0" ixz="0" iyy="0" iyz="0" izz="0"/>
                </inertial>
            </link>
            <joint name="lift" type="prismatic">
                <parent link="rail"/>
                <child link="carriage"/>
                <axis xyz="0 0 1"/>
                <limit lower="0" upper="1" effort="100" velocity="1"/>
            </joint>
            <joint name="clamp" type="fixed">
                <parent link="carriage"/>
                <child link="payload"/>
            </joint>
        </robot>
    "#;

    fn skeleton(xml: &str) -> Skeleton {
        Skeleton::from_model(&parse_string(xml).unwrap()).unwrap()
    }

    fn set(model: &mut Skeleton, name: &str, q: f64, qd: f64, qdd: f64) {
        let idx = model.dof_index(name).unwrap();
        let dof = model.dof_mut(idx).unwrap();
        dof.position = q;
        dof.velocity = qd;
        dof.acceleration = qdd;
    }

    fn force(model: &Skeleton, name: &str) -> f64 {
        model.dof(model.dof_index(name).unwrap()).unwrap().force
    }

    // -- Construction --

    #[test]
    fn dofs_follow_depth_first_order() {
        let model = skeleton(&two_link_urdf(1.0, 0.2, 0.4, 1.0, 0.2));
        assert_eq!(model.name(), "two_link");
        assert_eq!(model.num_dofs(), 2);
        assert_eq!(model.dof_names(), vec!["j1", "j2"]);
        assert_eq!(model.dof_index("j2"), Some(DofIndex(1)));
        assert_eq!(model.dof_name(DofIndex(0)), Some("j1"));
        assert_eq!(model.dof_index("missing"), None);
        assert!(model.dof(DofIndex(2)).is_none());
        assert_eq!(model.num_bodies(), 3);
        assert_eq!(model.link_names().collect::<Vec<_>>(), vec!["base", "link1", "link2"]);
        assert_eq!(model.parent_joint("link2"), Some("j2"));
        assert_eq!(model.parent_joint("base"), None);
    }

    #[test]
    fn fixed_joints_add_no_dof() {
        let model = skeleton(SLIDER_URDF);
        assert_eq!(model.dof_names(), vec!["lift"]);
        assert_eq!(model.num_bodies(), 3);
        assert_relative_eq!(model.total_mass(), 2.5);
    }

    #[test]
    fn floating_joint_rejected() {
        let xml = r#"<robot name="r">
            <link name="world"/><link name="body"/>
            <joint name="free" type="floating">
                <parent link="world"/><child link="body"/>
            </joint>
        </robot>"#;
        let err = Skeleton::from_model(&parse_string(xml).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            DynamicsError::UnsupportedJoint { ref joint, kind: "floating" } if joint == "free"
        ));
    }

    #[test]
    fn zero_axis_rejected() {
        let xml = r#"<robot name="r">
            <link name="a"/><link name="b"/>
            <joint name="bad" type="revolute">
                <parent link="a"/><child link="b"/>
                <axis xyz="0 0 0"/>
                <limit lower="-1" upper="1" effort="1" velocity="1"/>
            </joint>
        </robot>"#;
        let err = Skeleton::from_model(&parse_string(xml).unwrap()).unwrap_err();
        assert!(matches!(err, DynamicsError::DegenerateAxis(ref j) if j == "bad"));
    }

    #[test]
    fn disconnected_links_rejected() {
        let xml = r#"<robot name="r">
            <link name="a"/><link name="b"/><link name="z"/>
            <joint name="ab" type="fixed"><parent link="a"/><child link="b"/></joint>
        </robot>"#;
        let err = Skeleton::from_model(&parse_string(xml).unwrap()).unwrap_err();
        match err {
            DynamicsError::InvalidTree(msg) => assert!(msg.contains("'z'") || msg.contains(": z")),
            other => panic!("expected InvalidTree, got {other:?}"),
        }
    }

    #[test]
    fn link_with_two_parents_rejected() {
        let xml = r#"<robot name="r">
            <link name="a"/><link name="b"/><link name="c"/>
            <joint name="ab" type="fixed"><parent link="a"/><child link="b"/></joint>
            <joint name="ac" type="fixed"><parent link="a"/><child link="c"/></joint>
            <joint name="bc" type="fixed"><parent link="b"/><child link="c"/></joint>
        </robot>"#;
        let err = Skeleton::from_model(&parse_string(xml).unwrap()).unwrap_err();
        assert!(matches!(err, DynamicsError::InvalidTree(ref m) if m.contains("more than one parent")));
    }

    // -- Inverse dynamics --

    #[test]
    fn pendulum_gravity_torque() {
        let (m, l) = (1.5, 0.4);
        let mut model = skeleton(&pendulum_urdf(m, l, 0.0));
        for q in [0.0, FRAC_PI_4, FRAC_PI_2, -1.0, 2.5] {
            set(&mut model, "hinge", q, 0.0, 0.0);
            model.compute_inverse_dynamics();
            assert_relative_eq!(force(&model, "hinge"), -m * G * l * q.cos(), epsilon = 1e-9);
        }
    }

    #[test]
    fn pendulum_torque_independent_of_velocity() {
        let (m, l) = (1.0, 0.5);
        let mut model = skeleton(&pendulum_urdf(m, l, 0.01));
        set(&mut model, "hinge", 0.3, 4.0, 0.0);
        model.compute_inverse_dynamics();
        assert_relative_eq!(force(&model, "hinge"), -m * G * l * 0.3_f64.cos(), epsilon = 1e-9);
    }

    #[test]
    fn pendulum_acceleration_adds_inertial_torque() {
        let (m, l, iyy) = (2.0, 0.3, 0.05);
        let mut model = skeleton(&pendulum_urdf(m, l, iyy));
        set(&mut model, "hinge", 0.7, 0.0, 1.5);
        model.compute_inverse_dynamics();
        let expected = (m * l * l + iyy) * 1.5 - m * G * l * 0.7_f64.cos();
        assert_relative_eq!(force(&model, "hinge"), expected, epsilon = 1e-9);
    }

    #[test]
    fn two_link_gravity_torques() {
        let (m1, l1c, len1, m2, l2c) = (2.0, 0.2, 0.4, 1.0, 0.15);
        let mut model = skeleton(&two_link_urdf(m1, l1c, len1, m2, l2c));
        for (q1, q2) in [(0.0, 0.0), (0.3, -0.8), (1.2, 0.5), (-FRAC_PI_2, FRAC_PI_4)] {
            set(&mut model, "j1", q1, 0.0, 0.0);
            set(&mut model, "j2", q2, 0.0, 0.0);
            model.compute_inverse_dynamics();
            let tau1 = -G * ((m1 * l1c + m2 * len1) * q1.cos() + m2 * l2c * (q1 + q2).cos());
            let tau2 = -G * m2 * l2c * (q1 + q2).cos();
            assert_relative_eq!(force(&model, "j1"), tau1, epsilon = 1e-9);
            assert_relative_eq!(force(&model, "j2"), tau2, epsilon = 1e-9);
        }
    }

    #[test]
    fn prismatic_holds_fixed_payload() {
        let mut model = skeleton(SLIDER_URDF);
        set(&mut model, "lift", 0.5, 0.0, 0.0);
        model.compute_inverse_dynamics();
        assert_relative_eq!(force(&model, "lift"), 2.5 * G, epsilon = 1e-9);
    }

    #[test]
    fn zero_gravity_zero_torque_at_rest() {
        let mut model = skeleton(&two_link_urdf(1.0, 0.2, 0.4, 1.0, 0.2)).with_gravity(Vector3::zeros());
        set(&mut model, "j1", 0.4, 0.0, 0.0);
        model.compute_inverse_dynamics();
        assert_relative_eq!(force(&model, "j1"), 0.0, epsilon = 1e-12);
        assert_relative_eq!(force(&model, "j2"), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn gravity_along_hinge_axis_gives_no_torque() {
        let mut model = skeleton(&pendulum_urdf(1.0, 0.5, 0.0));
        model.set_gravity(Vector3::new(0.0, -9.81, 0.0));
        assert_relative_eq!(model.gravity().y, -9.81);
        set(&mut model, "hinge", 0.6, 0.0, 0.0);
        model.compute_inverse_dynamics();
        assert_relative_eq!(force(&model, "hinge"), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn reset_clears_state() {
        let mut model = skeleton(&pendulum_urdf(1.0, 0.5, 0.0));
        set(&mut model, "hinge", 1.0, 2.0, 3.0);
        model.reset();
        assert_eq!(*model.dof(DofIndex(0)).unwrap(), DofState::default());
    }

    // -- UrdfModelLoader --

    #[test]
    fn loader_applies_gravity() {
        let loader = UrdfModelLoader::new().with_gravity(Vector3::new(0.0, 0.0, -1.62));
        let model = loader
            .load(&pendulum_urdf(1.0, 0.5, 0.0), &LocalResourceRetriever::new())
            .unwrap();
        assert_relative_eq!(model.gravity().z, -1.62);
        assert_eq!(UrdfModelLoader::default().gravity, STANDARD_GRAVITY);
    }

    #[test]
    fn loader_reports_parse_failure() {
        let err = UrdfModelLoader::new()
            .load("<robot", &LocalResourceRetriever::new())
            .unwrap_err();
        assert!(matches!(err, DynamicsError::Description(UrdfError::Parse(_))));
    }
}
