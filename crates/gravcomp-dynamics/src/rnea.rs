//! Recursive Newton–Euler inverse dynamics over a [`Skeleton`](crate::Skeleton)
//! body list.
//!
//! Two O(n) passes: outward from the root propagating velocity and
//! acceleration, then inward accumulating body wrenches and projecting them
//! onto each joint's motion subspace. Gravity enters as a fictitious upward
//! acceleration of the fixed root, so `qd = qdd = 0` yields pure gravity
//! torques.
//!
//! Storage is sized once when the skeleton is built; a solve never allocates.

use nalgebra::{Isometry3, UnitVector3, Vector3};

use crate::model::DofState;
use crate::spatial::{Force, Motion, ParentTransform, SpatialInertia, joint_motion};

// ---------------------------------------------------------------------------
// Body tree
// ---------------------------------------------------------------------------

/// One rigid body of the tree. Bodies are stored parent-before-child.
#[derive(Debug, Clone)]
pub(crate) struct Body {
    pub(crate) link: String,
    pub(crate) inertia: SpatialInertia,
    /// `None` for the root, which is welded to the world.
    pub(crate) attachment: Option<Attachment>,
}

/// How a body hangs off its parent.
#[derive(Debug, Clone)]
pub(crate) struct Attachment {
    pub(crate) parent: usize,
    pub(crate) joint: String,
    /// Joint frame in the parent body frame.
    pub(crate) origin: Isometry3<f64>,
    pub(crate) axis: UnitVector3<f64>,
    pub(crate) rotational: bool,
    /// Index into the DOF table; `None` for fixed joints.
    pub(crate) dof: Option<usize>,
    /// Motion subspace `S` in the child frame. Zero for fixed joints.
    pub(crate) subspace: Motion,
}

impl Attachment {
    /// Child frame placement in the parent frame at joint position `q`.
    fn placement(&self, q: f64) -> Isometry3<f64> {
        if self.dof.is_some() {
            self.origin * joint_motion(&self.axis, self.rotational, q)
        } else {
            self.origin
        }
    }
}

// ---------------------------------------------------------------------------
// Scratch
// ---------------------------------------------------------------------------

/// Per-body working storage for one solve.
#[derive(Debug, Clone, Default)]
pub(crate) struct RneaScratch {
    transforms: Vec<ParentTransform>,
    velocities: Vec<Motion>,
    accelerations: Vec<Motion>,
    forces: Vec<Force>,
}

impl RneaScratch {
    pub(crate) fn with_bodies(n: usize) -> Self {
        Self {
            transforms: vec![ParentTransform::identity(); n],
            velocities: vec![Motion::zeros(); n],
            accelerations: vec![Motion::zeros(); n],
            forces: vec![Force::zeros(); n],
        }
    }
}

// ---------------------------------------------------------------------------
// Solve
// ---------------------------------------------------------------------------

/// Overwrite `states[..].force` with the generalized forces that realize the
/// current positions, velocities and accelerations under `gravity`.
pub(crate) fn inverse_dynamics(
    bodies: &[Body],
    gravity: &Vector3<f64>,
    states: &mut [DofState],
    scratch: &mut RneaScratch,
) {
    debug_assert_eq!(scratch.forces.len(), bodies.len());

    // Outward pass.
    for (i, body) in bodies.iter().enumerate() {
        let Some(att) = &body.attachment else {
            scratch.transforms[i] = ParentTransform::identity();
            scratch.velocities[i] = Motion::zeros();
            scratch.accelerations[i] = Motion::new(Vector3::zeros(), -gravity);
            scratch.forces[i] = Force::zeros();
            continue;
        };

        let (q, qd, qdd) = att.dof.map_or((0.0, 0.0, 0.0), |d| {
            let s = &states[d];
            (s.position, s.velocity, s.acceleration)
        });

        let x = ParentTransform::from_isometry(&att.placement(q));
        let v_parent = scratch.velocities[att.parent];
        let a_parent = scratch.accelerations[att.parent];

        let v_joint = att.subspace.scale(qd);
        let v = x.motion_to_child(&v_parent) + v_joint;
        let a = x.motion_to_child(&a_parent) + att.subspace.scale(qdd) + v.cross_motion(&v_joint);

        let momentum = body.inertia.mul_motion(&v);
        scratch.transforms[i] = x;
        scratch.velocities[i] = v;
        scratch.accelerations[i] = a;
        scratch.forces[i] = body.inertia.mul_motion(&a) + v.cross_force(&momentum);
    }

    // Inward pass.
    for (i, body) in bodies.iter().enumerate().rev() {
        let Some(att) = &body.attachment else {
            continue;
        };
        let f = scratch.forces[i];
        if let Some(d) = att.dof {
            states[d].force = att.subspace.dot(&f);
        }
        let f_parent = scratch.transforms[i].force_to_parent(&f);
        scratch.forces[att.parent] += f_parent;
    }
}
