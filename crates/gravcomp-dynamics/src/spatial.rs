//! Spatial vector algebra for the recursive Newton–Euler pass.
//!
//! Motion and force vectors are stored as `(angular, linear)` pairs expressed
//! in a body frame, at that frame's origin.
//!
//! Reference: chapter 2 of "Rigid Body Dynamics Algorithms", Featherstone.

use nalgebra::{Isometry3, Matrix3, Translation3, UnitQuaternion, UnitVector3, Vector3};

use gravcomp_urdf::{Inertial, Origin};

// ---------------------------------------------------------------------------
// Motion / Force
// ---------------------------------------------------------------------------

/// Spatial motion vector: angular and linear velocity (or acceleration).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub angular: Vector3<f64>,
    pub linear: Vector3<f64>,
}

impl Motion {
    pub fn zeros() -> Self {
        Self {
            angular: Vector3::zeros(),
            linear: Vector3::zeros(),
        }
    }

    pub const fn new(angular: Vector3<f64>, linear: Vector3<f64>) -> Self {
        Self { angular, linear }
    }

    /// `self` scaled by `s`.
    pub fn scale(&self, s: f64) -> Self {
        Self::new(self.angular * s, self.linear * s)
    }

    /// Motion cross product `self ×ₘ m`.
    pub fn cross_motion(&self, m: &Self) -> Self {
        Self::new(
            self.angular.cross(&m.angular),
            self.angular.cross(&m.linear) + self.linear.cross(&m.angular),
        )
    }

    /// Force cross product `self ×* f`.
    pub fn cross_force(&self, f: &Force) -> Force {
        Force::new(
            self.angular.cross(&f.angular) + self.linear.cross(&f.linear),
            self.angular.cross(&f.linear),
        )
    }

    /// Power pairing `self · f`.
    pub fn dot(&self, f: &Force) -> f64 {
        self.angular.dot(&f.angular) + self.linear.dot(&f.linear)
    }
}

impl std::ops::Add for Motion {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.angular + rhs.angular, self.linear + rhs.linear)
    }
}

/// Spatial force vector: moment and linear force.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Force {
    pub angular: Vector3<f64>,
    pub linear: Vector3<f64>,
}

impl Force {
    pub fn zeros() -> Self {
        Self {
            angular: Vector3::zeros(),
            linear: Vector3::zeros(),
        }
    }

    pub const fn new(angular: Vector3<f64>, linear: Vector3<f64>) -> Self {
        Self { angular, linear }
    }
}

impl std::ops::Add for Force {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.angular + rhs.angular, self.linear + rhs.linear)
    }
}

impl std::ops::AddAssign for Force {
    fn add_assign(&mut self, rhs: Self) {
        self.angular += rhs.angular;
        self.linear += rhs.linear;
    }
}

// ---------------------------------------------------------------------------
// SpatialInertia
// ---------------------------------------------------------------------------

/// Rigid-body inertia expressed at a body frame's origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialInertia {
    pub mass: f64,
    /// Center of mass in body coordinates.
    pub com: Vector3<f64>,
    /// Rotational inertia about the body origin.
    pub moment: Matrix3<f64>,
}

impl SpatialInertia {
    /// A massless body.
    pub fn zero() -> Self {
        Self {
            mass: 0.0,
            com: Vector3::zeros(),
            moment: Matrix3::zeros(),
        }
    }

    /// Build from mass, COM and the inertia tensor about the COM (all in body
    /// coordinates), shifting the tensor to the body origin.
    pub fn from_com(mass: f64, com: Vector3<f64>, moment_at_com: Matrix3<f64>) -> Self {
        let shift = (Matrix3::identity() * com.dot(&com) - com * com.transpose()) * mass;
        Self {
            mass,
            com,
            moment: moment_at_com + shift,
        }
    }

    /// Build from a URDF `<inertial>` block. The tensor is given in the
    /// inertial frame, which may be rotated relative to the link.
    pub fn from_inertial(inertial: &Inertial) -> Self {
        let [ixx, ixy, ixz, iyy, iyz, izz] = inertial.inertia;
        #[rustfmt::skip]
        let tensor = Matrix3::new(
            ixx, ixy, ixz,
            ixy, iyy, iyz,
            ixz, iyz, izz,
        );
        let frame = origin_to_isometry(&inertial.origin);
        let rotation = frame.rotation.to_rotation_matrix().into_inner();
        Self::from_com(
            inertial.mass,
            frame.translation.vector,
            rotation * tensor * rotation.transpose(),
        )
    }

    /// Spatial momentum `I v`.
    pub fn mul_motion(&self, v: &Motion) -> Force {
        let mc = self.com * self.mass;
        Force::new(
            self.moment * v.angular + mc.cross(&v.linear),
            v.linear * self.mass - mc.cross(&v.angular),
        )
    }
}

// ---------------------------------------------------------------------------
// ParentTransform
// ---------------------------------------------------------------------------

/// Placement of a child body frame in its parent's frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParentTransform {
    /// Child axes expressed in the parent frame.
    pub rotation: Matrix3<f64>,
    /// Child origin in parent coordinates.
    pub translation: Vector3<f64>,
}

impl ParentTransform {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn from_isometry(iso: &Isometry3<f64>) -> Self {
        Self {
            rotation: iso.rotation.to_rotation_matrix().into_inner(),
            translation: iso.translation.vector,
        }
    }

    /// Re-express a parent-frame motion vector in the child frame.
    pub fn motion_to_child(&self, m: &Motion) -> Motion {
        let rt = self.rotation.transpose();
        Motion::new(
            rt * m.angular,
            rt * (m.linear + m.angular.cross(&self.translation)),
        )
    }

    /// Re-express a child-frame force vector in the parent frame.
    pub fn force_to_parent(&self, f: &Force) -> Force {
        let linear = self.rotation * f.linear;
        Force::new(
            self.rotation * f.angular + self.translation.cross(&linear),
            linear,
        )
    }
}

// ---------------------------------------------------------------------------
// Frame helpers
// ---------------------------------------------------------------------------

/// Convert a URDF [`Origin`] (xyz + rpy) to an [`Isometry3`].
pub fn origin_to_isometry(origin: &Origin) -> Isometry3<f64> {
    let translation = Translation3::new(origin.xyz[0], origin.xyz[1], origin.xyz[2]);
    let rotation = UnitQuaternion::from_matrix(&rotation_matrix_from_rpy(
        origin.rpy[0],
        origin.rpy[1],
        origin.rpy[2],
    ));
    Isometry3::from_parts(translation, rotation)
}

/// Build a rotation matrix from roll-pitch-yaw (intrinsic XYZ / extrinsic ZYX).
pub fn rotation_matrix_from_rpy(roll: f64, pitch: f64, yaw: f64) -> Matrix3<f64> {
    let (sr, cr) = roll.sin_cos();
    let (sp, cp) = pitch.sin_cos();
    let (sy, cy) = yaw.sin_cos();

    #[rustfmt::skip]
    let m = Matrix3::new(
        cy * cp, cy * sp * sr - sy * cr, cy * sp * cr + sy * sr,
        sy * cp, sy * sp * sr + cy * cr, sy * sp * cr - cy * sr,
        -sp,     cp * sr,                cp * cr,
    );
    m
}

/// Motion of a single-DOF joint at `position` along/about `axis`.
pub fn joint_motion(axis: &UnitVector3<f64>, rotational: bool, position: f64) -> Isometry3<f64> {
    if rotational {
        Isometry3::from_parts(
            Translation3::identity(),
            UnitQuaternion::from_axis_angle(axis, position),
        )
    } else {
        Isometry3::from_parts(
            Translation3::from(axis.into_inner() * position),
            UnitQuaternion::identity(),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
