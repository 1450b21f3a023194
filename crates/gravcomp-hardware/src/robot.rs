//! Robot hardware abstraction and an in-process implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::HardwareInterfaceError;
use crate::handle::{JointHandle, JointSlot, JointStateHandle};
use crate::interface::{EffortJointInterface, JointStateInterface};

// ---------------------------------------------------------------------------
// RobotHw
// ---------------------------------------------------------------------------

/// What a controller can ask the hardware for. An interface the robot does
/// not provide is `None`.
pub trait RobotHw {
    fn effort_joint_interface(&self) -> Option<&EffortJointInterface>;

    fn joint_state_interface(&self) -> Option<&JointStateInterface>;
}

// ---------------------------------------------------------------------------
// RobotHardware
// ---------------------------------------------------------------------------

/// In-process [`RobotHw`] backed by one [`JointSlot`] per joint.
///
/// The driver side keeps using the slots (through [`slot`](Self::slot),
/// [`set_joint_state`](Self::set_joint_state) and [`command`](Self::command))
/// while controllers hold handles onto the same slots. Each interface exists
/// only once a joint has been registered with it.
#[derive(Debug, Default)]
pub struct RobotHardware {
    slots: BTreeMap<String, Arc<JointSlot>>,
    state: Option<JointStateInterface>,
    effort: Option<EffortJointInterface>,
}

impl RobotHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register each of `names` with both interfaces.
    pub fn with_joints<S: AsRef<str>>(names: &[S]) -> Result<Self, HardwareInterfaceError> {
        let mut hw = Self::new();
        for name in names {
            hw.register_joint(name.as_ref())?;
        }
        Ok(hw)
    }

    /// Expose `name` through the joint state interface only.
    pub fn register_state_joint(&mut self, name: &str) -> Result<(), HardwareInterfaceError> {
        let handle = JointStateHandle::new(name, self.slot_or_insert(name));
        self.state
            .get_or_insert_with(JointStateInterface::new)
            .register_handle(handle)?;
        debug!(joint = name, "registered joint state handle");
        Ok(())
    }

    /// Expose `name` through the effort joint interface only.
    pub fn register_effort_joint(&mut self, name: &str) -> Result<(), HardwareInterfaceError> {
        let handle = JointHandle::new(JointStateHandle::new(name, self.slot_or_insert(name)));
        self.effort
            .get_or_insert_with(EffortJointInterface::new)
            .register_handle(handle)?;
        debug!(joint = name, "registered effort joint handle");
        Ok(())
    }

    /// Expose `name` through both interfaces.
    pub fn register_joint(&mut self, name: &str) -> Result<(), HardwareInterfaceError> {
        self.register_state_joint(name)?;
        self.register_effort_joint(name)
    }

    /// Driver-side access to a joint's slot.
    pub fn slot(&self, name: &str) -> Option<&Arc<JointSlot>> {
        self.slots.get(name)
    }

    /// Publish sensed position and velocity for `name`.
    pub fn set_joint_state(
        &self,
        name: &str,
        position: f64,
        velocity: f64,
    ) -> Result<(), HardwareInterfaceError> {
        let slot = self
            .slots
            .get(name)
            .ok_or_else(|| HardwareInterfaceError::UnknownHandle {
                interface: "RobotHardware",
                name: name.to_owned(),
            })?;
        slot.set_state(position, velocity);
        Ok(())
    }

    /// Last effort command written for `name`.
    pub fn command(&self, name: &str) -> Option<f64> {
        self.slots.get(name).map(|s| s.command())
    }

    /// All joint names known to the hardware, sorted.
    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    fn slot_or_insert(&mut self, name: &str) -> Arc<JointSlot> {
        Arc::clone(self.slots.entry(name.to_owned()).or_default())
    }
}

impl RobotHw for RobotHardware {
    fn effort_joint_interface(&self) -> Option<&EffortJointInterface> {
        self.effort.as_ref()
    }

    fn joint_state_interface(&self) -> Option<&JointStateInterface> {
        self.state.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
