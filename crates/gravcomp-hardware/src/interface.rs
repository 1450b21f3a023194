//! Named collections of joint handles.

use std::collections::BTreeMap;

use crate::error::HardwareInterfaceError;
use crate::handle::{JointHandle, JointStateHandle};

// ---------------------------------------------------------------------------
// HandleMap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct HandleMap<H> {
    interface: &'static str,
    handles: BTreeMap<String, H>,
}

impl<H: Clone> HandleMap<H> {
    const fn new(interface: &'static str) -> Self {
        Self {
            interface,
            handles: BTreeMap::new(),
        }
    }

    fn insert(&mut self, name: &str, handle: H) -> Result<(), HardwareInterfaceError> {
        if self.handles.contains_key(name) {
            return Err(HardwareInterfaceError::DuplicateHandle {
                interface: self.interface,
                name: name.to_owned(),
            });
        }
        self.handles.insert(name.to_owned(), handle);
        Ok(())
    }

    fn get(&self, name: &str) -> Result<H, HardwareInterfaceError> {
        self.handles
            .get(name)
            .cloned()
            .ok_or_else(|| HardwareInterfaceError::UnknownHandle {
                interface: self.interface,
                name: name.to_owned(),
            })
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.handles.keys().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// JointStateInterface
// ---------------------------------------------------------------------------

/// Read-only joint state for any number of joints.
#[derive(Debug, Clone)]
pub struct JointStateInterface {
    handles: HandleMap<JointStateHandle>,
}

impl JointStateInterface {
    pub const NAME: &'static str = "JointStateInterface";

    pub const fn new() -> Self {
        Self {
            handles: HandleMap::new(Self::NAME),
        }
    }

    pub fn register_handle(&mut self, handle: JointStateHandle) -> Result<(), HardwareInterfaceError> {
        let name = handle.name().to_owned();
        self.handles.insert(&name, handle)
    }

    /// Look up a handle by joint name.
    pub fn get_handle(&self, name: &str) -> Result<JointStateHandle, HardwareInterfaceError> {
        self.handles.get(name)
    }

    /// Registered joint names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handles.names()
    }

    pub fn len(&self) -> usize {
        self.handles.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.handles.is_empty()
    }
}

impl Default for JointStateInterface {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// EffortJointInterface
// ---------------------------------------------------------------------------

/// Joints that accept effort (torque or force) commands.
#[derive(Debug, Clone)]
pub struct EffortJointInterface {
    handles: HandleMap<JointHandle>,
}

impl EffortJointInterface {
    pub const NAME: &'static str = "EffortJointInterface";

    pub const fn new() -> Self {
        Self {
            handles: HandleMap::new(Self::NAME),
        }
    }

    pub fn register_handle(&mut self, handle: JointHandle) -> Result<(), HardwareInterfaceError> {
        let name = handle.name().to_owned();
        self.handles.insert(&name, handle)
    }

    /// Look up a handle by joint name.
    pub fn get_handle(&self, name: &str) -> Result<JointHandle, HardwareInterfaceError> {
        self.handles.get(name)
    }

    /// Registered joint names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handles.names()
    }

    pub fn len(&self) -> usize {
        self.handles.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.handles.is_empty()
    }
}

impl Default for EffortJointInterface {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::JointSlot;
    use std::sync::Arc;

    fn state_handle(name: &str) -> JointStateHandle {
        JointStateHandle::new(name, Arc::new(JointSlot::default()))
    }

    #[test]
    fn state_interface_register_and_get() {
        let mut iface = JointStateInterface::new();
        assert!(iface.is_empty());
        iface.register_handle(state_handle("wrist")).unwrap();
        iface.register_handle(state_handle("elbow")).unwrap();
        assert_eq!(iface.len(), 2);
        assert_eq!(iface.get_handle("wrist").unwrap().name(), "wrist");
        assert_eq!(iface.names().collect::<Vec<_>>(), vec!["elbow", "wrist"]);
    }

    #[test]
    fn state_interface_unknown_handle() {
        let iface = JointStateInterface::default();
        assert_eq!(
            iface.get_handle("ghost").unwrap_err(),
            HardwareInterfaceError::UnknownHandle {
                interface: "JointStateInterface",
                name: "ghost".into(),
            }
        );
    }

    #[test]
    fn effort_interface_rejects_duplicates() {
        let mut iface = EffortJointInterface::new();
        iface
            .register_handle(JointHandle::new(state_handle("shoulder")))
            .unwrap();
        let err = iface
            .register_handle(JointHandle::new(state_handle("shoulder")))
            .unwrap_err();
        assert!(matches!(
            err,
            HardwareInterfaceError::DuplicateHandle { interface: "EffortJointInterface", .. }
        ));
        assert_eq!(iface.len(), 1);
    }

    #[test]
    fn effort_interface_unknown_handle() {
        let iface = EffortJointInterface::default();
        assert!(matches!(
            iface.get_handle("elbow"),
            Err(HardwareInterfaceError::UnknownHandle { .. })
        ));
        assert!(iface.names().next().is_none());
    }
}
