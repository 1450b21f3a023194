//! Controller type registry.

use std::collections::BTreeMap;

use tracing::debug;

use crate::controller::Controller;
use crate::error::ControllerError;
use crate::gravity_compensation::{self, GravityCompensationController};

/// Creates a fresh, uninitialized controller.
pub type ControllerFactory = fn() -> Box<dyn Controller>;

/// Maps controller type names to factories.
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    factories: BTreeMap<String, ControllerFactory>,
}

impl ControllerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every controller this crate ships.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(gravity_compensation::TYPE_NAME, new_gravity_compensation);
        registry
    }

    /// Register `factory` under `type_name`, replacing any previous entry.
    pub fn register(&mut self, type_name: &str, factory: ControllerFactory) {
        if self.factories.insert(type_name.to_owned(), factory).is_some() {
            debug!(type_name, "replaced controller factory");
        }
    }

    /// Instantiate a controller of `type_name`.
    pub fn create(&self, type_name: &str) -> Result<Box<dyn Controller>, ControllerError> {
        self.factories
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| ControllerError::UnknownControllerType(type_name.to_owned()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

fn new_gravity_compensation() -> Box<dyn Controller> {
    Box::new(GravityCompensationController::new())
}
