//! Loads controllers by name from a parameter store and ticks them.

use std::time::Duration;

use tracing::{info, warn};

use gravcomp_core::config::{ParamSource, ParamStore};
use gravcomp_core::time::ControlTime;
use gravcomp_hardware::RobotHw;

use crate::controller::Controller;
use crate::error::ControllerError;
use crate::registry::ControllerRegistry;

/// Parameter, inside a controller's namespace, naming its registered type.
pub const TYPE_KEY: &str = "type";

/// Owns loaded controllers and drives them in load order.
///
/// A controller named `name` is configured from the `/<name>` namespace of
/// the parameter store: `/<name>/type` picks the factory, everything else is
/// handed to the controller's own initialization.
pub struct ControllerManager {
    registry: ControllerRegistry,
    controllers: Vec<(String, Box<dyn Controller>)>,
}

impl ControllerManager {
    pub const fn new(registry: ControllerRegistry) -> Self {
        Self {
            registry,
            controllers: Vec::new(),
        }
    }

    /// Create, initialize and keep the controller called `name`.
    ///
    /// Nothing is kept if any step fails.
    pub fn load_controller(
        &mut self,
        name: &str,
        hw: &dyn RobotHw,
        params: &ParamStore,
    ) -> Result<(), ControllerError> {
        if self.controller(name).is_some() {
            return Err(ControllerError::AlreadyLoaded(name.to_owned()));
        }

        let scoped = params.scope(name);
        let type_name = scoped
            .get_str(TYPE_KEY)
            .ok_or_else(|| ControllerError::MissingControllerType(name.to_owned()))?;

        let mut controller = self.registry.create(type_name)?;
        if let Err(e) = controller.initialize(hw, &scoped) {
            warn!(controller = name, type_name, "initialization failed: {e}");
            return Err(e);
        }

        info!(controller = name, type_name, "loaded controller");
        self.controllers.push((name.to_owned(), controller));
        Ok(())
    }

    /// Drop the controller called `name`. Returns whether it was loaded.
    pub fn unload_controller(&mut self, name: &str) -> bool {
        let before = self.controllers.len();
        self.controllers.retain(|(n, _)| n != name);
        before != self.controllers.len()
    }

    pub fn controller(&self, name: &str) -> Option<&dyn Controller> {
        self.controllers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_ref())
    }

    /// Loaded controller names in load order.
    pub fn controller_names(&self) -> impl Iterator<Item = &str> {
        self.controllers.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn starting(&mut self, time: ControlTime) {
        for (_, controller) in &mut self.controllers {
            controller.starting(time);
        }
    }

    /// Tick every loaded controller, in load order.
    pub fn update(&mut self, time: ControlTime, period: Duration) {
        for (_, controller) in &mut self.controllers {
            controller.update(time, period);
        }
    }

    pub fn stopping(&mut self, time: ControlTime) {
        for (_, controller) in &mut self.controllers {
            controller.stopping(time);
        }
    }
}

impl Default for ControllerManager {
    fn default() -> Self {
        Self::new(ControllerRegistry::with_builtin())
    }
}
