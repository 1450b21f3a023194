//! Controller lifecycle trait.

use std::time::Duration;

use gravcomp_core::config::ParamSource;
use gravcomp_core::time::ControlTime;
use gravcomp_hardware::RobotHw;

use crate::error::ControllerError;

/// A real-time controller driven by a host loop.
///
/// The host calls [`initialize`](Self::initialize) once, then
/// [`starting`](Self::starting), then [`update`](Self::update) every cycle,
/// then [`stopping`](Self::stopping). `update` must not block, allocate or
/// perform I/O.
pub trait Controller: Send {
    /// Registered type name.
    fn name(&self) -> &str;

    /// Acquire resources from `hw` and configuration from `params`, which is
    /// scoped to the controller's namespace.
    fn initialize(
        &mut self,
        hw: &dyn RobotHw,
        params: &dyn ParamSource,
    ) -> Result<(), ControllerError>;

    /// Called once before the first update.
    fn starting(&mut self, _time: ControlTime) {}

    /// One control cycle.
    fn update(&mut self, time: ControlTime, period: Duration);

    /// Called once after the last update.
    fn stopping(&mut self, _time: ControlTime) {}

    fn is_initialized(&self) -> bool;
}
