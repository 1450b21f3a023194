//! Gravity compensation: command each controlled joint with the torque that
//! holds the robot still against gravity at its current state.
//!
//! Every cycle the sensed positions and velocities are copied into a
//! dynamics model, controlled accelerations are pinned to zero, inverse
//! dynamics is evaluated over the whole model, and the resulting generalized
//! forces are written out as effort commands.

use std::time::Duration;

use tracing::{debug, info, warn};

use gravcomp_core::config::{ParamSource, resolve_key};
use gravcomp_core::time::ControlTime;
use gravcomp_dynamics::{
    DofGroup, DofIndex, DynamicsError, DynamicsModel, ModelLoader, UrdfModelLoader,
};
use gravcomp_hardware::{EffortJointInterface, JointHandle, JointStateHandle, RobotHw};
use gravcomp_urdf::{PackageResourceRetriever, ResourceRetriever};

use crate::controller::Controller;
use crate::error::ControllerError;

/// Type name the controller registers under.
pub const TYPE_NAME: &str = "gravcomp_controllers/GravityCompensationController";

/// Parameter naming the key that holds the robot description.
pub const DESCRIPTION_PARAM_KEY: &str = "robot_description_parameter";

/// Description key used when [`DESCRIPTION_PARAM_KEY`] is absent.
pub const DEFAULT_DESCRIPTION_PARAM: &str = "/robot_description";

/// Parameter holding the ordered list of controlled joints.
pub const JOINTS_KEY: &str = "joints";

/// Missing-DOF anomalies are logged on the first occurrence and then once
/// per this many.
const MISSING_DOF_LOG_EVERY: u64 = 1000;

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// Everything built by a successful initialization.
struct Runtime<M> {
    model: M,
    group: DofGroup,
    /// One per controlled DOF, in group order.
    command_handles: Vec<JointHandle>,
    /// Non-controlled DOFs with a state handle.
    state_handles: Vec<(DofIndex, JointStateHandle)>,
    missing_dof_events: u64,
}

impl<M: DynamicsModel> Runtime<M> {
    fn update(&mut self) {
        for (index, handle) in &self.state_handles {
            match self.model.dof_mut(*index) {
                Some(dof) => {
                    dof.position = handle.position();
                    dof.velocity = handle.velocity();
                }
                None => note_missing_dof(&mut self.missing_dof_events, handle.name()),
            }
        }

        for (handle, index) in self.command_handles.iter().zip(self.group.indices()) {
            match self.model.dof_mut(*index) {
                Some(dof) => {
                    dof.position = handle.position();
                    dof.velocity = handle.velocity();
                    dof.acceleration = 0.0;
                }
                None => note_missing_dof(&mut self.missing_dof_events, handle.name()),
            }
        }

        self.model.compute_inverse_dynamics();

        for (handle, index) in self.command_handles.iter().zip(self.group.indices()) {
            match self.model.dof(*index) {
                Some(dof) => handle.set_command(dof.force),
                None => note_missing_dof(&mut self.missing_dof_events, handle.name()),
            }
        }
    }
}

/// Whether the `events`-th missing-DOF anomaly is logged.
const fn logs_missing_dof(events: u64) -> bool {
    events % MISSING_DOF_LOG_EVERY == 1
}

fn note_missing_dof(events: &mut u64, dof: &str) {
    *events += 1;
    if logs_missing_dof(*events) {
        warn!(dof, count = *events, "DOF missing from dynamics model; skipped this cycle");
    }
}

// ---------------------------------------------------------------------------
// GravityCompensationController
// ---------------------------------------------------------------------------

/// Effort controller that cancels gravity on a set of joints.
///
/// Parameters, relative to the controller namespace:
///
/// | key | meaning |
/// |---|---|
/// | `robot_description_parameter` | key of the URDF text (default `/robot_description`) |
/// | `joints` | ordered list of controlled joint names (required) |
///
/// The dynamics engine is chosen by the [`ModelLoader`] type parameter.
pub struct GravityCompensationController<L: ModelLoader = UrdfModelLoader> {
    loader: L,
    retriever: Box<dyn ResourceRetriever>,
    runtime: Option<Runtime<L::Model>>,
    idle_update_logged: bool,
}

impl GravityCompensationController<UrdfModelLoader> {
    /// URDF-backed controller resolving `package://` URIs from the
    /// environment.
    pub fn new() -> Self {
        Self::with_loader(UrdfModelLoader::new())
    }
}

impl Default for GravityCompensationController<UrdfModelLoader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ModelLoader> GravityCompensationController<L> {
    pub fn with_loader(loader: L) -> Self {
        Self {
            loader,
            retriever: Box::new(PackageResourceRetriever::from_env()),
            runtime: None,
            idle_update_logged: false,
        }
    }

    /// Builder: resolve description resources through `retriever`.
    #[must_use]
    pub fn with_retriever(mut self, retriever: impl ResourceRetriever + 'static) -> Self {
        self.retriever = Box::new(retriever);
        self
    }

    /// Controlled joint names in command order. Empty before initialization.
    pub fn controlled_dof_names(&self) -> &[String] {
        match &self.runtime {
            Some(rt) => rt.group.names(),
            None => &[],
        }
    }

    /// Position of `name` in the controlled order.
    pub fn controlled_index(&self, name: &str) -> Option<usize> {
        self.runtime.as_ref()?.group.position(name)
    }

    /// Non-controlled DOFs whose state is read from hardware, in model order.
    pub fn state_synced_dofs(&self) -> Vec<&str> {
        self.runtime.as_ref().map_or_else(Vec::new, |rt| {
            rt.state_handles.iter().map(|(_, h)| h.name()).collect()
        })
    }

    /// DOF lookups that failed during updates since initialization.
    pub fn missing_dof_events(&self) -> u64 {
        self.runtime.as_ref().map_or(0, |rt| rt.missing_dof_events)
    }

    pub fn model(&self) -> Option<&L::Model> {
        self.runtime.as_ref().map(|rt| &rt.model)
    }

    pub fn model_mut(&mut self) -> Option<&mut L::Model> {
        self.runtime.as_mut().map(|rt| &mut rt.model)
    }

    fn build_runtime(
        &self,
        hw: &dyn RobotHw,
        params: &dyn ParamSource,
    ) -> Result<Runtime<L::Model>, ControllerError> {
        let namespace = params.namespace();

        let description_key = params.get_str_or(DESCRIPTION_PARAM_KEY, DEFAULT_DESCRIPTION_PARAM);
        let description = params.get_str(description_key).ok_or_else(|| {
            ControllerError::MissingDescription(resolve_key(namespace, description_key))
        })?;

        info!("Loading dynamics model from URDF...");
        let model = self
            .loader
            .load(description, self.retriever.as_ref())
            .map_err(ControllerError::ModelLoad)?;
        info!("Loading dynamics model from URDF...DONE");

        let joints = params
            .get_string_list(JOINTS_KEY)
            .ok_or_else(|| ControllerError::MissingJoints(namespace.to_owned()))?;

        let group = DofGroup::resolve(&model, joints.as_slice()).map_err(|e| match e {
            DynamicsError::UnknownDof(name) => ControllerError::UnknownDof(name),
            DynamicsError::DuplicateDof(name) => ControllerError::DuplicateDof(name),
            other => ControllerError::ModelLoad(other),
        })?;

        let command_handles = if group.is_empty() {
            Vec::new()
        } else {
            let effort = hw
                .effort_joint_interface()
                .ok_or(ControllerError::MissingInterface(EffortJointInterface::NAME))?;
            group
                .names()
                .iter()
                .map(|joint| {
                    effort
                        .get_handle(joint)
                        .map_err(|source| ControllerError::MissingCommandHandle {
                            joint: joint.clone(),
                            source,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let state_handles = acquire_state_handles(hw, &model, &group);

        Ok(Runtime {
            model,
            group,
            command_handles,
            state_handles,
            missing_dof_events: 0,
        })
    }
}

/// Try to get a read-only handle for every model DOF. Misses are logged and
/// skipped. Controlled DOFs are read through their command handles, so their
/// state handles are not kept.
fn acquire_state_handles<M: DynamicsModel>(
    hw: &dyn RobotHw,
    model: &M,
    group: &DofGroup,
) -> Vec<(DofIndex, JointStateHandle)> {
    let Some(interface) = hw.joint_state_interface() else {
        warn!(
            "hardware has no joint state interface; uncontrolled DOFs are treated as if always \
             in default position, velocity, and acceleration"
        );
        return Vec::new();
    };

    let mut handles = Vec::new();
    for index in (0..model.num_dofs()).map(DofIndex) {
        let Some(name) = model.dof_name(index) else {
            continue;
        };
        let controlled = group.contains(index);
        match interface.get_handle(name) {
            Ok(_) if controlled => {}
            Ok(handle) => handles.push((index, handle)),
            Err(e) if controlled => {
                debug!(dof = name, "{e}; state comes from its command handle");
            }
            Err(e) => {
                warn!(
                    dof = name,
                    "{e}; treated as if always in default position, velocity, and acceleration"
                );
            }
        }
    }
    handles
}

impl<L: ModelLoader> Controller for GravityCompensationController<L> {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        TYPE_NAME
    }

    fn initialize(
        &mut self,
        hw: &dyn RobotHw,
        params: &dyn ParamSource,
    ) -> Result<(), ControllerError> {
        match self.build_runtime(hw, params) {
            Ok(runtime) => {
                info!(
                    namespace = params.namespace(),
                    controlled = runtime.group.len(),
                    state_synced = runtime.state_handles.len(),
                    model_dofs = runtime.model.num_dofs(),
                    "gravity compensation initialized"
                );
                self.runtime = Some(runtime);
                self.idle_update_logged = false;
                Ok(())
            }
            Err(e) => {
                self.runtime = None;
                Err(e)
            }
        }
    }

    fn update(&mut self, _time: ControlTime, _period: Duration) {
        match self.runtime.as_mut() {
            Some(runtime) => runtime.update(),
            None if !self.idle_update_logged => {
                debug!("update before successful initialization; ignored");
                self.idle_update_logged = true;
            }
            None => {}
        }
    }

    fn is_initialized(&self) -> bool {
        self.runtime.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gravcomp_core::config::ParamStore;
    use gravcomp_test_utils::{MockLoader, MockModel, controller_params, hardware, set_states};
    use gravcomp_urdf::LocalResourceRetriever;

    const NS: &str = "gc";

    fn mock_controller(model: MockModel) -> GravityCompensationController<MockLoader> {
        GravityCompensationController::with_loader(MockLoader::new(model))
            .with_retriever(LocalResourceRetriever::new())
    }

    fn arm_model() -> MockModel {
        MockModel::new(&["shoulder", "elbow", "wrist"]).with_forces(&[-4.0, -1.5, 0.25])
    }

    fn tick(c: &mut impl Controller) {
        c.update(ControlTime::from_secs(0.001), Duration::from_millis(1));
    }

    // -- initialize --

    #[test]
    fn initialize_orders_controlled_dofs_by_config() {
        let mut c = mock_controller(arm_model());
        let hw = hardware(&["shoulder", "elbow"], &["wrist"]);
        let params = controller_params(NS, "<robot/>", &["elbow", "shoulder"]);
        c.initialize(&hw, &params.scope(NS)).unwrap();

        assert!(c.is_initialized());
        assert_eq!(c.controlled_dof_names(), &["elbow".to_owned(), "shoulder".to_owned()]);
        assert_eq!(c.controlled_index("shoulder"), Some(1));
        assert_eq!(c.controlled_index("wrist"), None);
        assert_eq!(c.state_synced_dofs(), vec!["wrist"]);
    }

    #[test]
    fn missing_description_fails() {
        let mut c = mock_controller(arm_model());
        let params = ParamStore::new().with("/gc/joints", vec!["elbow"]);
        let err = c.initialize(&hardware(&["elbow"], &[]), &params.scope(NS)).unwrap_err();
        assert!(matches!(err, ControllerError::MissingDescription(ref k) if k == "/robot_description"));
        assert!(!c.is_initialized());
    }

    #[test]
    fn description_key_is_configurable() {
        let mut c = mock_controller(arm_model());
        let params = ParamStore::new()
            .with("/gc/robot_description_parameter", "urdf")
            .with("/gc/urdf", "<robot/>")
            .with("/gc/joints", vec!["elbow"]);
        c.initialize(&hardware(&["elbow"], &[]), &params.scope(NS)).unwrap();
        assert!(c.is_initialized());
    }

    #[test]
    fn model_load_failure_fails() {
        let mut c = GravityCompensationController::with_loader(MockLoader::failing());
        let params = controller_params(NS, "<robot/>", &["elbow"]);
        let err = c.initialize(&hardware(&["elbow"], &[]), &params.scope(NS)).unwrap_err();
        assert!(matches!(err, ControllerError::ModelLoad(_)));
    }

    #[test]
    fn missing_joints_names_namespace() {
        let mut c = mock_controller(arm_model());
        let params = ParamStore::new().with("/robot_description", "<robot/>");
        let err = c.initialize(&hardware(&["elbow"], &[]), &params.scope(NS)).unwrap_err();
        assert!(matches!(err, ControllerError::MissingJoints(ref ns) if ns == "/gc"));
    }

    #[test]
    fn joints_of_wrong_type_fail() {
        let mut c = mock_controller(arm_model());
        let params = ParamStore::new()
            .with("/robot_description", "<robot/>")
            .with("/gc/joints", "elbow");
        let err = c.initialize(&hardware(&["elbow"], &[]), &params.scope(NS)).unwrap_err();
        assert!(matches!(err, ControllerError::MissingJoints(_)));
    }

    #[test]
    fn unknown_dof_fails() {
        let mut c = mock_controller(arm_model());
        let params = controller_params(NS, "<robot/>", &["shoulder", "gripper"]);
        let hw = hardware(&["shoulder", "gripper"], &[]);
        let err = c.initialize(&hw, &params.scope(NS)).unwrap_err();
        assert!(matches!(err, ControllerError::UnknownDof(ref n) if n == "gripper"));
    }

    #[test]
    fn duplicate_dof_fails() {
        let mut c = mock_controller(arm_model());
        let params = controller_params(NS, "<robot/>", &["elbow", "elbow"]);
        let err = c.initialize(&hardware(&["elbow"], &[]), &params.scope(NS)).unwrap_err();
        assert!(matches!(err, ControllerError::DuplicateDof(ref n) if n == "elbow"));
    }

    #[test]
    fn missing_effort_interface_fails() {
        let mut c = mock_controller(arm_model());
        let params = controller_params(NS, "<robot/>", &["elbow"]);
        let err = c.initialize(&hardware(&[], &["elbow"]), &params.scope(NS)).unwrap_err();
        assert!(matches!(err, ControllerError::MissingInterface("EffortJointInterface")));
    }

    #[test]
    fn empty_joint_list_needs_no_effort_interface() {
        let mut c = mock_controller(arm_model());
        let hw = hardware(&[], &["wrist"]);
        let params = controller_params(NS, "<robot/>", &[]);
        c.initialize(&hw, &params.scope(NS)).unwrap();

        assert!(c.is_initialized());
        assert!(c.controlled_dof_names().is_empty());
        assert_eq!(c.state_synced_dofs(), vec!["wrist"]);
        tick(&mut c);
        assert_eq!(c.missing_dof_events(), 0);
    }

    #[test]
    fn missing_command_handle_fails() {
        let mut c = mock_controller(arm_model());
        let params = controller_params(NS, "<robot/>", &["shoulder", "elbow"]);
        let err = c.initialize(&hardware(&["shoulder"], &[]), &params.scope(NS)).unwrap_err();
        assert!(matches!(
            err,
            ControllerError::MissingCommandHandle { ref joint, .. } if joint == "elbow"
        ));
    }

    #[test]
    fn missing_state_interface_is_soft() {
        let mut c = mock_controller(arm_model());
        let params = controller_params(NS, "<robot/>", &["shoulder"]);
        c.initialize(&hardware(&["shoulder"], &[]), &params.scope(NS)).unwrap();
        assert!(c.state_synced_dofs().is_empty());
    }

    #[test]
    fn failed_reinitialize_leaves_controller_uninitialized() {
        let mut c = mock_controller(arm_model());
        let hw = hardware(&["shoulder"], &[]);
        c.initialize(&hw, &controller_params(NS, "<robot/>", &["shoulder"]).scope(NS))
            .unwrap();
        assert!(c.is_initialized());

        let bad = controller_params(NS, "<robot/>", &["gripper"]);
        assert!(c.initialize(&hw, &bad.scope(NS)).is_err());
        assert!(!c.is_initialized());
        assert!(c.controlled_dof_names().is_empty());
    }

    // -- update --

    #[test]
    fn update_writes_forces_in_controlled_order() {
        let mut c = mock_controller(arm_model());
        let hw = hardware(&["shoulder", "elbow"], &["wrist"]);
        let params = controller_params(NS, "<robot/>", &["elbow", "shoulder"]);
        c.initialize(&hw, &params.scope(NS)).unwrap();

        tick(&mut c);
        assert_eq!(hw.command("elbow"), Some(-1.5));
        assert_eq!(hw.command("shoulder"), Some(-4.0));
        assert_eq!(hw.command("wrist"), Some(0.0));
    }

    #[test]
    fn update_feeds_sensed_state_and_zero_acceleration() {
        let mut c = mock_controller(arm_model());
        let hw = hardware(&["shoulder", "elbow"], &["wrist"]);
        let params = controller_params(NS, "<robot/>", &["shoulder", "elbow"]);
        c.initialize(&hw, &params.scope(NS)).unwrap();

        c.model_mut().unwrap().dof_mut(DofIndex(0)).unwrap().acceleration = 3.0;
        set_states(&hw, &[("shoulder", 0.2, 0.1), ("elbow", -0.4, 0.0), ("wrist", 1.1, 0.5)]);
        tick(&mut c);

        let model = c.model().unwrap();
        let seen = &model.solves()[0];
        assert_relative_eq!(seen[0].position, 0.2);
        assert_relative_eq!(seen[0].velocity, 0.1);
        assert_relative_eq!(seen[0].acceleration, 0.0);
        assert_relative_eq!(seen[1].position, -0.4);
        assert_relative_eq!(seen[1].acceleration, 0.0);
        assert_relative_eq!(seen[2].position, 1.1);
        assert_relative_eq!(seen[2].velocity, 0.5);
    }

    #[test]
    fn dof_without_state_handle_keeps_default_state() {
        let mut c = mock_controller(arm_model());
        let hw = hardware(&["shoulder"], &[]);
        let params = controller_params(NS, "<robot/>", &["shoulder"]);
        c.initialize(&hw, &params.scope(NS)).unwrap();
        tick(&mut c);
        let seen = &c.model().unwrap().solves()[0];
        assert_relative_eq!(seen[2].position, 0.0);
        assert_relative_eq!(seen[2].velocity, 0.0);
    }

    #[test]
    fn controlled_dof_state_comes_from_command_handle() {
        // elbow is controlled and also has a state handle; only the command
        // handle feeds it.
        let mut c = mock_controller(arm_model());
        let hw = hardware(&["elbow"], &["elbow", "wrist"]);
        let params = controller_params(NS, "<robot/>", &["elbow"]);
        c.initialize(&hw, &params.scope(NS)).unwrap();
        assert_eq!(c.state_synced_dofs(), vec!["wrist"]);
    }

    #[test]
    fn update_before_initialize_is_noop() {
        let mut c = mock_controller(arm_model());
        tick(&mut c);
        tick(&mut c);
        assert!(!c.is_initialized());
        assert!(c.model().is_none());
        assert_eq!(c.missing_dof_events(), 0);
    }

    #[test]
    fn vanished_dof_is_skipped_and_counted() {
        let mut c = mock_controller(arm_model());
        let hw = hardware(&["shoulder", "elbow"], &[]);
        let params = controller_params(NS, "<robot/>", &["shoulder", "elbow"]);
        c.initialize(&hw, &params.scope(NS)).unwrap();

        c.model_mut().unwrap().hide_dof("elbow");
        tick(&mut c);

        // Both the state write and the command read miss.
        assert_eq!(c.missing_dof_events(), 2);
        assert_eq!(hw.command("shoulder"), Some(-4.0));
        assert_eq!(hw.command("elbow"), Some(0.0));

        tick(&mut c);
        assert_eq!(c.missing_dof_events(), 4);
    }

    #[test]
    fn missing_dof_counter_counts_every_event() {
        let mut events = 0;
        for _ in 0..2001 {
            note_missing_dof(&mut events, "elbow");
        }
        assert_eq!(events, 2001);
    }

    #[test]
    fn missing_dof_warning_is_throttled() {
        let logged: Vec<u64> = (1..=3001).filter(|&n| logs_missing_dof(n)).collect();
        assert_eq!(logged, vec![1, 1001, 2001, 3001]);
        assert!(!logs_missing_dof(0));
        assert!(!logs_missing_dof(2));
        assert!(!logs_missing_dof(1000));
    }

    #[test]
    fn name_is_type_name() {
        let c = GravityCompensationController::new();
        assert_eq!(c.name(), TYPE_NAME);
        assert!(!c.is_initialized());
        assert!(c.controlled_dof_names().is_empty());
        assert_eq!(c.state_synced_dofs(), Vec::<&str>::new());
    }
}
