//! Controller error types.

use gravcomp_dynamics::DynamicsError;
use gravcomp_hardware::HardwareInterfaceError;

/// Errors that stop a controller from being created or initialized.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The robot description parameter is absent or not a string.
    #[error("failed to read robot description from parameter '{0}'")]
    MissingDescription(String),

    /// The description could not be turned into a dynamics model.
    #[error("failed to load dynamics model: {0}")]
    ModelLoad(#[source] DynamicsError),

    /// No `joints` list in the controller's namespace.
    #[error("could not find 'joints' parameter (namespace: {0})")]
    MissingJoints(String),

    /// A configured joint has no DOF in the model.
    #[error("dynamics model has no DOF named '{0}'")]
    UnknownDof(String),

    /// A joint is listed more than once.
    #[error("joint '{0}' listed more than once in 'joints'")]
    DuplicateDof(String),

    /// The hardware lacks a required interface.
    #[error("hardware does not provide {0}")]
    MissingInterface(&'static str),

    /// A controlled joint has no command handle.
    #[error("no command handle for joint '{joint}': {source}")]
    MissingCommandHandle {
        joint: String,
        #[source]
        source: HardwareInterfaceError,
    },

    /// No factory registered under this controller type.
    #[error("unknown controller type '{0}'")]
    UnknownControllerType(String),

    /// The controller namespace has no `type` parameter.
    #[error("controller '{0}' has no 'type' parameter")]
    MissingControllerType(String),

    /// A controller with this name is already loaded.
    #[error("controller '{0}' is already loaded")]
    AlreadyLoaded(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
