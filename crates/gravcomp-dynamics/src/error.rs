use gravcomp_urdf::UrdfError;

/// Errors raised while building or querying a dynamics model.
#[derive(Debug, thiserror::Error)]
pub enum DynamicsError {
    #[error("robot description error: {0}")]
    Description(#[from] UrdfError),

    #[error("joint '{joint}' has unsupported type '{kind}'")]
    UnsupportedJoint { joint: String, kind: &'static str },

    #[error("invalid kinematic tree: {0}")]
    InvalidTree(String),

    #[error("joint axis of '{0}' has zero length")]
    DegenerateAxis(String),

    #[error("no DOF named '{0}' in model")]
    UnknownDof(String),

    #[error("DOF '{0}' listed more than once")]
    DuplicateDof(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = DynamicsError::UnsupportedJoint {
            joint: "base_float".into(),
            kind: "floating",
        };
        assert_eq!(
            e.to_string(),
            "joint 'base_float' has unsupported type 'floating'"
        );
        assert_eq!(
            DynamicsError::UnknownDof("elbow".into()).to_string(),
            "no DOF named 'elbow' in model"
        );
    }

    #[test]
    fn from_urdf_error() {
        let e: DynamicsError = UrdfError::NoRootLink.into();
        assert!(matches!(e, DynamicsError::Description(UrdfError::NoRootLink)));
    }
}
