/// Errors raised by hardware interfaces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HardwareInterfaceError {
    #[error("{interface} has no handle named '{name}'")]
    UnknownHandle {
        interface: &'static str,
        name: String,
    },

    #[error("{interface} already has a handle named '{name}'")]
    DuplicateHandle {
        interface: &'static str,
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = HardwareInterfaceError::UnknownHandle {
            interface: "EffortJointInterface",
            name: "elbow".into(),
        };
        assert_eq!(e.to_string(), "EffortJointInterface has no handle named 'elbow'");

        let e = HardwareInterfaceError::DuplicateHandle {
            interface: "JointStateInterface",
            name: "wrist".into(),
        };
        assert_eq!(
            e.to_string(),
            "JointStateInterface already has a handle named 'wrist'"
        );
    }
}
