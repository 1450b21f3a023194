//! Simulated hardware builders.

use gravcomp_hardware::RobotHardware;

/// Hardware exposing `effort` joints through the effort interface and
/// `state` joints through the joint state interface. A name may appear in
/// both lists; it then shares one slot.
pub fn hardware(effort: &[&str], state: &[&str]) -> RobotHardware {
    let mut hw = RobotHardware::new();
    for name in effort {
        hw.register_effort_joint(name)
            .unwrap_or_else(|e| panic!("fixture hardware: {e}"));
    }
    for name in state {
        hw.register_state_joint(name)
            .unwrap_or_else(|e| panic!("fixture hardware: {e}"));
    }
    hw
}

/// Publish `(name, position, velocity)` triples to `hw`.
pub fn set_states(hw: &RobotHardware, states: &[(&str, f64, f64)]) {
    for (name, position, velocity) in states {
        hw.set_joint_state(name, *position, *velocity)
            .unwrap_or_else(|e| panic!("fixture hardware: {e}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gravcomp_hardware::RobotHw;

    #[test]
    fn hardware_split_interfaces() {
        let hw = hardware(&["shoulder", "elbow"], &["wrist", "elbow"]);
        let effort = hw.effort_joint_interface().unwrap();
        let state = hw.joint_state_interface().unwrap();
        assert_eq!(effort.names().collect::<Vec<_>>(), vec!["elbow", "shoulder"]);
        assert_eq!(state.names().collect::<Vec<_>>(), vec!["elbow", "wrist"]);

        set_states(&hw, &[("elbow", 0.3, 0.1)]);
        assert!((state.get_handle("elbow").unwrap().position() - 0.3).abs() < f64::EPSILON);
        assert!((effort.get_handle("elbow").unwrap().velocity() - 0.1).abs() < f64::EPSILON);
    }
}
