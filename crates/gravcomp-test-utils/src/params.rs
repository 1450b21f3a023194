//! Parameter store builders.

use gravcomp_core::config::ParamStore;

/// Type name the built-in gravity compensation controller registers under.
pub const GRAVCOMP_TYPE: &str = "gravcomp_controllers/GravityCompensationController";

/// Store holding `urdf` at `/robot_description` and `joints` under
/// `/<namespace>/joints`.
pub fn controller_params(namespace: &str, urdf: &str, joints: &[&str]) -> ParamStore {
    ParamStore::new()
        .with("/robot_description", urdf)
        .with(&format!("/{namespace}/joints"), joints_value(joints))
}

/// Like [`controller_params`], plus `/<namespace>/type` set to the built-in
/// gravity compensation controller, as a controller manager expects.
pub fn managed_controller_params(namespace: &str, urdf: &str, joints: &[&str]) -> ParamStore {
    controller_params(namespace, urdf, joints).with(&format!("/{namespace}/type"), GRAVCOMP_TYPE)
}

fn joints_value(joints: &[&str]) -> Vec<String> {
    joints.iter().map(|j| (*j).to_owned()).collect()
}
