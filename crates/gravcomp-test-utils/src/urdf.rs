//! Robot descriptions used across the workspace's tests.

/// Mass of the [`PENDULUM_URDF`] bob (kg).
pub const PENDULUM_MASS: f64 = 1.5;

/// Distance from the [`PENDULUM_URDF`] hinge to the bob's center of mass (m).
pub const PENDULUM_COM: f64 = 0.4;

/// Single link on a y-axis hinge called `shoulder`, COM at
/// [`PENDULUM_COM`] along the link's x axis.
///
/// Holding torque under standard gravity is `-m g l cos(q)`.
pub const PENDULUM_URDF: &str = r#"
<robot name="pendulum">
    <link name="world"/>
    <link name="arm">
        <inertial>
            <origin xyz="0.4 0 0"/>
            <mass value="1.5"/>
            <inertia ixx="0.001" ixy="0" ixz="0" iyy="0.002" iyz="0" izz="0.002"/>
        </inertial>
        <visual>
            <geometry><mesh filename="package://pendulum_description/meshes/arm.stl"/></geometry>
        </visual>
    </link>
    <joint name="shoulder" type="revolute">
        <parent link="world"/>
        <child link="arm"/>
        <axis xyz="0 1 0"/>
        <limit lower="-3.14" upper="3.14" effort="50" velocity="3"/>
    </joint>
</robot>
"#;

/// Three-joint arm: `shoulder` and `elbow` pitch about y, `wrist` rolls about
/// x, and a fixed `tool_mount` carries a small tool mass.
///
/// Model DOF order is `shoulder`, `elbow`, `wrist`.
pub const ARM_URDF: &str = r#"
<robot name="arm">
    <link name="base"/>
    <link name="upper_arm">
        <inertial>
            <origin xyz="0.15 0 0"/>
            <mass value="2.0"/>
            <inertia ixx="0.002" ixy="0" ixz="0" iyy="0.015" iyz="0" izz="0.015"/>
        </inertial>
    </link>
    <link name="forearm">
        <inertial>
            <origin xyz="0.12 0 0"/>
            <mass value="1.2"/>
            <inertia ixx="0.001" ixy="0" ixz="0" iyy="0.006" iyz="0" izz="0.006"/>
        </inertial>
    </link>
    <link name="hand">
        <inertial>
            <origin xyz="0.03 0 0"/>
            <mass value="0.4"/>
            <inertia ixx="0.0004" ixy="0" ixz="0" iyy="0.0004" iyz="0" izz="0.0004"/>
        </inertial>
    </link>
    <link name="tool">
        <inertial>
            <mass value="0.2"/>
            <inertia ixx="0.0001" ixy="0" ixz="0" iyy="0.0001" iyz="0" izz="0.0001"/>
        </inertial>
    </link>
    <joint name="shoulder" type="revolute">
        <parent link="base"/>
        <child link="upper_arm"/>
        <origin xyz="0 0 0.1"/>
        <axis xyz="0 1 0"/>
        <limit lower="-1.57" upper="1.57" effort="100" velocity="2"/>
    </joint>
    <joint name="elbow" type="revolute">
        <parent link="upper_arm"/>
        <child link="forearm"/>
        <origin xyz="0.3 0 0"/>
        <axis xyz="0 1 0"/>
        <limit lower="-2.5" upper="2.5" effort="60" velocity="2"/>
    </joint>
    <joint name="wrist" type="continuous">
        <parent link="forearm"/>
        <child link="hand"/>
        <origin xyz="0.25 0 0"/>
        <axis xyz="1 0 0"/>
    </joint>
    <joint name="tool_mount" type="fixed">
        <parent link="hand"/>
        <child link="tool"/>
        <origin xyz="0.08 0 0"/>
    </joint>
</robot>
"#;
