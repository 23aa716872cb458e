//! URDF loading using `urdf-rs`.
//!
//! Every `<link>` becomes a [`Body`](crate::Body). The joint whose child is a
//! link supplies that body's parent and local offset (`origin xyz` plus the
//! fixed-axis `rpy` rotation), and is itself attached to the child body.

use std::collections::HashMap;
use std::path::Path;

use nalgebra::{UnitQuaternion, Vector3};

use crate::error::ModelError;
use crate::tree::{JointKind, JointLimits, Tree, TreeBuilder};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load a URDF file from disk into a [`Tree`].
pub fn load_urdf_file(path: impl AsRef<Path>) -> Result<Tree, ModelError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ModelError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_urdf_str(&content)
}

/// Load a URDF XML string into a [`Tree`].
pub fn load_urdf_str(xml: &str) -> Result<Tree, ModelError> {
    let robot = urdf_rs::read_from_string(xml).map_err(|e| ModelError::Parse(e.to_string()))?;
    let tree = convert_robot(&robot)?;
    tracing::debug!(
        robot = %tree.name,
        bodies = tree.len(),
        joints = tree.joint_count(),
        "loaded URDF"
    );
    Ok(tree)
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

fn convert_robot(robot: &urdf_rs::Robot) -> Result<Tree, ModelError> {
    // child link -> joint that attaches it
    let mut incoming: HashMap<&str, &urdf_rs::Joint> = HashMap::new();
    for joint in &robot.joints {
        if let Some(previous) = incoming.insert(joint.child.link.as_str(), joint) {
            return Err(ModelError::Parse(format!(
                "link {} is the child of both {} and {}",
                joint.child.link, previous.name, joint.name
            )));
        }
    }

    let mut builder = TreeBuilder::new(robot.name.clone());
    for link in &robot.links {
        match incoming.get(link.name.as_str()) {
            Some(joint) => {
                builder.body(
                    link.name.clone(),
                    vec3(&joint.origin.xyz),
                    rpy_to_quat(&joint.origin.rpy),
                    Some(joint.parent.link.as_str()),
                );
            }
            None => {
                builder.body(
                    link.name.clone(),
                    Vector3::zeros(),
                    UnitQuaternion::identity(),
                    None,
                );
            }
        }
    }

    for joint in &robot.joints {
        let kind = convert_joint_type(&joint.joint_type)?;
        let limits = match kind {
            JointKind::Hinge | JointKind::Prismatic => Some(convert_limits(&joint.limit)),
            JointKind::Ball | JointKind::Free | JointKind::Fixed => None,
        };
        builder.joint(joint.name.clone(), joint.child.link.clone(), kind, limits);
    }

    builder.build()
}

fn convert_joint_type(jt: &urdf_rs::JointType) -> Result<JointKind, ModelError> {
    match jt {
        urdf_rs::JointType::Revolute | urdf_rs::JointType::Continuous => Ok(JointKind::Hinge),
        urdf_rs::JointType::Prismatic => Ok(JointKind::Prismatic),
        urdf_rs::JointType::Fixed => Ok(JointKind::Fixed),
        urdf_rs::JointType::Floating => Ok(JointKind::Free),
        urdf_rs::JointType::Spherical => Ok(JointKind::Ball),
        urdf_rs::JointType::Planar => Err(ModelError::UnsupportedJointType("planar".into())),
    }
}

fn convert_limits(limit: &urdf_rs::JointLimit) -> JointLimits {
    // urdf-rs defaults lower/upper to 0.0 when the element is absent.
    let bounded = (limit.lower - limit.upper).abs() > f64::EPSILON;
    JointLimits {
        lower: bounded.then_some(limit.lower),
        upper: bounded.then_some(limit.upper),
        effort: limit.effort,
        velocity: limit.velocity,
    }
}

/// URDF `rpy` is roll about X, then pitch about Y, then yaw about Z, all in
/// the fixed parent frame.
fn rpy_to_quat(rpy: &[f64; 3]) -> UnitQuaternion<f64> {
    UnitQuaternion::from_euler_angles(rpy[0], rpy[1], rpy[2])
}

fn vec3(v: &[f64; 3]) -> Vector3<f64> {
    Vector3::new(v[0], v[1], v[2])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::BodyRole;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    const MINIMAL_URDF: &str = r#"
        <robot name="test_robot">
            <link name="base_link"/>
        </robot>
    "#;

    const LEG_URDF: &str = r#"
        <robot name="leg">
            <link name="pelvis"/>
            <link name="r_hip"/>
            <link name="r_upper_leg"/>
            <link name="r_foot"/>
            <joint name="r_hip_yaw" type="revolute">
                <parent link="pelvis"/>
                <child link="r_hip"/>
                <origin xyz="0 -0.1 -0.05" rpy="0 0 0"/>
                <axis xyz="0 0 1"/>
                <limit lower="-1.57" upper="1.57" effort="100" velocity="5"/>
            </joint>
            <joint name="r_knee" type="continuous">
                <parent link="r_hip"/>
                <child link="r_upper_leg"/>
                <origin xyz="0 0 -0.4" rpy="0 0 1.5707963267948966"/>
                <axis xyz="0 1 0"/>
            </joint>
            <joint name="r_ankle_fixed" type="fixed">
                <parent link="r_upper_leg"/>
                <child link="r_foot"/>
                <origin xyz="0 0 -0.4"/>
            </joint>
        </robot>
    "#;

    #[test]
    fn load_minimal_urdf() {
        let tree = load_urdf_str(MINIMAL_URDF).unwrap();
        assert_eq!(tree.name, "test_robot");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.joint_count(), 0);
        assert!(tree.body("base_link").unwrap().is_root());
    }

    #[test]
    fn links_become_bodies_with_joint_parents() {
        let tree = load_urdf_str(LEG_URDF).unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.joint_count(), 3);
        assert_eq!(tree.dof(), 2);

        let hip = tree.body("r_hip").unwrap();
        assert_eq!(hip.parent.as_deref(), Some("pelvis"));
        assert_eq!(hip.role, BodyRole::Hip);
        assert_relative_eq!(
            hip.local_translation(),
            Vector3::new(0.0, -0.1, -0.05),
            epsilon = 1e-12
        );

        let roots: Vec<&str> = tree.roots().map(|b| b.name.as_str()).collect();
        assert_eq!(roots, vec!["pelvis"]);
    }

    #[test]
    fn rpy_becomes_local_rotation() {
        let tree = load_urdf_str(LEG_URDF).unwrap();
        let knee = tree.body("r_upper_leg").unwrap();
        let rotated = knee.local_rotation() * Vector3::x();
        assert_relative_eq!(rotated, Vector3::y(), epsilon = 1e-9);
        assert_relative_eq!(knee.local_rotation().angle(), FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn joint_kinds_and_limits() {
        let tree = load_urdf_str(LEG_URDF).unwrap();

        let yaw = tree.joint("r_hip_yaw").unwrap();
        assert_eq!(yaw.kind, JointKind::Hinge);
        assert_eq!(yaw.body, "r_hip");
        let lim = yaw.limits.as_ref().unwrap();
        assert!((lim.lower.unwrap() + 1.57).abs() < 1e-12);
        assert!((lim.upper.unwrap() - 1.57).abs() < 1e-12);
        assert!((lim.effort - 100.0).abs() < f64::EPSILON);
        assert!((lim.velocity - 5.0).abs() < f64::EPSILON);

        let knee = tree.joint("r_knee").unwrap();
        assert_eq!(knee.kind, JointKind::Hinge);
        let lim = knee.limits.as_ref().unwrap();
        assert!(lim.lower.is_none());
        assert!(lim.upper.is_none());

        let fixed = tree.joint("r_ankle_fixed").unwrap();
        assert_eq!(fixed.kind, JointKind::Fixed);
        assert!(fixed.limits.is_none());
    }

    #[test]
    fn spherical_maps_to_ball() {
        let xml = r#"
            <robot name="ball">
                <link name="torso"/>
                <link name="l_prox_shoulder"/>
                <joint name="l_shoulder" type="spherical">
                    <parent link="torso"/>
                    <child link="l_prox_shoulder"/>
                </joint>
            </robot>
        "#;
        let tree = load_urdf_str(xml).unwrap();
        assert_eq!(tree.joint("l_shoulder").unwrap().kind, JointKind::Ball);
    }

    #[test]
    fn planar_is_unsupported() {
        let xml = r#"
            <robot name="planar">
                <link name="a"/>
                <link name="b"/>
                <joint name="slide" type="planar">
                    <parent link="a"/>
                    <child link="b"/>
                </joint>
            </robot>
        "#;
        assert!(matches!(
            load_urdf_str(xml),
            Err(ModelError::UnsupportedJointType(_))
        ));
    }

    #[test]
    fn unknown_parent_link_is_dangling() {
        let xml = r#"
            <robot name="broken">
                <link name="b"/>
                <joint name="j" type="fixed">
                    <parent link="ghost"/>
                    <child link="b"/>
                </joint>
            </robot>
        "#;
        assert!(matches!(
            load_urdf_str(xml),
            Err(ModelError::DanglingParent { ref parent, .. }) if parent == "ghost"
        ));
    }

    #[test]
    fn link_with_two_parents_rejected() {
        let xml = r#"
            <robot name="diamond">
                <link name="a"/>
                <link name="b"/>
                <link name="c"/>
                <joint name="j1" type="fixed"><parent link="a"/><child link="c"/></joint>
                <joint name="j2" type="fixed"><parent link="b"/><child link="c"/></joint>
            </robot>
        "#;
        assert!(matches!(load_urdf_str(xml), Err(ModelError::Parse(_))));
    }

    #[test]
    fn invalid_xml() {
        assert!(matches!(
            load_urdf_str("<not valid urdf>"),
            Err(ModelError::Parse(_))
        ));
    }

    #[test]
    fn file_not_found() {
        let err = load_urdf_file("/nonexistent/robot.urdf").unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }
}
