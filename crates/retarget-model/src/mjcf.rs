//! MJCF loading using `quick-xml`.
//!
//! Only the kinematic skeleton is read: nested `<body>` elements under
//! `<worldbody>` with their `pos` and `quat` (`wxyz`) attributes, and the
//! `<joint>` / `<freejoint>` elements they contain. Geometry, actuators and
//! everything else are skipped. Nesting is tracked with an explicit stack
//! and attribute problems are collected and reported together.

use std::path::Path;

use nalgebra::{UnitQuaternion, Vector3};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::ModelError;
use crate::quat::{QuatOrder, quat_from_array};
use crate::tree::{JointKind, JointLimits, Tree, TreeBuilder};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load an MJCF file from disk into a [`Tree`].
pub fn load_mjcf_file(path: impl AsRef<Path>) -> Result<Tree, ModelError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ModelError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_mjcf_str(&content)
}

/// Load an MJCF XML string into a [`Tree`].
pub fn load_mjcf_str(xml: &str) -> Result<Tree, ModelError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut state = LoadState::default();
    let mut seen_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                seen_root |= e.name().as_ref() == b"mujoco";
                state.open(e, false);
            }
            Ok(Event::Empty(ref e)) => {
                seen_root |= e.name().as_ref() == b"mujoco";
                state.open(e, true);
            }
            Ok(Event::End(ref e)) => state.close(e.name().as_ref()),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ModelError::Parse(e.to_string())),
        }
    }

    if !seen_root {
        return Err(ModelError::Parse("missing <mujoco> root element".into()));
    }

    let tree = state.finish()?;
    tracing::debug!(
        robot = %tree.name,
        bodies = tree.len(),
        joints = tree.joint_count(),
        "loaded MJCF"
    );
    Ok(tree)
}

// ---------------------------------------------------------------------------
// Loader state
// ---------------------------------------------------------------------------

/// One open `<body>` element.
struct Frame {
    name: Option<String>,
    joints: usize,
}

struct PendingJoint {
    name: String,
    body: String,
    kind: JointKind,
    range: Option<[f64; 2]>,
}

struct LoadState {
    builder: TreeBuilder,
    joints: Vec<PendingJoint>,
    stack: Vec<Frame>,
    errors: Vec<ModelError>,
    in_worldbody: bool,
    degrees: bool,
}

impl Default for LoadState {
    fn default() -> Self {
        Self {
            builder: TreeBuilder::new("unnamed"),
            joints: Vec::new(),
            stack: Vec::new(),
            errors: Vec::new(),
            in_worldbody: false,
            // MuJoCo's compiler default.
            degrees: true,
        }
    }
}

impl LoadState {
    fn open(&mut self, e: &BytesStart, empty: bool) {
        match e.name().as_ref() {
            b"mujoco" => {
                if let Some(model) = get_attribute_opt(e, "model") {
                    self.builder = TreeBuilder::new(model);
                }
            }
            b"compiler" => {
                if let Some(angle) = get_attribute_opt(e, "angle") {
                    match angle.as_str() {
                        "degree" => self.degrees = true,
                        "radian" => self.degrees = false,
                        other => self.errors.push(ModelError::InvalidAttribute {
                            attribute: "angle",
                            element: "compiler".into(),
                            message: format!("expected degree or radian, got {other}"),
                        }),
                    }
                }
            }
            b"worldbody" => self.in_worldbody = !empty,
            b"body" if self.in_worldbody => {
                let name = self.declare_body(e);
                if !empty {
                    self.stack.push(Frame { name, joints: 0 });
                }
            }
            b"joint" if self.in_worldbody => self.declare_joint(e, false),
            b"freejoint" if self.in_worldbody => self.declare_joint(e, true),
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"worldbody" => self.in_worldbody = false,
            b"body" if self.in_worldbody => {
                self.stack.pop();
            }
            _ => {}
        }
    }

    fn declare_body(&mut self, e: &BytesStart) -> Option<String> {
        let Some(name) = get_attribute_opt(e, "name") else {
            self.errors.push(ModelError::MissingAttribute {
                attribute: "name",
                element: "body".into(),
            });
            return None;
        };

        let translation = match get_attribute_opt(e, "pos") {
            Some(s) => match parse_floats::<3>(&s) {
                Ok(v) => Vector3::from(v),
                Err(message) => {
                    self.errors.push(ModelError::InvalidAttribute {
                        attribute: "pos",
                        element: format!("body {name}"),
                        message,
                    });
                    Vector3::zeros()
                }
            },
            None => Vector3::zeros(),
        };

        let rotation = match get_attribute_opt(e, "quat") {
            Some(s) => match parse_floats::<4>(&s) {
                Ok(q) => quat_from_array(QuatOrder::Wxyz, q).unwrap_or_else(|err| {
                    self.errors.push(ModelError::InvalidAttribute {
                        attribute: "quat",
                        element: format!("body {name}"),
                        message: err.to_string(),
                    });
                    UnitQuaternion::identity()
                }),
                Err(message) => {
                    self.errors.push(ModelError::InvalidAttribute {
                        attribute: "quat",
                        element: format!("body {name}"),
                        message,
                    });
                    UnitQuaternion::identity()
                }
            },
            None => UnitQuaternion::identity(),
        };

        for unsupported in ["euler", "axisangle", "xyaxes", "zaxis"] {
            if get_attribute_opt(e, unsupported).is_some() {
                self.errors.push(ModelError::InvalidAttribute {
                    attribute: "orientation",
                    element: format!("body {name}"),
                    message: format!("{unsupported} is not supported, use quat"),
                });
            }
        }

        let parent = self.stack.last().and_then(|f| f.name.clone());
        self.builder
            .body(name.clone(), translation, rotation, parent.as_deref());
        Some(name)
    }

    fn declare_joint(&mut self, e: &BytesStart, free: bool) {
        let Some(frame) = self.stack.last_mut() else {
            self.errors.push(ModelError::Parse(
                "joint declared outside of any body".into(),
            ));
            return;
        };
        // Joints of an unnamed body are dropped; the body already reported.
        let Some(body) = frame.name.clone() else {
            return;
        };
        frame.joints += 1;
        let name = get_attribute_opt(e, "name")
            .unwrap_or_else(|| format!("{body}_joint{}", frame.joints - 1));

        let kind = if free {
            JointKind::Free
        } else {
            match get_attribute_opt(e, "type").as_deref() {
                None | Some("hinge") => JointKind::Hinge,
                Some("slide") => JointKind::Prismatic,
                Some("ball") => JointKind::Ball,
                Some("free") => JointKind::Free,
                Some(other) => {
                    self.errors
                        .push(ModelError::UnsupportedJointType(other.to_owned()));
                    return;
                }
            }
        };

        let range = match get_attribute_opt(e, "range") {
            Some(s) => match parse_floats::<2>(&s) {
                Ok(r) => Some(r),
                Err(message) => {
                    self.errors.push(ModelError::InvalidAttribute {
                        attribute: "range",
                        element: format!("joint {name}"),
                        message,
                    });
                    None
                }
            },
            None => None,
        };

        self.joints.push(PendingJoint {
            name,
            body,
            kind,
            range,
        });
    }

    fn finish(mut self) -> Result<Tree, ModelError> {
        for joint in self.joints {
            let limits = joint.range.map(|[lo, hi]| {
                let (lo, hi) = if self.degrees && joint.kind != JointKind::Prismatic {
                    (lo.to_radians(), hi.to_radians())
                } else {
                    (lo, hi)
                };
                JointLimits {
                    lower: Some(lo),
                    upper: Some(hi),
                    ..JointLimits::default()
                }
            });
            self.builder
                .joint(joint.name, joint.body, joint.kind, limits);
        }

        match self.builder.build() {
            Ok(tree) => ModelError::from_accumulated(self.errors).map(|()| tree),
            Err(ModelError::Invalid(more)) => {
                self.errors.extend(more);
                Err(ModelError::Invalid(self.errors))
            }
            Err(e) if self.errors.is_empty() => Err(e),
            Err(e) => {
                self.errors.push(e);
                Err(ModelError::Invalid(self.errors))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Attribute helpers
// ---------------------------------------------------------------------------

fn get_attribute_opt(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name.as_bytes())
        .and_then(|attr| String::from_utf8(attr.value.to_vec()).ok())
}

/// Parse exactly `N` whitespace-separated floats.
fn parse_floats<const N: usize>(s: &str) -> Result<[f64; N], String> {
    let mut out = [0.0; N];
    let mut count = 0;
    for part in s.split_whitespace() {
        let value: f64 = part.parse().map_err(|_| format!("invalid float: {part}"))?;
        if count < N {
            out[count] = value;
        }
        count += 1;
    }
    if count == N {
        Ok(out)
    } else {
        Err(format!("expected {N} values, got {count}: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::BodyRole;
    use approx::assert_relative_eq;

    const HUMANOID_MJCF: &str = r#"
        <mujoco model="dash">
            <compiler angle="radian"/>
            <worldbody>
                <geom name="floor" type="plane" size="5 5 0.1"/>
                <body name="torso" pos="0 0 1.0">
                    <freejoint name="root"/>
                    <geom type="capsule" size="0.1 0.2"/>
                    <body name="r_hip" pos="0 -0.1 -0.1" quat="0.7071068 0 0 0.7071068">
                        <joint name="r_hip_yaw" type="hinge" axis="0 0 1" range="-1 1"/>
                        <body name="r_upper_leg" pos="0 0 -0.4">
                            <joint type="hinge" axis="0 1 0"/>
                            <body name="r_foot" pos="0 0 -0.4"/>
                        </body>
                    </body>
                    <body name="l_prox_shoulder" pos="0 0.2 0.3">
                        <joint name="l_shoulder" type="ball"/>
                    </body>
                </body>
            </worldbody>
            <actuator>
                <motor joint="r_hip_yaw"/>
            </actuator>
        </mujoco>
    "#;

    #[test]
    fn loads_nested_bodies() {
        let tree = load_mjcf_str(HUMANOID_MJCF).unwrap();
        assert_eq!(tree.name, "dash");
        assert_eq!(tree.len(), 5);

        let roots: Vec<&str> = tree.roots().map(|b| b.name.as_str()).collect();
        assert_eq!(roots, vec!["torso"]);
        assert_eq!(
            tree.body("r_foot").unwrap().parent.as_deref(),
            Some("r_upper_leg")
        );
        assert_eq!(
            tree.body("l_prox_shoulder").unwrap().parent.as_deref(),
            Some("torso")
        );
        assert_eq!(tree.body("r_foot").unwrap().role, BodyRole::Foot);
    }

    #[test]
    fn pos_and_quat_are_read() {
        let tree = load_mjcf_str(HUMANOID_MJCF).unwrap();
        let torso = tree.body("torso").unwrap();
        assert_relative_eq!(
            torso.local_translation(),
            Vector3::new(0.0, 0.0, 1.0),
            epsilon = 1e-12
        );

        let hip = tree.body("r_hip").unwrap();
        let rotated = hip.local_rotation() * Vector3::x();
        assert_relative_eq!(rotated, Vector3::y(), epsilon = 1e-6);
    }

    #[test]
    fn joints_are_attached_to_their_body() {
        let tree = load_mjcf_str(HUMANOID_MJCF).unwrap();
        assert_eq!(tree.joint_count(), 4);

        let root = tree.joint("root").unwrap();
        assert_eq!(root.kind, JointKind::Free);
        assert_eq!(root.body, "torso");

        let yaw = tree.joint("r_hip_yaw").unwrap();
        assert_eq!(yaw.kind, JointKind::Hinge);
        let lim = yaw.limits.as_ref().unwrap();
        assert_relative_eq!(lim.lower.unwrap(), -1.0);
        assert_relative_eq!(lim.upper.unwrap(), 1.0);

        let unnamed = tree.joint("r_upper_leg_joint0").unwrap();
        assert_eq!(unnamed.body, "r_upper_leg");
        assert!(unnamed.limits.is_none());

        assert_eq!(tree.joint("l_shoulder").unwrap().kind, JointKind::Ball);
    }

    #[test]
    fn ranges_default_to_degrees() {
        let xml = r#"
            <mujoco model="deg">
                <worldbody>
                    <body name="arm">
                        <joint name="elbow" range="-90 90"/>
                        <joint name="slide" type="slide" range="-0.5 0.5"/>
                    </body>
                </worldbody>
            </mujoco>
        "#;
        let tree = load_mjcf_str(xml).unwrap();
        let elbow = tree.joint("elbow").unwrap().limits.clone().unwrap();
        assert_relative_eq!(elbow.upper.unwrap(), std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
        let slide = tree.joint("slide").unwrap().limits.clone().unwrap();
        assert_relative_eq!(slide.upper.unwrap(), 0.5);
    }

    #[test]
    fn attribute_errors_are_accumulated() {
        let xml = r#"
            <mujoco model="broken">
                <worldbody>
                    <body name="a" pos="0 0">
                        <body quat="1 0 0 0"/>
                        <body name="b" quat="0 0 0 0">
                            <joint name="j" type="hinge" range="x 1"/>
                        </body>
                    </body>
                </worldbody>
            </mujoco>
        "#;
        match load_mjcf_str(xml) {
            Err(ModelError::Invalid(errors)) => {
                assert_eq!(errors.len(), 4);
                assert!(errors.iter().any(|e| matches!(
                    e,
                    ModelError::InvalidAttribute { attribute: "pos", .. }
                )));
                assert!(errors.iter().any(|e| matches!(
                    e,
                    ModelError::MissingAttribute { attribute: "name", .. }
                )));
                assert!(errors.iter().any(|e| matches!(
                    e,
                    ModelError::InvalidAttribute { attribute: "quat", .. }
                )));
                assert!(errors.iter().any(|e| matches!(
                    e,
                    ModelError::InvalidAttribute { attribute: "range", .. }
                )));
            }
            other => panic!("expected accumulated errors, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_body_names_reported() {
        let xml = r#"
            <mujoco>
                <worldbody>
                    <body name="a"/>
                    <body name="a"/>
                </worldbody>
            </mujoco>
        "#;
        assert!(matches!(load_mjcf_str(xml), Err(ModelError::DuplicateName(_))));
    }

    #[test]
    fn unsupported_joint_type() {
        let xml = r#"
            <mujoco>
                <worldbody>
                    <body name="a"><joint type="screw"/></body>
                </worldbody>
            </mujoco>
        "#;
        assert!(matches!(
            load_mjcf_str(xml),
            Err(ModelError::UnsupportedJointType(t)) if t == "screw"
        ));
    }

    #[test]
    fn euler_orientation_rejected() {
        let xml = r#"
            <mujoco>
                <worldbody>
                    <body name="a" euler="0 0 90"/>
                </worldbody>
            </mujoco>
        "#;
        assert!(matches!(
            load_mjcf_str(xml),
            Err(ModelError::InvalidAttribute { attribute: "orientation", .. })
        ));
    }

    #[test]
    fn missing_root_element() {
        assert!(matches!(
            load_mjcf_str("<robot name=\"x\"/>"),
            Err(ModelError::Parse(_))
        ));
    }

    #[test]
    fn malformed_xml() {
        assert!(matches!(
            load_mjcf_str("<mujoco><worldbody></mujoco>"),
            Err(ModelError::Parse(_))
        ));
    }

    #[test]
    fn parse_floats_counts_values() {
        assert_eq!(parse_floats::<3>("1 2 3").unwrap(), [1.0, 2.0, 3.0]);
        assert!(parse_floats::<3>("1 2").is_err());
        assert!(parse_floats::<2>("1 2 3").is_err());
        assert!(parse_floats::<2>("1 nope").is_err());
    }

    #[test]
    fn file_not_found() {
        assert!(matches!(
            load_mjcf_file("/nonexistent/robot.xml"),
            Err(ModelError::Io { .. })
        ));
    }
}
