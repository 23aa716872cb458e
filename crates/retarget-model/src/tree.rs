//! In-memory kinematic tree.
//!
//! A [`Tree`] owns every [`Body`] and [`Joint`] of one robot description.
//! Parent links are names looked up in the same tree; bodies never own their
//! parent. Trees are built once, either strictly root-to-leaf through
//! [`Tree::add_body`] or in any order through [`TreeBuilder`], and are
//! read-only afterwards.

use std::collections::BTreeMap;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

use crate::error::ModelError;
use crate::role::BodyRole;

// ---------------------------------------------------------------------------
// JointKind
// ---------------------------------------------------------------------------

/// Motion kind of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointKind {
    /// Rotation about a single axis (revolute or continuous).
    Hinge,
    /// Translation along a single axis.
    Prismatic,
    /// Three rotational degrees of freedom.
    Ball,
    /// Unconstrained 6-DOF floating base.
    Free,
    /// No relative motion.
    Fixed,
}

impl JointKind {
    /// Whether this joint kind has actuatable degrees of freedom.
    pub const fn is_actuated(self) -> bool {
        matches!(self, Self::Hinge | Self::Prismatic | Self::Ball)
    }
}

// ---------------------------------------------------------------------------
// JointLimits
// ---------------------------------------------------------------------------

/// Travel, effort and velocity limits of a joint. Descriptive only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointLimits {
    /// Lower position limit (rad or m). `None` means unbounded.
    pub lower: Option<f64>,
    /// Upper position limit (rad or m). `None` means unbounded.
    pub upper: Option<f64>,
    /// Maximum effort (Nm or N).
    pub effort: f64,
    /// Maximum velocity (rad/s or m/s).
    pub velocity: f64,
}

impl JointLimits {
    /// Width of the travel range, when both ends are bounded.
    pub fn span(&self) -> Option<f64> {
        Some(self.upper? - self.lower?)
    }
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// A rigid segment with a fixed offset from its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// Unique body name.
    pub name: String,
    /// Transform from this body's frame to its parent's frame.
    pub local: Isometry3<f64>,
    /// Parent body name; `None` for roots.
    pub parent: Option<String>,
    /// Semantic role, classified from the name at registration.
    pub role: BodyRole,
}

impl Body {
    /// Create a body, classifying its role from the name.
    pub fn new(
        name: impl Into<String>,
        translation: Vector3<f64>,
        rotation: UnitQuaternion<f64>,
        parent: Option<&str>,
    ) -> Self {
        let name = name.into();
        let role = BodyRole::classify(&name);
        Self {
            local: Isometry3::from_parts(Translation3::from(translation), rotation),
            parent: parent.map(str::to_owned),
            role,
            name,
        }
    }

    /// Local translation relative to the parent frame.
    pub fn local_translation(&self) -> Vector3<f64> {
        self.local.translation.vector
    }

    /// Local rotation relative to the parent frame.
    pub fn local_rotation(&self) -> UnitQuaternion<f64> {
        self.local.rotation
    }

    /// Whether this body has no parent.
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

// ---------------------------------------------------------------------------
// Joint
// ---------------------------------------------------------------------------

/// A joint attached to one body.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    /// Joint name.
    pub name: String,
    /// Motion kind.
    pub kind: JointKind,
    /// Name of the body this joint moves.
    pub body: String,
    /// Optional limits.
    pub limits: Option<JointLimits>,
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// A robot's kinematic tree: bodies and joints keyed by unique name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    /// Robot name.
    pub name: String,
    bodies: BTreeMap<String, Body>,
    joints: BTreeMap<String, Joint>,
}

impl Tree {
    /// Create an empty tree.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bodies: BTreeMap::new(),
            joints: BTreeMap::new(),
        }
    }

    /// Register a body. The parent, if any, must already be registered.
    pub fn add_body(
        &mut self,
        name: impl Into<String>,
        translation: Vector3<f64>,
        rotation: UnitQuaternion<f64>,
        parent: Option<&str>,
    ) -> Result<&Body, ModelError> {
        let body = Body::new(name, translation, rotation, parent);
        if self.bodies.contains_key(&body.name) {
            return Err(ModelError::DuplicateName(body.name));
        }
        if let Some(parent) = &body.parent {
            if !self.bodies.contains_key(parent) {
                return Err(ModelError::DanglingParent {
                    body: body.name,
                    parent: parent.clone(),
                });
            }
        }
        let name = body.name.clone();
        Ok(self.bodies.entry(name).or_insert(body))
    }

    /// Register a joint on an existing body.
    pub fn add_joint(
        &mut self,
        name: impl Into<String>,
        body: &str,
        kind: JointKind,
        limits: Option<JointLimits>,
    ) -> Result<&Joint, ModelError> {
        let name = name.into();
        if self.joints.contains_key(&name) {
            return Err(ModelError::DuplicateName(name));
        }
        if !self.bodies.contains_key(body) {
            return Err(ModelError::UnknownBody {
                joint: name,
                body: body.to_owned(),
            });
        }
        let joint = Joint {
            name: name.clone(),
            kind,
            body: body.to_owned(),
            limits,
        };
        Ok(self.joints.entry(name).or_insert(joint))
    }

    /// Get a body by name.
    pub fn body(&self, name: &str) -> Result<&Body, ModelError> {
        self.bodies
            .get(name)
            .ok_or_else(|| ModelError::MissingBody(name.into()))
    }

    /// Get a joint by name.
    pub fn joint(&self, name: &str) -> Result<&Joint, ModelError> {
        self.joints
            .get(name)
            .ok_or_else(|| ModelError::MissingJoint(name.into()))
    }

    /// Whether a body with this name exists.
    pub fn contains_body(&self, name: &str) -> bool {
        self.bodies.contains_key(name)
    }

    /// Iterate over bodies in name order.
    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    /// Iterate over joints in name order.
    pub fn joints(&self) -> impl Iterator<Item = &Joint> {
        self.joints.values()
    }

    /// Bodies without a parent, in name order.
    pub fn roots(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values().filter(|b| b.is_root())
    }

    /// Direct children of a body, in name order.
    pub fn children_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Body> + 'a {
        self.bodies
            .values()
            .filter(move |b| b.parent.as_deref() == Some(name))
    }

    /// Bodies classified with the given role, in name order.
    pub fn bodies_with_role(&self, role: BodyRole) -> impl Iterator<Item = &Body> {
        self.bodies.values().filter(move |b| b.role == role)
    }

    /// Joints attached to a body.
    pub fn joints_of<'a>(&'a self, body: &'a str) -> impl Iterator<Item = &'a Joint> + 'a {
        self.joints.values().filter(move |j| j.body == body)
    }

    /// Number of actuatable joints.
    pub fn dof(&self) -> usize {
        self.joints.values().filter(|j| j.kind.is_actuated()).count()
    }

    /// Number of bodies.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the tree has no bodies.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Number of joints.
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }
}

// ---------------------------------------------------------------------------
// TreeBuilder
// ---------------------------------------------------------------------------

/// Two-pass tree construction.
///
/// Declarations are accepted in any order; [`build`](Self::build) links
/// parents and joints afterwards and reports every problem it finds in one
/// error. Parent cycles are not checked here: they are a property of the
/// whole graph and are reported by the transform resolver.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    name: String,
    bodies: Vec<Body>,
    joints: Vec<Joint>,
}

impl TreeBuilder {
    /// Start a builder for the named robot.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bodies: Vec::new(),
            joints: Vec::new(),
        }
    }

    /// Declare a body. The parent may be declared later.
    pub fn body(
        &mut self,
        name: impl Into<String>,
        translation: Vector3<f64>,
        rotation: UnitQuaternion<f64>,
        parent: Option<&str>,
    ) -> &mut Self {
        self.bodies
            .push(Body::new(name, translation, rotation, parent));
        self
    }

    /// Declare a joint. The owning body may be declared later.
    pub fn joint(
        &mut self,
        name: impl Into<String>,
        body: impl Into<String>,
        kind: JointKind,
        limits: Option<JointLimits>,
    ) -> &mut Self {
        self.joints.push(Joint {
            name: name.into(),
            kind,
            body: body.into(),
            limits,
        });
        self
    }

    /// Number of bodies declared so far.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Link declarations into a [`Tree`].
    pub fn build(self) -> Result<Tree, ModelError> {
        let mut errors = Vec::new();

        let mut bodies = BTreeMap::new();
        for body in self.bodies {
            if bodies.contains_key(&body.name) {
                errors.push(ModelError::DuplicateName(body.name));
            } else {
                bodies.insert(body.name.clone(), body);
            }
        }

        for body in bodies.values() {
            if let Some(parent) = &body.parent {
                if !bodies.contains_key(parent) {
                    errors.push(ModelError::DanglingParent {
                        body: body.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        let mut joints = BTreeMap::new();
        for joint in self.joints {
            if !bodies.contains_key(&joint.body) {
                errors.push(ModelError::UnknownBody {
                    joint: joint.name,
                    body: joint.body,
                });
            } else if joints.contains_key(&joint.name) {
                errors.push(ModelError::DuplicateName(joint.name));
            } else {
                joints.insert(joint.name.clone(), joint);
            }
        }

        ModelError::from_accumulated(errors)?;
        Ok(Tree {
            name: self.name,
            bodies,
            joints,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
