//! Error types for tree construction and description loading.

use std::path::PathBuf;

/// Errors that can occur while building a [`Tree`](crate::Tree) or loading a
/// robot description into one.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Failed to read a description file.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse description XML content.
    #[error("description parse error: {0}")]
    Parse(String),

    /// A body or joint name was registered twice.
    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// A body names a parent that is not registered.
    #[error("body {body} references unknown parent {parent}")]
    DanglingParent { body: String, parent: String },

    /// A joint names an owning body that is not registered.
    #[error("joint {joint} references unknown body {body}")]
    UnknownBody { joint: String, body: String },

    /// A body lookup failed.
    #[error("missing body: {0}")]
    MissingBody(String),

    /// A joint lookup failed.
    #[error("missing joint: {0}")]
    MissingJoint(String),

    /// Invalid or unsupported joint type.
    #[error("unsupported joint type: {0}")]
    UnsupportedJointType(String),

    /// A quaternion with zero or non-finite norm.
    #[error("degenerate quaternion {0:?}")]
    DegenerateQuaternion([f64; 4]),

    /// An element is missing an attribute that has no default.
    #[error("missing attribute {attribute} on <{element}>")]
    MissingAttribute {
        attribute: &'static str,
        element: String,
    },

    /// An attribute value could not be interpreted.
    #[error("invalid {attribute} on {element}: {message}")]
    InvalidAttribute {
        attribute: &'static str,
        element: String,
        message: String,
    },

    /// Several problems found in a single build pass.
    #[error("{} problems in tree description: {}", .0.len(), join_errors(.0))]
    Invalid(Vec<ModelError>),
}

impl ModelError {
    /// Collapse accumulated build errors: none is `Ok`, exactly one is
    /// returned as-is, several are wrapped in [`ModelError::Invalid`].
    pub fn from_accumulated(mut errors: Vec<Self>) -> Result<(), Self> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Self::Invalid(errors)),
        }
    }
}

fn join_errors(errors: &[ModelError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
