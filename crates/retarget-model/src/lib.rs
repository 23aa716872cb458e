//! Kinematic tree model for motion retargeting.
//!
//! Provides the [`Tree`] of named rigid bodies and joints, the semantic
//! [`BodyRole`] attached to every body, explicit quaternion layout
//! conventions, and loaders that build trees from URDF and MJCF
//! descriptions.

pub mod error;
pub mod mjcf;
pub mod quat;
pub mod role;
pub mod tree;
pub mod urdf;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use error::ModelError;
pub use mjcf::{load_mjcf_file, load_mjcf_str};
pub use quat::{QuatOrder, quat_from_array, quat_to_array, reorder};
pub use role::BodyRole;
pub use tree::{Body, Joint, JointKind, JointLimits, Tree, TreeBuilder};
pub use urdf::{load_urdf_file, load_urdf_str};
