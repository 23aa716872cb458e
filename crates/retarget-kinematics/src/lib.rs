//! World-transform resolution for robot kinematic trees.
//!
//! ```text
//! Tree ──► resolve ──► ResolvedTransforms (body name → world Isometry3)
//! ```
//!
//! The quaternion layout helpers from [`retarget_model::quat`] are
//! re-exported so callers converting resolved rotations for output only need
//! this crate.

pub mod error;
pub mod resolver;

pub use error::ResolveError;
pub use resolver::{ResolvedTransforms, resolve};
pub use retarget_model::quat::{QuatOrder, quat_from_array, quat_to_array, reorder};
