//! Quaternion component-order conventions.
//!
//! Internally every rotation is a [`UnitQuaternion<f64>`]. Robot and motion
//! descriptions disagree on how the four components are laid out in a file:
//! MJCF and the retargeting record use `(w, x, y, z)`, scipy-style tooling
//! uses `(x, y, z, w)`. Every boundary states its [`QuatOrder`] explicitly;
//! nothing here tries to guess it from the values.

use std::fmt;

use nalgebra::{Quaternion, UnitQuaternion};

use crate::error::ModelError;

/// Norm below which a quaternion cannot be normalized.
const MIN_NORM: f64 = 1e-9;

/// Component order of a quaternion stored as four numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuatOrder {
    /// Scalar first: `[w, x, y, z]`.
    Wxyz,
    /// Scalar last: `[x, y, z, w]`.
    Xyzw,
}

impl fmt::Display for QuatOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wxyz => f.write_str("wxyz"),
            Self::Xyzw => f.write_str("xyzw"),
        }
    }
}

/// Build a unit quaternion from four components in the given order.
///
/// The input is normalized. Zero-length or non-finite input is rejected
/// with [`ModelError::DegenerateQuaternion`].
pub fn quat_from_array(order: QuatOrder, q: [f64; 4]) -> Result<UnitQuaternion<f64>, ModelError> {
    if q.iter().any(|c| !c.is_finite()) {
        return Err(ModelError::DegenerateQuaternion(q));
    }
    let raw = match order {
        QuatOrder::Wxyz => Quaternion::new(q[0], q[1], q[2], q[3]),
        QuatOrder::Xyzw => Quaternion::new(q[3], q[0], q[1], q[2]),
    };
    UnitQuaternion::try_new(raw, MIN_NORM).ok_or(ModelError::DegenerateQuaternion(q))
}

/// Lay out a unit quaternion's components in the given order.
pub fn quat_to_array(order: QuatOrder, q: &UnitQuaternion<f64>) -> [f64; 4] {
    let qi = q.quaternion();
    match order {
        QuatOrder::Wxyz => [qi.w, qi.i, qi.j, qi.k],
        QuatOrder::Xyzw => [qi.i, qi.j, qi.k, qi.w],
    }
}

/// Move components from one order to another without normalizing.
pub const fn reorder(from: QuatOrder, to: QuatOrder, q: [f64; 4]) -> [f64; 4] {
    match (from, to) {
        (QuatOrder::Wxyz, QuatOrder::Xyzw) => [q[1], q[2], q[3], q[0]],
        (QuatOrder::Xyzw, QuatOrder::Wxyz) => [q[3], q[0], q[1], q[2]],
        _ => q,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
