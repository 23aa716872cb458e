//! Motion clip input types.

use std::collections::BTreeMap;

use nalgebra::Vector3;

use crate::error::MotionError;

// ---------------------------------------------------------------------------
// MotionSample
// ---------------------------------------------------------------------------

/// Body positions at one instant of a clip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionSample {
    positions: BTreeMap<String, Vector3<f64>>,
}

impl MotionSample {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a body's position, replacing any previous value.
    pub fn insert(&mut self, body: impl Into<String>, position: Vector3<f64>) {
        self.positions.insert(body.into(), position);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, body: impl Into<String>, position: Vector3<f64>) -> Self {
        self.insert(body, position);
        self
    }

    pub fn get(&self, body: &str) -> Option<&Vector3<f64>> {
        self.positions.get(body)
    }

    /// Body names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Vector3<f64>)> {
        self.positions.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Vector3<f64>)> for MotionSample {
    fn from_iter<I: IntoIterator<Item = (S, Vector3<f64>)>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChannelGroup
// ---------------------------------------------------------------------------

/// A named frames × dims block of raw motion channels, such as root
/// translation, root orientation or body pose parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelGroup {
    name: String,
    dims: usize,
    rows: Vec<Vec<f64>>,
}

impl ChannelGroup {
    /// Create a group, checking that every row has the same width.
    pub fn new(name: impl Into<String>, rows: Vec<Vec<f64>>) -> Result<Self, MotionError> {
        let name = name.into();
        let Some(first) = rows.first() else {
            return Err(MotionError::EmptyChannel(name));
        };
        let dims = first.len();
        if dims == 0 {
            return Err(MotionError::EmptyChannel(name));
        }
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != dims) {
            return Err(MotionError::ChannelShape {
                group: name,
                row,
                expected: dims,
                found: r.len(),
            });
        }
        Ok(Self { name, dims, rows })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Values per frame.
    pub const fn dims(&self) -> usize {
        self.dims
    }

    /// Number of frames.
    pub fn frames(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Values of one column over all frames.
    pub fn column(&self, dim: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |r| r[dim])
    }
}
