//! The retargeting configuration record and its JSON form.
//!
//! ```json
//! {
//!   "robot_root_name": "torso",
//!   "human_root_name": "pelvis",
//!   "ground_height": 0.0,
//!   "human_height_assumption": 1.8,
//!   "use_ik_match_table1": true,
//!   "use_ik_match_table2": true,
//!   "human_scale_table": { "pelvis": 0.8 },
//!   "ik_match_table1": {
//!     "torso": ["pelvis", 300.0, 50.0, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]]
//!   },
//!   "ik_match_table2": {
//!     "torso": ["pelvis", 180.0, 30.0, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]]
//!   }
//! }
//! ```
//!
//! Rotation offsets are stored scalar first (`wxyz`). Table keys are written
//! in alphabetical order.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use retarget_model::{ModelError, QuatOrder, quat_from_array, quat_to_array};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// MatchEntry
// ---------------------------------------------------------------------------

/// One IK match entry: which human body a robot body tracks, and how hard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "MatchEntryRepr", try_from = "MatchEntryRepr")]
pub struct MatchEntry {
    pub human_body: String,
    pub position_weight: f64,
    pub rotation_weight: f64,
    pub position_offset: Vector3<f64>,
    pub rotation_offset: UnitQuaternion<f64>,
}

impl MatchEntry {
    /// Entry with zero position offset and identity rotation offset.
    pub fn new(human_body: impl Into<String>, position_weight: f64, rotation_weight: f64) -> Self {
        Self {
            human_body: human_body.into(),
            position_weight,
            rotation_weight,
            position_offset: Vector3::zeros(),
            rotation_offset: UnitQuaternion::identity(),
        }
    }

    /// Same entry with both weights multiplied by `ratio`.
    #[must_use]
    pub fn scaled(&self, ratio: f64) -> Self {
        Self {
            position_weight: self.position_weight * ratio,
            rotation_weight: self.rotation_weight * ratio,
            ..self.clone()
        }
    }
}

/// `[human_body, position_weight, rotation_weight, [x, y, z], [w, x, y, z]]`
type MatchEntryRepr = (String, f64, f64, [f64; 3], [f64; 4]);

impl From<MatchEntry> for MatchEntryRepr {
    fn from(e: MatchEntry) -> Self {
        let p = e.position_offset;
        (
            e.human_body,
            e.position_weight,
            e.rotation_weight,
            [p.x, p.y, p.z],
            quat_to_array(QuatOrder::Wxyz, &e.rotation_offset),
        )
    }
}

impl TryFrom<MatchEntryRepr> for MatchEntry {
    type Error = ModelError;

    fn try_from(repr: MatchEntryRepr) -> Result<Self, Self::Error> {
        let (human_body, position_weight, rotation_weight, p, q) = repr;
        Ok(Self {
            human_body,
            position_weight,
            rotation_weight,
            position_offset: Vector3::from(p),
            rotation_offset: quat_from_array(QuatOrder::Wxyz, q)?,
        })
    }
}

// ---------------------------------------------------------------------------
// RetargetConfig
// ---------------------------------------------------------------------------

/// Everything an IK retargeter needs to track a human skeleton with a robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetargetConfig {
    pub robot_root_name: String,
    pub human_root_name: String,
    pub ground_height: f64,
    pub human_height_assumption: f64,
    pub use_ik_match_table1: bool,
    pub use_ik_match_table2: bool,
    /// Human body name → scale.
    pub human_scale_table: BTreeMap<String, f64>,
    /// Robot body name → primary match entry.
    pub ik_match_table1: BTreeMap<String, MatchEntry>,
    /// Robot body name → secondary match entry.
    pub ik_match_table2: BTreeMap<String, MatchEntry>,
}

impl RetargetConfig {
    /// Scale keys that no table 1 entry refers to.
    pub fn unmapped_scale_keys(&self) -> Vec<&str> {
        let mapped: BTreeSet<&str> = self
            .ik_match_table1
            .values()
            .map(|e| e.human_body.as_str())
            .collect();
        self.human_scale_table
            .keys()
            .map(String::as_str)
            .filter(|k| !mapped.contains(k))
            .collect()
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load from JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Write as pretty JSON.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
