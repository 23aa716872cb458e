//! Synthesis policy: the tuning constants behind every synthesized config.
//!
//! A [`SynthesisPolicy`] holds per-role base weights and scales
//! ([`RoleTable`]), the complexity gains and the [`Bounds`] that synthesized
//! values must respect. Missing TOML fields take their defaults, and
//! [`SynthesisPolicy::validate`] runs on every load.

use std::path::Path;

use serde::{Deserialize, Serialize};

use retarget_model::BodyRole;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_secondary_ratio() -> f64 {
    0.6
}
const fn default_gain() -> f64 {
    0.5
}
const fn default_modifier_bounds() -> Bounds {
    Bounds::new(0.8, 1.2)
}
const fn default_weight_factor_bounds() -> Bounds {
    Bounds::new(1.0, 1.5)
}
const fn default_scale_bounds() -> Bounds {
    Bounds::new(0.05, 2.0)
}
const fn default_weight_bounds() -> Bounds {
    Bounds::new(0.0, 1000.0)
}
const fn default_human_height() -> f64 {
    1.8
}
const fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ConfigError::invalid(field, "bounds must be finite"));
        }
        if self.min > self.max {
            return Err(ConfigError::invalid(
                field,
                format!("min {} exceeds max {}", self.min, self.max),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RoleWeights / RoleTable
// ---------------------------------------------------------------------------

/// Base retargeting parameters for one body role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleWeights {
    pub position_weight: f64,
    pub rotation_weight: f64,
    pub scale: f64,
}

impl RoleWeights {
    pub const fn new(position_weight: f64, rotation_weight: f64, scale: f64) -> Self {
        Self {
            position_weight,
            rotation_weight,
            scale,
        }
    }
}

/// Base parameters for every [`BodyRole`].
///
/// Stance-critical roles (core, feet) get the heaviest position weights;
/// distal arm segments the lightest. Missing roles in a policy file keep
/// these defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleTable {
    pub core: RoleWeights,
    pub hip: RoleWeights,
    pub knee: RoleWeights,
    pub ankle: RoleWeights,
    pub foot: RoleWeights,
    pub shoulder: RoleWeights,
    pub elbow: RoleWeights,
    pub wrist: RoleWeights,
    pub other: RoleWeights,
}

impl Default for RoleTable {
    fn default() -> Self {
        Self {
            core: RoleWeights::new(300.0, 50.0, 0.8),
            hip: RoleWeights::new(150.0, 30.0, 0.75),
            knee: RoleWeights::new(150.0, 30.0, 0.75),
            ankle: RoleWeights::new(200.0, 50.0, 0.7),
            foot: RoleWeights::new(300.0, 50.0, 0.8),
            shoulder: RoleWeights::new(100.0, 25.0, 0.7),
            elbow: RoleWeights::new(100.0, 25.0, 0.7),
            wrist: RoleWeights::new(80.0, 20.0, 0.65),
            other: RoleWeights::new(80.0, 16.0, 0.7),
        }
    }
}

impl RoleTable {
    pub const fn get(&self, role: BodyRole) -> &RoleWeights {
        match role {
            BodyRole::Core => &self.core,
            BodyRole::Hip => &self.hip,
            BodyRole::Knee => &self.knee,
            BodyRole::Ankle => &self.ankle,
            BodyRole::Foot => &self.foot,
            BodyRole::Shoulder => &self.shoulder,
            BodyRole::Elbow => &self.elbow,
            BodyRole::Wrist => &self.wrist,
            BodyRole::Other => &self.other,
        }
    }

    /// `(role, weights)` for every role, in [`BodyRole::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyRole, &RoleWeights)> {
        BodyRole::ALL.into_iter().map(|role| (role, self.get(role)))
    }
}

// ---------------------------------------------------------------------------
// SynthesisPolicy
// ---------------------------------------------------------------------------

/// Every tunable used when synthesizing a retargeting configuration.
///
/// Table-valued fields must stay after plain values for TOML output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisPolicy {
    /// Table 2 weights are table 1 weights times this ratio, in (0, 1].
    #[serde(default = "default_secondary_ratio")]
    pub secondary_ratio: f64,

    /// Slope of the scale modifier against motion complexity.
    #[serde(default = "default_gain")]
    pub scale_gain: f64,

    /// Slope of the weight factor against motion complexity.
    #[serde(default = "default_gain")]
    pub weight_gain: f64,

    /// Emit out-of-bounds scales and weights instead of failing.
    #[serde(default)]
    pub allow_unclamped: bool,

    /// Multiply scales by robot height over `human_height_assumption`.
    #[serde(default)]
    pub geometric_scaling: bool,

    /// Use each robot body's resolved world rotation as its rotation offset.
    #[serde(default)]
    pub align_rotation_offsets: bool,

    /// Assumed human height in metres (default: 1.8).
    #[serde(default = "default_human_height")]
    pub human_height_assumption: f64,

    #[serde(default)]
    pub ground_height: f64,

    #[serde(default = "default_true")]
    pub use_ik_match_table1: bool,

    #[serde(default = "default_true")]
    pub use_ik_match_table2: bool,

    /// Clamp range of the scale modifier.
    #[serde(default = "default_modifier_bounds")]
    pub modifier_bounds: Bounds,

    /// Clamp range of the weight factor.
    #[serde(default = "default_weight_factor_bounds")]
    pub weight_factor_bounds: Bounds,

    /// Accepted range of final scales.
    #[serde(default = "default_scale_bounds")]
    pub scale_bounds: Bounds,

    /// Accepted range of final weights.
    #[serde(default = "default_weight_bounds")]
    pub weight_bounds: Bounds,

    /// Base weights and scale per role.
    #[serde(default)]
    pub roles: RoleTable,
}

impl Default for SynthesisPolicy {
    fn default() -> Self {
        Self {
            roles: RoleTable::default(),
            secondary_ratio: default_secondary_ratio(),
            scale_gain: default_gain(),
            modifier_bounds: default_modifier_bounds(),
            weight_gain: default_gain(),
            weight_factor_bounds: default_weight_factor_bounds(),
            scale_bounds: default_scale_bounds(),
            weight_bounds: default_weight_bounds(),
            allow_unclamped: false,
            geometric_scaling: false,
            align_rotation_offsets: false,
            human_height_assumption: default_human_height(),
            ground_height: 0.0,
            use_ik_match_table1: true,
            use_ik_match_table2: true,
        }
    }
}

impl SynthesisPolicy {
    /// Validate policy. Returns Err on the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.secondary_ratio > 0.0 && self.secondary_ratio <= 1.0) {
            return Err(ConfigError::invalid(
                "secondary_ratio",
                format!("{} is not in (0, 1]", self.secondary_ratio),
            ));
        }
        for (field, gain) in [("scale_gain", self.scale_gain), ("weight_gain", self.weight_gain)] {
            if !gain.is_finite() || gain < 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("{gain} must be finite and non-negative"),
                ));
            }
        }

        self.modifier_bounds.validate("modifier_bounds")?;
        self.weight_factor_bounds.validate("weight_factor_bounds")?;
        self.scale_bounds.validate("scale_bounds")?;
        self.weight_bounds.validate("weight_bounds")?;
        if self.modifier_bounds.min <= 0.0 {
            return Err(ConfigError::invalid("modifier_bounds", "min must be > 0"));
        }
        if self.weight_factor_bounds.min <= 0.0 {
            return Err(ConfigError::invalid("weight_factor_bounds", "min must be > 0"));
        }

        if !(self.human_height_assumption.is_finite() && self.human_height_assumption > 0.0) {
            return Err(ConfigError::invalid(
                "human_height_assumption",
                format!("{} must be > 0", self.human_height_assumption),
            ));
        }
        if !self.ground_height.is_finite() {
            return Err(ConfigError::invalid("ground_height", "must be finite"));
        }

        for (role, w) in self.roles.iter() {
            let finite = w.position_weight.is_finite()
                && w.rotation_weight.is_finite()
                && w.scale.is_finite();
            if !finite || w.position_weight < 0.0 || w.rotation_weight < 0.0 || w.scale <= 0.0 {
                return Err(ConfigError::invalid(
                    format!("roles.{role}"),
                    "weights must be non-negative and scale positive",
                ));
            }
        }
        Ok(())
    }

    /// Scale multiplier for a motion complexity; 1.0 without motion data.
    ///
    /// Non-decreasing in `complexity`.
    pub fn scale_modifier(&self, complexity: Option<f64>) -> f64 {
        complexity.map_or(1.0, |c| {
            self.modifier_bounds.clamp(1.0 + self.scale_gain * c)
        })
    }

    /// Weight multiplier for a motion complexity; 1.0 without motion data.
    pub fn weight_factor(&self, complexity: Option<f64>) -> f64 {
        complexity.map_or(1.0, |c| {
            self.weight_factor_bounds.clamp(1.0 + self.weight_gain * c)
        })
    }

    /// Parse and validate a TOML policy.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let policy: Self = toml::from_str(content)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
