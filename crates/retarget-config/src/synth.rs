//! Configuration synthesis.
//!
//! [`Synthesizer::synthesize`] turns a resolved robot, an optional motion
//! summary and a [`RetargetMapping`] into a [`RetargetConfig`]:
//!
//! ```text
//! scale  = base_scale(role) × geometry_ratio × modifier(complexity)
//! weight = base_weight(role) × factor(complexity)
//! table2 = table1 × secondary_ratio
//! ```
//!
//! The result depends only on its inputs; every map is ordered.

use std::collections::BTreeMap;

use nalgebra::UnitQuaternion;

use retarget_kinematics::{ResolvedTransforms, resolve};
use retarget_model::{BodyRole, Tree};
use retarget_motion::{MotionSample, MotionStats, summarize};

use crate::error::{ConfigError, RetargetError, SynthesisError};
use crate::mapping::RetargetMapping;
use crate::policy::{Bounds, SynthesisPolicy};
use crate::record::{MatchEntry, RetargetConfig};

/// Builds [`RetargetConfig`]s under one validated [`SynthesisPolicy`].
#[derive(Debug, Clone)]
pub struct Synthesizer {
    policy: SynthesisPolicy,
}

impl Synthesizer {
    /// Validate `policy` and wrap it.
    pub fn new(policy: SynthesisPolicy) -> Result<Self, ConfigError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub const fn policy(&self) -> &SynthesisPolicy {
        &self.policy
    }

    pub fn synthesize(
        &self,
        resolved: &ResolvedTransforms,
        stats: Option<&MotionStats>,
        mapping: &RetargetMapping,
    ) -> Result<RetargetConfig, SynthesisError> {
        let policy = &self.policy;

        if !resolved.contains(mapping.robot_root()) {
            return Err(SynthesisError::MissingMapping(mapping.robot_root().to_owned()));
        }
        for pair in mapping.pairs() {
            if !resolved.contains(&pair.robot_body) {
                return Err(SynthesisError::MissingMapping(pair.robot_body.clone()));
            }
            if !mapping.human_bodies().contains(&pair.human_body) {
                return Err(SynthesisError::UnknownHumanBody {
                    robot: pair.robot_body.clone(),
                    human: pair.human_body.clone(),
                });
            }
        }

        let complexity = stats.map(MotionStats::complexity);
        let geometry_ratio = if policy.geometric_scaling {
            robot_height(resolved, mapping)? / policy.human_height_assumption
        } else {
            1.0
        };
        let modifier = policy.scale_modifier(complexity);
        let factor = policy.weight_factor(complexity);

        let mut human_scale_table = BTreeMap::new();
        for human in mapping.human_bodies() {
            let base = policy.roles.get(mapping.role_of_human(human)).scale;
            let scale = self.check(
                "human_scale_table",
                human,
                base * geometry_ratio * modifier,
                policy.scale_bounds,
            )?;
            human_scale_table.insert(human.clone(), scale);
        }

        let mut ik_match_table1 = BTreeMap::new();
        let mut ik_match_table2 = BTreeMap::new();
        for pair in mapping.pairs() {
            let base = policy.roles.get(pair.role);
            let position_weight = self.check(
                "ik_match_table1",
                &pair.robot_body,
                base.position_weight * factor,
                policy.weight_bounds,
            )?;
            let rotation_weight = self.check(
                "ik_match_table1",
                &pair.robot_body,
                base.rotation_weight * factor,
                policy.weight_bounds,
            )?;

            let mut entry =
                MatchEntry::new(pair.human_body.clone(), position_weight, rotation_weight);
            if policy.align_rotation_offsets {
                entry.rotation_offset = resolved
                    .rotation(&pair.robot_body)
                    .unwrap_or_else(UnitQuaternion::identity);
            }

            let secondary = entry.scaled(policy.secondary_ratio);
            for weight in [secondary.position_weight, secondary.rotation_weight] {
                self.check(
                    "ik_match_table2",
                    &pair.robot_body,
                    weight,
                    policy.weight_bounds,
                )?;
            }
            ik_match_table2.insert(pair.robot_body.clone(), secondary);
            ik_match_table1.insert(pair.robot_body.clone(), entry);
        }

        let config = RetargetConfig {
            robot_root_name: mapping.robot_root().to_owned(),
            human_root_name: mapping.human_root().to_owned(),
            ground_height: policy.ground_height,
            human_height_assumption: policy.human_height_assumption,
            use_ik_match_table1: policy.use_ik_match_table1,
            use_ik_match_table2: policy.use_ik_match_table2,
            human_scale_table,
            ik_match_table1,
            ik_match_table2,
        };

        for key in config.unmapped_scale_keys() {
            tracing::warn!(key, "human scale entry has no IK match entry");
        }
        tracing::debug!(
            robot_root = %config.robot_root_name,
            scales = config.human_scale_table.len(),
            entries = config.ik_match_table1.len(),
            complexity = complexity.unwrap_or(0.0),
            modifier,
            factor,
            geometry_ratio,
            "synthesized retarget config"
        );
        Ok(config)
    }

    /// Pass `value` through, or fail if it is outside `bounds` and the policy
    /// does not allow unclamped output.
    fn check(
        &self,
        table: &'static str,
        key: &str,
        value: f64,
        bounds: Bounds,
    ) -> Result<f64, SynthesisError> {
        if bounds.contains(value) {
            return Ok(value);
        }
        if self.policy.allow_unclamped {
            tracing::warn!(table, key, value, "value outside policy bounds");
            return Ok(value);
        }
        Err(SynthesisError::OutOfRange {
            table,
            key: key.to_owned(),
            value,
            min: bounds.min,
            max: bounds.max,
        })
    }
}

/// Resolve `tree`, summarize `clip` if given, and synthesize under `policy`.
pub fn synthesize_from_tree(
    tree: &Tree,
    clip: Option<&[MotionSample]>,
    mapping: &RetargetMapping,
    policy: SynthesisPolicy,
) -> Result<RetargetConfig, RetargetError> {
    let synthesizer = Synthesizer::new(policy)?;
    let resolved = resolve(tree)?;
    let stats = clip.map(summarize).transpose()?;
    Ok(synthesizer.synthesize(&resolved, stats.as_ref(), mapping)?)
}

/// Root height above the lowest mapped foot, or the tree's vertical extent
/// when no foot is mapped.
fn robot_height(
    resolved: &ResolvedTransforms,
    mapping: &RetargetMapping,
) -> Result<f64, SynthesisError> {
    let root = mapping.robot_root();
    let root_z = resolved
        .translation(root)
        .map(|t| t.z)
        .ok_or_else(|| SynthesisError::MissingMapping(root.to_owned()))?;

    let lowest_foot = mapping
        .pairs()
        .iter()
        .filter(|p| p.role == BodyRole::Foot)
        .filter_map(|p| resolved.translation(&p.robot_body))
        .map(|t| t.z)
        .reduce(f64::min);

    let height = match lowest_foot {
        Some(z) => root_z - z,
        None => resolved.vertical_extent().map_or(0.0, |(lo, hi)| hi - lo),
    };
    if height > 0.0 && height.is_finite() {
        Ok(height)
    } else {
        Err(SynthesisError::OutOfRange {
            table: "robot_height",
            key: root.to_owned(),
            value: height,
            min: 0.0,
            max: f64::INFINITY,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
