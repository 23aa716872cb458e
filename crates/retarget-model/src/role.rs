//! Semantic body-role classification.
//!
//! Robot and human skeletons name their segments inconsistently
//! (`r_upper_leg`, `right_knee`, `RightLeg`). A [`BodyRole`] is computed once,
//! when a name is registered, and every later stage dispatches on the tag.

use std::fmt;

/// Semantic class of a body segment, used to look up policy weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BodyRole {
    /// Pelvis, torso and spine segments.
    Core,
    Hip,
    Knee,
    Ankle,
    Foot,
    Shoulder,
    Elbow,
    Wrist,
    /// Head, neck and anything unrecognised.
    Other,
}

impl BodyRole {
    /// All roles, in policy-table order.
    pub const ALL: [Self; 9] = [
        Self::Core,
        Self::Hip,
        Self::Knee,
        Self::Ankle,
        Self::Foot,
        Self::Shoulder,
        Self::Elbow,
        Self::Wrist,
        Self::Other,
    ];

    /// Classify a body name.
    ///
    /// Matching is case-insensitive on substrings. More specific patterns are
    /// tested first, so `upper_arm` is an elbow and not a shoulder.
    pub fn classify(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        // BVH skeletons call the pelvis "Hips".
        if lower == "hips" {
            Self::Core
        } else if has(&["foot", "toe"]) {
            Self::Foot
        } else if has(&["ankle"]) {
            Self::Ankle
        } else if has(&["knee", "upper_leg", "upperleg", "shin", "calf", "lowerleg"]) {
            Self::Knee
        } else if has(&["hip", "thigh", "upleg"]) {
            Self::Hip
        } else if has(&["wrist", "lower_arm", "lowerarm", "forearm", "hand"]) {
            Self::Wrist
        } else if has(&["elbow", "upper_arm", "upperarm"]) {
            Self::Elbow
        } else if has(&["shoulder", "clavicle", "collar"]) {
            Self::Shoulder
        } else if has(&["pelvis", "torso", "spine", "waist", "chest", "base", "root"]) {
            Self::Core
        } else {
            Self::Other
        }
    }

    /// Lowercase name, matching the policy file keys.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Hip => "hip",
            Self::Knee => "knee",
            Self::Ankle => "ankle",
            Self::Foot => "foot",
            Self::Shoulder => "shoulder",
            Self::Elbow => "elbow",
            Self::Wrist => "wrist",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for BodyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
