//! Static robot-to-human body correspondence.
//!
//! A [`RetargetMapping`] names both skeleton roots, the human bodies that get
//! a scale entry, and the ordered robot → human pairs that become IK match
//! entries. Each pair's [`BodyRole`] is classified once, when it is added:
//! from the human body name, or from the robot body name when the human name
//! is unrecognised.

use std::path::Path;

use serde::Deserialize;

use retarget_model::BodyRole;

use crate::error::ConfigError;

/// SMPL-X body names that carry a scale entry.
pub const SMPLX_BODY_NAMES: [&str; 20] = [
    "pelvis",
    "spine1",
    "spine2",
    "spine3",
    "neck",
    "head",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
    "left_foot",
    "right_foot",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
];

// ---------------------------------------------------------------------------
// MappedPair
// ---------------------------------------------------------------------------

/// One robot body tracked against one human body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedPair {
    pub robot_body: String,
    pub human_body: String,
    pub role: BodyRole,
}

impl MappedPair {
    fn new(robot_body: String, human_body: String) -> Self {
        let role = match BodyRole::classify(&human_body) {
            BodyRole::Other => BodyRole::classify(&robot_body),
            role => role,
        };
        Self {
            robot_body,
            human_body,
            role,
        }
    }
}

// ---------------------------------------------------------------------------
// RetargetMapping
// ---------------------------------------------------------------------------

/// Robot ↔ human correspondence for one robot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetargetMapping {
    robot_root: String,
    human_root: String,
    human_bodies: Vec<String>,
    pairs: Vec<MappedPair>,
}

impl RetargetMapping {
    /// Create a mapping with no pairs. Duplicate human names are dropped.
    pub fn new<I, S>(
        robot_root: impl Into<String>,
        human_root: impl Into<String>,
        human_bodies: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut bodies: Vec<String> = Vec::new();
        for body in human_bodies {
            let body = body.into();
            if !bodies.contains(&body) {
                bodies.push(body);
            }
        }
        Self {
            robot_root: robot_root.into(),
            human_root: human_root.into(),
            human_bodies: bodies,
            pairs: Vec::new(),
        }
    }

    /// Append a pair. A robot body may be mapped only once.
    pub fn add_pair(
        &mut self,
        robot_body: impl Into<String>,
        human_body: impl Into<String>,
    ) -> Result<&MappedPair, ConfigError> {
        let robot_body = robot_body.into();
        if self.pair_for_robot(&robot_body).is_some() {
            return Err(ConfigError::invalid(
                "pairs",
                format!("robot body {robot_body} is mapped twice"),
            ));
        }
        let index = self.pairs.len();
        self.pairs.push(MappedPair::new(robot_body, human_body.into()));
        Ok(&self.pairs[index])
    }

    /// Builder-style [`add_pair`](Self::add_pair).
    pub fn with_pair(
        mut self,
        robot_body: impl Into<String>,
        human_body: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        self.add_pair(robot_body, human_body)?;
        Ok(self)
    }

    pub fn robot_root(&self) -> &str {
        &self.robot_root
    }

    pub fn human_root(&self) -> &str {
        &self.human_root
    }

    /// Human bodies in declaration order.
    pub fn human_bodies(&self) -> &[String] {
        &self.human_bodies
    }

    /// Pairs in declaration order.
    pub fn pairs(&self) -> &[MappedPair] {
        &self.pairs
    }

    pub fn pair_for_robot(&self, robot_body: &str) -> Option<&MappedPair> {
        self.pairs.iter().find(|p| p.robot_body == robot_body)
    }

    /// Role used for a human body's scale entry: the role of the first pair
    /// that targets it, otherwise its own classification.
    pub fn role_of_human(&self, human_body: &str) -> BodyRole {
        self.pairs
            .iter()
            .find(|p| p.human_body == human_body)
            .map_or_else(|| BodyRole::classify(human_body), |p| p.role)
    }

    /// SMPL-X to the DASH humanoid.
    pub fn smplx_to_dash() -> Self {
        let mut mapping = Self::new("torso", "pelvis", SMPLX_BODY_NAMES);
        for (robot, human) in [
            ("torso", "pelvis"),
            ("r_hip", "right_hip"),
            ("l_hip", "left_hip"),
            ("r_upper_leg", "right_knee"),
            ("l_upper_leg", "left_knee"),
            ("r_foot", "right_foot"),
            ("l_foot", "left_foot"),
            ("r_prox_shoulder", "right_shoulder"),
            ("l_prox_shoulder", "left_shoulder"),
            ("r_upper_arm", "right_elbow"),
            ("l_upper_arm", "left_elbow"),
            ("r_lower_arm", "right_wrist"),
            ("l_lower_arm", "left_wrist"),
        ] {
            mapping.pairs.push(MappedPair::new(robot.into(), human.into()));
        }
        mapping
    }

    // -- TOML --

    /// Parse a mapping file.
    ///
    /// ```toml
    /// robot_root = "torso"
    /// human_root = "pelvis"
    /// human_bodies = ["pelvis", "left_hip"]
    ///
    /// [[pairs]]
    /// robot = "torso"
    /// human = "pelvis"
    /// ```
    ///
    /// `human_bodies` defaults to the SMPL-X body list.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: MappingFile = toml::from_str(content)?;
        let mut mapping = match file.human_bodies {
            Some(bodies) => Self::new(file.robot_root, file.human_root, bodies),
            None => Self::new(file.robot_root, file.human_root, SMPLX_BODY_NAMES),
        };
        for pair in file.pairs {
            mapping.add_pair(pair.robot, pair.human)?;
        }
        Ok(mapping)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[derive(Deserialize)]
struct MappingFile {
    robot_root: String,
    human_root: String,
    #[serde(default)]
    human_bodies: Option<Vec<String>>,
    #[serde(default)]
    pairs: Vec<PairEntry>,
}

#[derive(Deserialize)]
struct PairEntry {
    robot: String,
    human: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
