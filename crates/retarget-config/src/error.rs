use thiserror::Error;

use retarget_kinematics::ResolveError;
use retarget_model::ModelError;
use retarget_motion::MotionError;

/// Top-level error type for the retargeting pipeline.
#[derive(Debug, Error)]
pub enum RetargetError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Motion error: {0}")]
    Motion(#[from] MotionError),

    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Coarse category of a [`RetargetError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The robot description or tree is malformed.
    Structural,
    /// Inputs disagree with each other.
    DataMismatch,
    /// A computed value fell outside its configured bounds.
    Range,
    /// A policy, mapping or record file is invalid.
    Configuration,
}

impl RetargetError {
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Model(_) | Self::Resolve(_) => ErrorClass::Structural,
            Self::Motion(_) => ErrorClass::DataMismatch,
            Self::Synthesis(e) => e.class(),
            Self::Config(_) => ErrorClass::Configuration,
        }
    }
}

/// Configuration synthesis errors.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Robot body {0} has no resolved transform")]
    MissingMapping(String),

    #[error("Human body {human} mapped from {robot} is not in the human body list")]
    UnknownHumanBody { robot: String, human: String },

    #[error("{table} value for {key} is {value}, outside [{min}, {max}]")]
    OutOfRange {
        table: &'static str,
        key: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl SynthesisError {
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::MissingMapping(_) | Self::UnknownHumanBody { .. } => ErrorClass::DataMismatch,
            Self::OutOfRange { .. } => ErrorClass::Range,
        }
    }
}

/// Policy, mapping and record file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}
