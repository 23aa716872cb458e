//! Retargeting configuration: policy, synthesis, serialization and comparison.
//!
//! A [`Synthesizer`] combines a resolved robot tree, optional motion
//! statistics and a static [`RetargetMapping`] into a [`RetargetConfig`]
//! under the tuning constants of a [`SynthesisPolicy`]. Configs serialize to
//! JSON and can be compared with [`diff`].

pub mod diff;
pub mod error;
pub mod mapping;
pub mod policy;
pub mod record;
pub mod synth;

pub use diff::{ConfigDiff, EntryDiff, HeaderDiff, Presence, ScaleDiff, diff};
pub use error::{ConfigError, ErrorClass, RetargetError, SynthesisError};
pub use mapping::{MappedPair, RetargetMapping, SMPLX_BODY_NAMES};
pub use policy::{Bounds, RoleTable, RoleWeights, SynthesisPolicy};
pub use record::{MatchEntry, RetargetConfig};
pub use synth::{Synthesizer, synthesize_from_tree};
