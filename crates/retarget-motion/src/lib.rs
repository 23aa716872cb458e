//! Summary statistics over human motion clips.
//!
//! A clip is a slice of [`MotionSample`]s (body name → position per frame),
//! optionally accompanied by raw [`ChannelGroup`]s. [`summarize`] reduces it
//! to a [`MotionStats`] with per-body extents and a scalar complexity that
//! later stages use to modulate retargeting scales and weights.

pub mod error;
pub mod sample;
pub mod stats;

pub use error::MotionError;
pub use sample::{ChannelGroup, MotionSample};
pub use stats::{
    BodyStats, MotionStats, mean_complexity, summarize, summarize_batch, summarize_with_channels,
};
