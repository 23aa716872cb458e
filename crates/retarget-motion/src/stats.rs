//! Motion clip statistics.
//!
//! [`summarize`] reduces a clip of [`MotionSample`]s to per-body extents and
//! a single complexity score. Complexity is the mean, over channel groups,
//! of the mean per-axis standard deviation across frames. Without explicit
//! channel groups each body's position track is one group.

// Frame counts are converted to f64 for averaging.
#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeMap;

use nalgebra::Vector3;

use crate::error::MotionError;
use crate::sample::{ChannelGroup, MotionSample};

// ---------------------------------------------------------------------------
// BodyStats
// ---------------------------------------------------------------------------

/// Componentwise statistics of one body's position over a clip.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyStats {
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
    pub mean: Vector3<f64>,
    /// Population variance.
    pub variance: Vector3<f64>,
    /// `max - min`.
    pub range: Vector3<f64>,
    /// Euclidean norm of `range`.
    pub magnitude: f64,
}

impl BodyStats {
    /// Per-axis standard deviation.
    pub fn stddev(&self) -> Vector3<f64> {
        self.variance.map(f64::sqrt)
    }

    fn from_track(track: &[Vector3<f64>]) -> Self {
        let n = track.len() as f64;
        let mut min = Vector3::repeat(f64::INFINITY);
        let mut max = Vector3::repeat(f64::NEG_INFINITY);
        let mut sum = Vector3::zeros();
        for p in track {
            min = min.inf(p);
            max = max.sup(p);
            sum += p;
        }
        let mean = sum / n;
        let variance = track
            .iter()
            .map(|p| (p - mean).component_mul(&(p - mean)))
            .sum::<Vector3<f64>>()
            / n;
        let range = max - min;
        Self {
            min,
            max,
            mean,
            variance,
            range,
            magnitude: range.norm(),
        }
    }
}

// ---------------------------------------------------------------------------
// MotionStats
// ---------------------------------------------------------------------------

/// Summary of one motion clip. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionStats {
    bodies: BTreeMap<String, BodyStats>,
    complexity: f64,
    frames: usize,
}

impl MotionStats {
    pub fn body(&self, name: &str) -> Option<&BodyStats> {
        self.bodies.get(name)
    }

    /// Iterate over per-body statistics in name order.
    pub fn bodies(&self) -> impl Iterator<Item = (&str, &BodyStats)> {
        self.bodies.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Scalar motion complexity, non-negative.
    pub const fn complexity(&self) -> f64 {
        self.complexity
    }

    /// Number of frames summarized.
    pub const fn frames(&self) -> usize {
        self.frames
    }

    /// Clip duration at the given frame rate.
    pub fn duration_secs(&self, fps: f64) -> f64 {
        self.frames as f64 / fps
    }

    /// Largest `magnitude` over all bodies, 0.0 for a clip with no bodies.
    pub fn max_magnitude(&self) -> f64 {
        self.bodies.values().map(|b| b.magnitude).fold(0.0, f64::max)
    }
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Summarize a clip using body position tracks for complexity.
pub fn summarize(frames: &[MotionSample]) -> Result<MotionStats, MotionError> {
    summarize_with_channels(frames, &[])
}

/// Summarize a clip, taking complexity from `channels` when any are given.
pub fn summarize_with_channels(
    frames: &[MotionSample],
    channels: &[ChannelGroup],
) -> Result<MotionStats, MotionError> {
    let first = frames.first().ok_or(MotionError::EmptyClip)?;

    let mut tracks: BTreeMap<&str, Vec<Vector3<f64>>> = first
        .names()
        .map(|name| (name, Vec::with_capacity(frames.len())))
        .collect();
    for (index, frame) in frames.iter().enumerate() {
        for (name, track) in &mut tracks {
            let position = frame.get(name).ok_or_else(|| MotionError::InconsistentFrame {
                frame: index,
                body: (*name).to_owned(),
            })?;
            track.push(*position);
        }
    }

    for group in channels {
        if group.frames() != frames.len() {
            return Err(MotionError::ChannelFrames {
                group: group.name().to_owned(),
                expected: frames.len(),
                found: group.frames(),
            });
        }
    }

    let bodies: BTreeMap<String, BodyStats> = tracks
        .iter()
        .map(|(name, track)| ((*name).to_owned(), BodyStats::from_track(track)))
        .collect();

    let complexity = if channels.is_empty() {
        mean(bodies.values().map(|b| mean(b.stddev().iter().copied())))
    } else {
        mean(channels.iter().map(channel_spread))
    };

    tracing::debug!(
        frames = frames.len(),
        bodies = bodies.len(),
        channels = channels.len(),
        complexity,
        "summarized motion clip"
    );

    Ok(MotionStats {
        bodies,
        complexity,
        frames: frames.len(),
    })
}

/// Summarize several clips independently.
pub fn summarize_batch<C>(
    clips: impl IntoIterator<Item = C>,
) -> Result<Vec<MotionStats>, MotionError>
where
    C: AsRef<[MotionSample]>,
{
    clips
        .into_iter()
        .enumerate()
        .map(|(clip, frames)| {
            summarize(frames.as_ref()).map_err(|e| MotionError::InClip {
                clip,
                source: Box::new(e),
            })
        })
        .collect()
}

/// Mean complexity over several summaries; `None` when empty.
///
/// Values are summed in sorted order, so the result does not depend on the
/// order of `stats`.
pub fn mean_complexity(stats: &[MotionStats]) -> Option<f64> {
    if stats.is_empty() {
        return None;
    }
    let mut values: Vec<f64> = stats.iter().map(MotionStats::complexity).collect();
    values.sort_by(f64::total_cmp);
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean per-column standard deviation of a channel group.
fn channel_spread(group: &ChannelGroup) -> f64 {
    mean((0..group.dims()).map(|dim| {
        let m = mean(group.column(dim));
        mean(group.column(dim).map(|v| (v - m) * (v - m))).sqrt()
    }))
}

/// Arithmetic mean, 0.0 for an empty sequence.
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn clip(points: &[(f64, f64, f64)]) -> Vec<MotionSample> {
        points
            .iter()
            .map(|&(x, y, z)| MotionSample::new().with("pelvis", Vector3::new(x, y, z)))
            .collect()
    }

    #[test]
    fn constant_motion_has_zero_spread() {
        let frames = clip(&[(0.1, 0.2, 0.9); 5]);
        let stats = summarize(&frames).unwrap();
        let pelvis = stats.body("pelvis").unwrap();
        assert_relative_eq!(pelvis.variance, Vector3::zeros(), epsilon = 1e-15);
        assert_relative_eq!(pelvis.magnitude, 0.0);
        assert_relative_eq!(stats.complexity(), 0.0);
        assert_eq!(stats.frames(), 5);
    }

    #[test]
    fn componentwise_statistics() {
        let frames = clip(&[(0.0, 0.0, 1.0), (2.0, 0.0, 1.0), (4.0, 3.0, 1.0)]);
        let stats = summarize(&frames).unwrap();
        let b = stats.body("pelvis").unwrap();

        assert_relative_eq!(b.min, Vector3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(b.max, Vector3::new(4.0, 3.0, 1.0));
        assert_relative_eq!(b.mean, Vector3::new(2.0, 1.0, 1.0), epsilon = 1e-12);
        // Population variance: x = (4 + 0 + 4) / 3, y = (1 + 1 + 4) / 3.
        assert_relative_eq!(b.variance, Vector3::new(8.0 / 3.0, 2.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(b.range, Vector3::new(4.0, 3.0, 0.0));
        assert_relative_eq!(b.magnitude, 5.0, epsilon = 1e-12);

        let expected = ((8.0_f64 / 3.0).sqrt() + 2.0_f64.sqrt()) / 3.0;
        assert_relative_eq!(stats.complexity(), expected, epsilon = 1e-12);
    }

    #[test]
    fn complexity_averages_bodies() {
        let frames = vec![
            MotionSample::new()
                .with("a", Vector3::new(0.0, 0.0, 0.0))
                .with("b", Vector3::new(0.0, 0.0, 0.0)),
            MotionSample::new()
                .with("a", Vector3::new(2.0, 2.0, 2.0))
                .with("b", Vector3::new(0.0, 0.0, 0.0)),
        ];
        let stats = summarize(&frames).unwrap();
        // a: stddev 1 on every axis, b: 0.
        assert_relative_eq!(stats.complexity(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(stats.max_magnitude(), 12.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn channels_replace_position_complexity() {
        let frames = clip(&[(0.0, 0.0, 0.0), (10.0, 10.0, 10.0)]);
        let trans = ChannelGroup::new("trans", vec![vec![0.0, 0.0], vec![2.0, 0.0]]).unwrap();
        let pose = ChannelGroup::new("pose", vec![vec![1.0], vec![1.0]]).unwrap();

        let stats = summarize_with_channels(&frames, &[trans, pose]).unwrap();
        // trans: (1 + 0) / 2, pose: 0, mean over groups 0.25.
        assert_relative_eq!(stats.complexity(), 0.25, epsilon = 1e-12);
        // Body statistics still come from positions.
        assert_relative_eq!(stats.body("pelvis").unwrap().range, Vector3::repeat(10.0));
    }

    #[test]
    fn channel_frame_count_must_match() {
        let frames = clip(&[(0.0, 0.0, 0.0); 3]);
        let group = ChannelGroup::new("trans", vec![vec![0.0]; 2]).unwrap();
        assert!(matches!(
            summarize_with_channels(&frames, &[group]),
            Err(MotionError::ChannelFrames { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn empty_clip_rejected() {
        assert!(matches!(summarize(&[]), Err(MotionError::EmptyClip)));
    }

    #[test]
    fn missing_body_in_later_frame() {
        let frames = vec![
            MotionSample::new()
                .with("pelvis", Vector3::zeros())
                .with("head", Vector3::zeros()),
            MotionSample::new().with("pelvis", Vector3::zeros()),
        ];
        match summarize(&frames) {
            Err(MotionError::InconsistentFrame { frame, body }) => {
                assert_eq!(frame, 1);
                assert_eq!(body, "head");
            }
            other => panic!("expected InconsistentFrame, got {other:?}"),
        }
    }

    #[test]
    fn extra_bodies_in_later_frames_are_ignored() {
        let frames = vec![
            MotionSample::new().with("pelvis", Vector3::zeros()),
            MotionSample::new()
                .with("pelvis", Vector3::zeros())
                .with("head", Vector3::zeros()),
        ];
        let stats = summarize(&frames).unwrap();
        assert!(stats.body("head").is_none());
    }

    #[test]
    fn batch_reports_failing_clip() {
        let good = clip(&[(0.0, 0.0, 0.0)]);
        let clips = vec![good.clone(), Vec::new(), good];
        match summarize_batch(&clips) {
            Err(MotionError::InClip { clip, source }) => {
                assert_eq!(clip, 1);
                assert!(matches!(*source, MotionError::EmptyClip));
            }
            other => panic!("expected InClip, got {other:?}"),
        }
    }

    #[test]
    fn mean_complexity_is_order_independent() {
        let a = summarize(&clip(&[(0.0, 0.0, 0.0), (2.0, 2.0, 2.0)])).unwrap();
        let b = summarize(&clip(&[(0.0, 0.0, 0.0), (0.2, 0.0, 0.0)])).unwrap();
        let c = summarize(&clip(&[(0.0, 0.0, 0.0); 2])).unwrap();

        let forward = mean_complexity(&[a.clone(), b.clone(), c.clone()]).unwrap();
        let backward = mean_complexity(&[c, b, a]).unwrap();
        assert_eq!(forward.to_bits(), backward.to_bits());
        assert!(mean_complexity(&[]).is_none());
    }

    #[test]
    fn duration_from_frame_rate() {
        let stats = summarize(&clip(&[(0.0, 0.0, 0.0); 60])).unwrap();
        assert_relative_eq!(stats.duration_secs(30.0), 2.0);
    }
}
