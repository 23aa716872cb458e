//! Error types for motion summarization.

/// Errors that can occur while summarizing a motion clip.
#[derive(Debug, thiserror::Error)]
pub enum MotionError {
    /// The clip has no frames.
    #[error("motion clip has no frames")]
    EmptyClip,

    /// A frame lacks a body that frame 0 defines.
    #[error("frame {frame} has no position for body {body}")]
    InconsistentFrame { frame: usize, body: String },

    /// A channel group row has the wrong width.
    #[error("channel group {group}: row {row} has {found} values, expected {expected}")]
    ChannelShape {
        group: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A channel group has a different frame count than the clip.
    #[error("channel group {group} has {found} frames, clip has {expected}")]
    ChannelFrames {
        group: String,
        expected: usize,
        found: usize,
    },

    /// A channel group has no rows or no columns.
    #[error("channel group {0} is empty")]
    EmptyChannel(String),

    /// A clip in a batch failed.
    #[error("clip {clip}: {source}")]
    InClip {
        clip: usize,
        #[source]
        source: Box<MotionError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        assert_eq!(MotionError::EmptyClip.to_string(), "motion clip has no frames");

        let e = MotionError::InconsistentFrame {
            frame: 4,
            body: "left_wrist".into(),
        };
        assert_eq!(e.to_string(), "frame 4 has no position for body left_wrist");

        let e = MotionError::ChannelShape {
            group: "pose_body".into(),
            row: 2,
            expected: 63,
            found: 60,
        };
        assert_eq!(
            e.to_string(),
            "channel group pose_body: row 2 has 60 values, expected 63"
        );
    }

    #[test]
    fn batch_error_names_clip() {
        let e = MotionError::InClip {
            clip: 3,
            source: Box::new(MotionError::EmptyClip),
        };
        assert_eq!(e.to_string(), "clip 3: motion clip has no frames");
        assert!(std::error::Error::source(&e).is_some());
    }
}
