//! Error types surfaced by keyframing and stored-animation loading.

use thiserror::Error;

/// Why a curve refused a new key.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum InsertKeyError {
    #[error("key time {0} is not finite")]
    NonFiniteTime(f32),
    #[error("key value {0} is not finite")]
    NonFiniteValue(f32),
}

/// Failure of [`Animation::keyframe_insert`](crate::Animation::keyframe_insert).
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum KeyframeError {
    #[error("strip is not a keyframe strip, unable to insert keys here")]
    NotKeyframeStrip,
    #[error("strip handle does not belong to this animation")]
    UnknownStrip,
    #[error("output handle does not belong to this animation")]
    UnknownOutput,
    #[error("FCurve {rna_path}[{array_index}] for output {output} doesn't allow inserting keys")]
    NotKeyframable {
        rna_path: String,
        array_index: i32,
        output: String,
    },
    #[error("could not insert key into FCurve {rna_path}[{array_index}] for output {output}: {reason}")]
    InsertRejected {
        rna_path: String,
        array_index: i32,
        output: String,
        reason: InsertKeyError,
    },
}

/// Errors from parsing or validating a stored animation.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StoredAnimationError {
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("layer {layer} strip {strip}: invalid frame range [{start}, {end}]")]
    InvalidStripRange {
        layer: usize,
        strip: usize,
        start: f32,
        end: f32,
    },
    #[error("output '{name}' has stable index 0")]
    ZeroStableIndex { name: String },
    #[error("stable index {0} is used by more than one output")]
    DuplicateStableIndex(u32),
    #[error("output name '{0}' is used by more than one output")]
    DuplicateOutputName(String),
    #[error("layer {layer} strip {strip}: more than one channel group for output {stable_index}")]
    DuplicateChannelGroup {
        layer: usize,
        strip: usize,
        stable_index: u32,
    },
    #[error("layer {layer} strip {strip}: curve {rna_path}[{array_index}] appears twice")]
    DuplicateCurve {
        layer: usize,
        strip: usize,
        rna_path: String,
        array_index: i32,
    },
    #[error("curve {rna_path}[{array_index}]: keys must be finite and sorted by time")]
    InvalidKeys { rna_path: String, array_index: i32 },
    #[error("unknown ID type code '{0}'")]
    UnknownIdType(String),
    #[error("active layer index {index} out of range ({count} layers)")]
    InvalidActiveLayer { index: usize, count: usize },
}
