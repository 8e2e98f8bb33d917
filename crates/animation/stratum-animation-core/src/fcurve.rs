//! F-Curves: keyframed float curves addressed by (rna_path, array_index).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::InsertKeyError;
use crate::sampling::sample_fcurve;

/// Keys closer than this many frames are treated as the same key on insertion.
pub const KEY_MERGE_THRESHOLD: f32 = 0.01;

bitflags! {
    /// Per-curve state flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CurveFlags: u16 {
        const VISIBLE = 1 << 0;
        const SELECTED = 1 << 1;
        /// First curve created in a channel group.
        const ACTIVE = 1 << 2;
        const MUTED = 1 << 3;
        const DISABLED = 1 << 4;
        /// Locked against editing, keys cannot be inserted.
        const PROTECTED = 1 << 5;
        /// Value is produced by a driver, keys cannot be inserted.
        const DRIVEN = 1 << 6;
    }
}

impl Default for CurveFlags {
    fn default() -> Self {
        CurveFlags::VISIBLE | CurveFlags::SELECTED
    }
}

/// Segment interpolation, taken from the key on the left of a segment.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Constant,
    Linear,
    #[default]
    Bezier,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyframeType {
    #[default]
    Keyframe,
    Breakdown,
    MovingHold,
    Extreme,
    Jitter,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub interpolation: Interpolation,
    #[serde(default)]
    pub keyframe_type: KeyframeType,
}

/// Settings for newly inserted keys.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyframeSettings {
    pub interpolation: Interpolation,
    pub keyframe_type: KeyframeType,
}

impl KeyframeSettings {
    pub fn linear() -> Self {
        Self {
            interpolation: Interpolation::Linear,
            ..Self::default()
        }
    }

    pub fn constant() -> Self {
        Self {
            interpolation: Interpolation::Constant,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FCurve {
    rna_path: String,
    array_index: i32,
    keys: Vec<Keyframe>,
    pub flags: CurveFlags,
}

impl FCurve {
    pub fn new(rna_path: impl Into<String>, array_index: i32) -> Self {
        Self {
            rna_path: rna_path.into(),
            array_index,
            keys: Vec::new(),
            flags: CurveFlags::default(),
        }
    }

    /// Build a curve from keys that are already sorted by time.
    pub(crate) fn from_sorted_keys(
        rna_path: String,
        array_index: i32,
        keys: Vec<Keyframe>,
        flags: CurveFlags,
    ) -> Self {
        debug_assert!(keys.windows(2).all(|w| w[0].time <= w[1].time));
        Self {
            rna_path,
            array_index,
            keys,
            flags,
        }
    }

    pub fn rna_path(&self) -> &str {
        &self.rna_path
    }

    pub fn array_index(&self) -> i32 {
        self.array_index
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn matches(&self, rna_path: &str, array_index: i32) -> bool {
        self.array_index == array_index && self.rna_path == rna_path
    }

    /// Insert a key, keeping keys sorted by time. Returns the key's position.
    ///
    /// A key within [`KEY_MERGE_THRESHOLD`] of an existing key overwrites that
    /// key's value and type instead of adding a new one.
    pub fn insert_key(
        &mut self,
        time: f32,
        value: f32,
        settings: &KeyframeSettings,
    ) -> Result<usize, InsertKeyError> {
        if !time.is_finite() {
            return Err(InsertKeyError::NonFiniteTime(time));
        }
        if !value.is_finite() {
            return Err(InsertKeyError::NonFiniteValue(value));
        }

        let pos = self.keys.partition_point(|k| k.time < time);
        let near = |k: &Keyframe| (k.time - time).abs() < KEY_MERGE_THRESHOLD;
        let existing = if self.keys.get(pos).is_some_and(near) {
            Some(pos)
        } else if pos > 0 && self.keys.get(pos - 1).is_some_and(near) {
            Some(pos - 1)
        } else {
            None
        };

        if let Some(idx) = existing {
            let key = &mut self.keys[idx];
            key.value = value;
            key.keyframe_type = settings.keyframe_type;
            return Ok(idx);
        }

        self.keys.insert(
            pos,
            Keyframe {
                time,
                value,
                interpolation: settings.interpolation,
                keyframe_type: settings.keyframe_type,
            },
        );
        Ok(pos)
    }

    /// Whether evaluation should sample this curve at all.
    pub fn is_evaluatable(&self) -> bool {
        !self.keys.is_empty() && !self.flags.intersects(CurveFlags::MUTED | CurveFlags::DISABLED)
    }

    /// Whether keys may be inserted by hand.
    pub fn is_keyframable(&self) -> bool {
        !self
            .flags
            .intersects(CurveFlags::PROTECTED | CurveFlags::DRIVEN)
    }

    #[inline]
    pub fn evaluate(&self, time: f32) -> f32 {
        sample_fcurve(self, time)
    }
}
