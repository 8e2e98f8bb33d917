//! Strips: time-bounded segments of animation on a layer.

use hashbrown::HashMap;
use log::warn;

use crate::config::ChannelLookup;
use crate::error::KeyframeError;
use crate::fcurve::{CurveFlags, FCurve, KeyframeSettings};
use crate::ids::StableIndex;
use crate::output::Output;

/// Discriminant used when adding strips.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StripType {
    Keyframe,
}

/// Variant payload of a strip.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum StripData {
    Keyframe(KeyframeStrip),
}

/// A strip covers `[frame_start, frame_end]` (both inclusive, possibly infinite)
/// and shifts evaluation time by `frame_offset` before sampling its data.
#[derive(Clone, Debug, PartialEq)]
pub struct Strip {
    frame_start: f32,
    frame_end: f32,
    /// Positive offsets push the strip's content later in time.
    pub frame_offset: f32,
    data: StripData,
}

impl Strip {
    /// Unbounded strip with no offset.
    pub fn new(strip_type: StripType) -> Self {
        Self::with_lookup(strip_type, ChannelLookup::default())
    }

    pub(crate) fn with_lookup(strip_type: StripType, lookup: ChannelLookup) -> Self {
        let data = match strip_type {
            StripType::Keyframe => StripData::Keyframe(KeyframeStrip::new(lookup)),
        };
        Self::from_parts(f32::NEG_INFINITY, f32::INFINITY, 0.0, data)
    }

    pub(crate) fn from_parts(
        frame_start: f32,
        frame_end: f32,
        frame_offset: f32,
        data: StripData,
    ) -> Self {
        Self {
            frame_start,
            frame_end,
            frame_offset,
            data,
        }
    }

    pub fn strip_type(&self) -> StripType {
        match self.data {
            StripData::Keyframe(_) => StripType::Keyframe,
        }
    }

    pub fn frame_start(&self) -> f32 {
        self.frame_start
    }

    pub fn frame_end(&self) -> f32 {
        self.frame_end
    }

    #[inline]
    pub fn contains_frame(&self, frame: f32) -> bool {
        self.frame_start <= frame && frame <= self.frame_end
    }

    /// Exact comparison with the end frame, no tolerance.
    #[inline]
    pub fn is_last_frame(&self, frame: f32) -> bool {
        frame == self.frame_end
    }

    /// Set the frame range.
    ///
    /// The caller must ensure `start <= end`, `start != +inf` and `end != -inf`.
    pub fn resize(&mut self, frame_start: f32, frame_end: f32) {
        debug_assert!(frame_start <= frame_end);
        debug_assert!(frame_start != f32::INFINITY);
        debug_assert!(frame_end != f32::NEG_INFINITY);
        self.frame_start = frame_start;
        self.frame_end = frame_end;
    }

    pub fn data(&self) -> &StripData {
        &self.data
    }

    pub fn as_keyframe(&self) -> Option<&KeyframeStrip> {
        match &self.data {
            StripData::Keyframe(key_strip) => Some(key_strip),
        }
    }

    pub fn as_keyframe_mut(&mut self) -> Option<&mut KeyframeStrip> {
        match &mut self.data {
            StripData::Keyframe(key_strip) => Some(key_strip),
        }
    }
}

/// Curves on a keyframe strip that belong to one Output.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelGroup {
    output_stable_index: StableIndex,
    fcurves: Vec<FCurve>,
}

impl ChannelGroup {
    pub(crate) fn new(output_stable_index: StableIndex) -> Self {
        Self {
            output_stable_index,
            fcurves: Vec::new(),
        }
    }

    pub fn output_stable_index(&self) -> StableIndex {
        self.output_stable_index
    }

    pub fn fcurves(&self) -> &[FCurve] {
        &self.fcurves
    }

    pub fn fcurves_mut(&mut self) -> &mut [FCurve] {
        &mut self.fcurves
    }

    pub fn fcurve_find(&self, rna_path: &str, array_index: i32) -> Option<&FCurve> {
        self.fcurves
            .iter()
            .find(|curve| curve.matches(rna_path, array_index))
    }

    pub fn fcurve_find_mut(&mut self, rna_path: &str, array_index: i32) -> Option<&mut FCurve> {
        self.fcurves
            .iter_mut()
            .find(|curve| curve.matches(rna_path, array_index))
    }

    /// Append a curve. The caller guarantees its (path, index) is not present yet.
    pub(crate) fn push_fcurve(&mut self, curve: FCurve) {
        debug_assert!(self
            .fcurve_find(curve.rna_path(), curve.array_index())
            .is_none());
        self.fcurves.push(curve);
    }
}

#[derive(Clone, Debug, PartialEq)]
enum ChannelIndex {
    Linear,
    Hashed(HashMap<StableIndex, usize>),
}

/// Keyframe strip: one channel group per animated Output.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeStrip {
    channel_groups: Vec<ChannelGroup>,
    index: ChannelIndex,
}

impl Default for KeyframeStrip {
    fn default() -> Self {
        Self::new(ChannelLookup::default())
    }
}

impl KeyframeStrip {
    pub fn new(lookup: ChannelLookup) -> Self {
        let index = match lookup {
            ChannelLookup::Linear => ChannelIndex::Linear,
            ChannelLookup::Hashed => ChannelIndex::Hashed(HashMap::new()),
        };
        Self {
            channel_groups: Vec::new(),
            index,
        }
    }

    pub fn channel_lookup(&self) -> ChannelLookup {
        match self.index {
            ChannelIndex::Linear => ChannelLookup::Linear,
            ChannelIndex::Hashed(_) => ChannelLookup::Hashed,
        }
    }

    pub fn channel_groups(&self) -> &[ChannelGroup] {
        &self.channel_groups
    }

    pub(crate) fn channel_groups_mut(&mut self) -> &mut [ChannelGroup] {
        &mut self.channel_groups
    }

    fn position(&self, output: StableIndex) -> Option<usize> {
        match &self.index {
            ChannelIndex::Linear => self
                .channel_groups
                .iter()
                .position(|group| group.output_stable_index == output),
            ChannelIndex::Hashed(map) => map.get(&output).copied(),
        }
    }

    pub fn chans_for_out(&self, output: StableIndex) -> Option<&ChannelGroup> {
        self.position(output).map(|pos| &self.channel_groups[pos])
    }

    pub fn chans_for_out_mut(&mut self, output: StableIndex) -> Option<&mut ChannelGroup> {
        let pos = self.position(output)?;
        self.channel_groups.get_mut(pos)
    }

    /// Add the channel group for an Output.
    ///
    /// The strip must not have a group for this Output yet.
    pub fn chans_for_out_add(&mut self, output: StableIndex) -> &mut ChannelGroup {
        debug_assert!(
            self.position(output).is_none(),
            "channel group for output {output} already exists"
        );
        let pos = self.channel_groups.len();
        if let ChannelIndex::Hashed(map) = &mut self.index {
            map.insert(output, pos);
        }
        self.channel_groups.push(ChannelGroup::new(output));
        &mut self.channel_groups[pos]
    }

    /// Remove (and free) the channel group for an Output. Returns false if absent.
    pub fn chans_for_out_remove(&mut self, output: StableIndex) -> bool {
        let Some(pos) = self.position(output) else {
            return false;
        };
        self.channel_groups.remove(pos);
        if let ChannelIndex::Hashed(map) = &mut self.index {
            map.remove(&output);
            for slot in map.values_mut() {
                if *slot > pos {
                    *slot -= 1;
                }
            }
        }
        true
    }

    pub fn fcurve_find(
        &self,
        output: StableIndex,
        rna_path: &str,
        array_index: i32,
    ) -> Option<&FCurve> {
        self.chans_for_out(output)?
            .fcurve_find(rna_path, array_index)
    }

    /// Find the curve for (output, path, index), creating the channel group and
    /// curve when missing. The first curve of a group is created active.
    pub fn fcurve_find_or_create(
        &mut self,
        output: StableIndex,
        rna_path: &str,
        array_index: i32,
    ) -> &mut FCurve {
        let group_pos = match self.position(output) {
            Some(pos) => pos,
            None => {
                self.chans_for_out_add(output);
                self.channel_groups.len() - 1
            }
        };
        let group = &mut self.channel_groups[group_pos];
        if let Some(pos) = group
            .fcurves
            .iter()
            .position(|curve| curve.matches(rna_path, array_index))
        {
            return &mut group.fcurves[pos];
        }

        let mut curve = FCurve::new(rna_path, array_index);
        if group.fcurves.is_empty() {
            curve.flags |= CurveFlags::ACTIVE;
        }
        group.fcurves.push(curve);
        let last = group.fcurves.len() - 1;
        &mut group.fcurves[last]
    }

    /// Insert a key on the curve for (output, path, index).
    ///
    /// Failures are logged and leave existing keys untouched; the channel group
    /// and curve may still have been created.
    pub fn keyframe_insert(
        &mut self,
        output: &Output,
        rna_path: &str,
        array_index: i32,
        time: f32,
        value: f32,
        settings: &KeyframeSettings,
    ) -> Result<&mut FCurve, KeyframeError> {
        let curve = self.fcurve_find_or_create(output.stable_index(), rna_path, array_index);

        if !curve.is_keyframable() {
            let err = KeyframeError::NotKeyframable {
                rna_path: rna_path.to_string(),
                array_index,
                output: output.fallback().to_string(),
            };
            warn!("{err}");
            return Err(err);
        }

        if let Err(reason) = curve.insert_key(time, value, settings) {
            let err = KeyframeError::InsertRejected {
                rna_path: rna_path.to_string(),
                array_index,
                output: output.fallback().to_string(),
                reason,
            };
            warn!("{err}");
            return Err(err);
        }

        Ok(curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INF: f32 = f32::INFINITY;

    #[test]
    fn new_strip_is_unbounded() {
        let strip = Strip::new(StripType::Keyframe);
        assert_eq!(strip.frame_start(), -INF);
        assert_eq!(strip.frame_end(), INF);
        assert_eq!(strip.frame_offset, 0.0);
        assert!(strip.contains_frame(0.0));
        assert!(strip.contains_frame(-100000.0));
        assert!(strip.contains_frame(100000.0));
        assert!(strip.is_last_frame(INF));
    }

    #[test]
    fn finite_range_is_inclusive() {
        let mut strip = Strip::new(StripType::Keyframe);
        strip.resize(1.0, 2.0);
        assert!(!strip.contains_frame(0.0));
        assert!(strip.contains_frame(1.0));
        assert!(strip.contains_frame(2.0));
        assert!(!strip.contains_frame(2.0001));

        assert!(!strip.is_last_frame(1.0));
        assert!(!strip.is_last_frame(1.5));
        assert!(!strip.is_last_frame(1.9999));
        assert!(strip.is_last_frame(2.0));
        assert!(!strip.is_last_frame(2.0001));
    }

    #[test]
    fn last_frame_is_exact_at_large_frame_numbers() {
        // two hours at 24 fps
        let mut strip = Strip::new(StripType::Keyframe);
        strip.resize(1.0, 172800.0);
        assert!(strip.contains_frame(172800.0));
        assert!(!strip.contains_frame(172800.1));
        assert!(!strip.is_last_frame(172799.925));
        assert!(strip.is_last_frame(172800.0));
        assert!(!strip.is_last_frame(172800.075));
    }

    fn lookup_roundtrip(lookup: ChannelLookup) {
        let mut strip = KeyframeStrip::new(lookup);
        for i in 1..=4 {
            strip
                .chans_for_out_add(StableIndex(i))
                .push_fcurve(FCurve::new("location", i as i32));
        }
        assert!(strip.chans_for_out_remove(StableIndex(2)));
        assert!(!strip.chans_for_out_remove(StableIndex(2)));
        assert!(strip.chans_for_out(StableIndex(2)).is_none());
        for i in [1u32, 3, 4] {
            let group = strip.chans_for_out(StableIndex(i)).unwrap();
            assert_eq!(group.output_stable_index(), StableIndex(i));
            assert_eq!(group.fcurves()[0].array_index(), i as i32);
        }
        assert_eq!(strip.channel_groups().len(), 3);
    }

    #[test]
    fn channel_lookup_linear() {
        lookup_roundtrip(ChannelLookup::Linear);
    }

    #[test]
    fn channel_lookup_hashed() {
        lookup_roundtrip(ChannelLookup::Hashed);
    }

    #[test]
    fn first_curve_in_group_is_active() {
        let mut strip = KeyframeStrip::default();
        let out = StableIndex(1);
        strip.fcurve_find_or_create(out, "location", 0);
        strip.fcurve_find_or_create(out, "location", 1);
        strip.fcurve_find_or_create(out, "location", 0);
        let group = strip.chans_for_out(out).unwrap();
        assert_eq!(group.fcurves().len(), 2);
        assert!(group.fcurves()[0].flags.contains(CurveFlags::ACTIVE));
        assert!(!group.fcurves()[1].flags.contains(CurveFlags::ACTIVE));
    }
}
