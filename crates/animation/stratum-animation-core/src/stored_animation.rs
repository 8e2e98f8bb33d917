//! Stored (persisted) form of an Animation.
//!
//! Nesting follows the write order every persistence layer must respect:
//! layers, their strips, each strip's channel groups, each group's curves;
//! then the outputs as a flat list.
//!
//! ```json
//! {
//!   "name": "Anim",
//!   "last_output_stable_index": 1,
//!   "layers": [{
//!     "name": "Base", "influence": 1.0, "mix_mode": "replace",
//!     "strips": [{
//!       "frame_offset": 0.0,
//!       "kind": { "type": "keyframe", "channels": [{
//!         "output_stable_index": 1,
//!         "curves": [{ "rna_path": "location", "array_index": 0,
//!                      "keys": [{ "time": 1.0, "value": 47.0, "interpolation": "linear" }] }]
//!       }]}
//!     }]
//!   }],
//!   "outputs": [{ "stable_index": 1, "name": "OBCube", "idtype": "OB", "fallback": "Cube" }]
//! }
//! ```
//!
//! Unbounded strip ends are stored as absent `frame_start` / `frame_end`.

use std::sync::atomic::AtomicU32;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::animation::Animation;
use crate::config::Config;
use crate::error::StoredAnimationError;
use crate::fcurve::{CurveFlags, FCurve, Keyframe};
use crate::ids::{IdType, StableIndex};
use crate::layer::{Layer, MixMode};
use crate::output::Output;
use crate::strip::{ChannelGroup, KeyframeStrip, Strip, StripData};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredAnimation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub last_output_stable_index: u32,
    #[serde(default)]
    pub layers: Vec<StoredLayer>,
    #[serde(default)]
    pub outputs: Vec<StoredOutput>,
    /// Position of the active layer in `layers`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_layer: Option<usize>,
}

fn full_influence() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredLayer {
    #[serde(default)]
    pub name: String,
    #[serde(default = "full_influence")]
    pub influence: f32,
    #[serde(default)]
    pub mix_mode: MixMode,
    #[serde(default)]
    pub strips: Vec<StoredStrip>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredStrip {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_start: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_end: Option<f32>,
    #[serde(default)]
    pub frame_offset: f32,
    pub kind: StoredStripKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoredStripKind {
    Keyframe {
        #[serde(default)]
        channels: Vec<StoredChannelGroup>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredChannelGroup {
    pub output_stable_index: u32,
    #[serde(default)]
    pub curves: Vec<StoredCurve>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredCurve {
    pub rna_path: String,
    #[serde(default)]
    pub array_index: i32,
    #[serde(default)]
    pub flags: StoredCurveFlags,
    #[serde(default)]
    pub keys: Vec<Keyframe>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredCurveFlags {
    pub hidden: bool,
    pub selected: bool,
    pub active: bool,
    pub muted: bool,
    pub disabled: bool,
    pub protected: bool,
    pub driven: bool,
}

impl From<CurveFlags> for StoredCurveFlags {
    fn from(flags: CurveFlags) -> Self {
        Self {
            hidden: !flags.contains(CurveFlags::VISIBLE),
            selected: flags.contains(CurveFlags::SELECTED),
            active: flags.contains(CurveFlags::ACTIVE),
            muted: flags.contains(CurveFlags::MUTED),
            disabled: flags.contains(CurveFlags::DISABLED),
            protected: flags.contains(CurveFlags::PROTECTED),
            driven: flags.contains(CurveFlags::DRIVEN),
        }
    }
}

impl From<StoredCurveFlags> for CurveFlags {
    fn from(stored: StoredCurveFlags) -> Self {
        let mut flags = CurveFlags::empty();
        flags.set(CurveFlags::VISIBLE, !stored.hidden);
        flags.set(CurveFlags::SELECTED, stored.selected);
        flags.set(CurveFlags::ACTIVE, stored.active);
        flags.set(CurveFlags::MUTED, stored.muted);
        flags.set(CurveFlags::DISABLED, stored.disabled);
        flags.set(CurveFlags::PROTECTED, stored.protected);
        flags.set(CurveFlags::DRIVEN, stored.driven);
        flags
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredOutput {
    pub stable_index: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idtype: Option<String>,
    #[serde(default)]
    pub fallback: String,
}

/// Parse StoredAnimation JSON into an Animation using `config`.
pub fn parse_stored_animation_json(
    json: &str,
    config: Config,
) -> Result<Animation, StoredAnimationError> {
    let stored: StoredAnimation = serde_json::from_str(json)?;
    Animation::from_stored(stored, config)
}

/// Serialize an Animation to pretty StoredAnimation JSON.
pub fn to_stored_animation_json(animation: &Animation) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&animation.to_stored())
}

fn bound_to_stored(value: f32) -> Option<f32> {
    value.is_finite().then_some(value)
}

fn load_curve(stored: StoredCurve) -> Result<FCurve, StoredAnimationError> {
    let valid = stored
        .keys
        .iter()
        .all(|k| k.time.is_finite() && k.value.is_finite())
        && stored.keys.windows(2).all(|w| w[0].time < w[1].time);
    if !valid {
        return Err(StoredAnimationError::InvalidKeys {
            rna_path: stored.rna_path,
            array_index: stored.array_index,
        });
    }
    Ok(FCurve::from_sorted_keys(
        stored.rna_path,
        stored.array_index,
        stored.keys,
        stored.flags.into(),
    ))
}

impl Animation {
    /// Snapshot this Animation in its stored form.
    pub fn to_stored(&self) -> StoredAnimation {
        let layers = self
            .layers_in_order()
            .map(|layer| StoredLayer {
                name: layer.name().to_string(),
                influence: layer.influence,
                mix_mode: layer.mix_mode,
                strips: self
                    .strips_of(layer)
                    .map(|strip| StoredStrip {
                        frame_start: bound_to_stored(strip.frame_start()),
                        frame_end: bound_to_stored(strip.frame_end()),
                        frame_offset: strip.frame_offset,
                        kind: match strip.data() {
                            StripData::Keyframe(key_strip) => StoredStripKind::Keyframe {
                                channels: key_strip
                                    .channel_groups()
                                    .iter()
                                    .map(|group| StoredChannelGroup {
                                        output_stable_index: group.output_stable_index().0,
                                        curves: group
                                            .fcurves()
                                            .iter()
                                            .map(|curve| StoredCurve {
                                                rna_path: curve.rna_path().to_string(),
                                                array_index: curve.array_index(),
                                                flags: curve.flags.into(),
                                                keys: curve.keys().to_vec(),
                                            })
                                            .collect(),
                                    })
                                    .collect(),
                            },
                        },
                    })
                    .collect(),
            })
            .collect();

        let outputs = self
            .output_order
            .iter()
            .filter_map(|key| self.outputs.get(*key))
            .map(|output| StoredOutput {
                stable_index: output.stable_index.0,
                name: output.name.clone(),
                idtype: output.idtype.map(|t| t.as_str().to_string()),
                fallback: output.fallback.clone(),
            })
            .collect();

        let active_layer = self
            .active_layer
            .and_then(|active| self.layer_order.iter().position(|k| *k == active));

        StoredAnimation {
            name: self.name.clone(),
            last_output_stable_index: self.last_output_stable_index().0,
            layers,
            outputs,
            active_layer,
        }
    }

    /// Rebuild an Animation from its stored form, validating it on the way.
    ///
    /// The result has a fresh identity and no users. The stable-index counter
    /// never ends up below the highest stored index.
    pub fn from_stored(
        stored: StoredAnimation,
        config: Config,
    ) -> Result<Animation, StoredAnimationError> {
        let mut anim = Animation::with_config(&stored.name, config);
        let layer_count = stored.layers.len();

        if let Some(index) = stored.active_layer {
            if index >= layer_count {
                return Err(StoredAnimationError::InvalidActiveLayer {
                    index,
                    count: layer_count,
                });
            }
        }

        let mut seen = HashSet::new();
        let mut names: HashSet<&str> = HashSet::new();
        let mut max_index = stored.last_output_stable_index;
        for output in &stored.outputs {
            if output.stable_index == 0 {
                return Err(StoredAnimationError::ZeroStableIndex {
                    name: output.name.clone(),
                });
            }
            if !seen.insert(output.stable_index) {
                return Err(StoredAnimationError::DuplicateStableIndex(output.stable_index));
            }
            // unnamed outputs may repeat
            if !output.name.is_empty() && !names.insert(output.name.as_str()) {
                return Err(StoredAnimationError::DuplicateOutputName(output.name.clone()));
            }
            max_index = max_index.max(output.stable_index);
        }
        drop(names);

        for (layer_idx, stored_layer) in stored.layers.into_iter().enumerate() {
            let mut layer = Layer::new(&stored_layer.name);
            layer.influence = stored_layer.influence;
            layer.mix_mode = stored_layer.mix_mode;

            for (strip_idx, stored_strip) in stored_layer.strips.into_iter().enumerate() {
                let start = stored_strip.frame_start.unwrap_or(f32::NEG_INFINITY);
                let end = stored_strip.frame_end.unwrap_or(f32::INFINITY);
                if start.is_nan() || end.is_nan() || start > end {
                    return Err(StoredAnimationError::InvalidStripRange {
                        layer: layer_idx,
                        strip: strip_idx,
                        start,
                        end,
                    });
                }

                let data = match stored_strip.kind {
                    StoredStripKind::Keyframe { channels } => {
                        let mut key_strip = KeyframeStrip::new(anim.config.channel_lookup);
                        for stored_group in channels {
                            let index = StableIndex(stored_group.output_stable_index);
                            if key_strip.chans_for_out(index).is_some() {
                                return Err(StoredAnimationError::DuplicateChannelGroup {
                                    layer: layer_idx,
                                    strip: strip_idx,
                                    stable_index: index.0,
                                });
                            }
                            let mut group = ChannelGroup::new(index);
                            for stored_curve in stored_group.curves {
                                if group
                                    .fcurve_find(&stored_curve.rna_path, stored_curve.array_index)
                                    .is_some()
                                {
                                    return Err(StoredAnimationError::DuplicateCurve {
                                        layer: layer_idx,
                                        strip: strip_idx,
                                        rna_path: stored_curve.rna_path,
                                        array_index: stored_curve.array_index,
                                    });
                                }
                                group.push_fcurve(load_curve(stored_curve)?);
                            }
                            *key_strip.chans_for_out_add(index) = group;
                        }
                        StripData::Keyframe(key_strip)
                    }
                };

                let key = anim.strips.insert(Strip::from_parts(
                    start,
                    end,
                    stored_strip.frame_offset,
                    data,
                ));
                layer.strips.push(key);
            }

            let key = anim.layers.insert(layer);
            anim.layer_order.push(key);
        }
        anim.active_layer = stored
            .active_layer
            .and_then(|index| anim.layer_order.get(index).copied());

        for stored_output in stored.outputs {
            let idtype = match stored_output.idtype {
                Some(code) => Some(
                    IdType::from_code(&code).ok_or(StoredAnimationError::UnknownIdType(code))?,
                ),
                None => None,
            };
            let key = anim.outputs.insert(Output {
                stable_index: StableIndex(stored_output.stable_index),
                name: stored_output.name,
                idtype,
                fallback: stored_output.fallback,
            });
            anim.output_order.push(key);
        }
        anim.last_output_stable_index = AtomicU32::new(max_index);

        Ok(anim)
    }
}
