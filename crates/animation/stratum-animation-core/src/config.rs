//! Core configuration for stratum-animation-core.

use serde::{Deserialize, Serialize};

use crate::fcurve::KeyframeSettings;

/// How a keyframe strip finds the channel group of an Output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelLookup {
    /// Scan groups in order. Fine for the handful of outputs most strips carry.
    #[default]
    Linear,
    /// Keep a map from stable index to group position.
    Hashed,
}

/// Per-Animation configuration. Missing fields fall back to their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Lookup strategy for strips created by this Animation.
    pub channel_lookup: ChannelLookup,
    /// Settings applied when keys are inserted without explicit settings.
    pub keyframe: KeyframeSettings,
    /// Separator between a name and its numeric suffix when uniquing names.
    pub name_delimiter: char,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channel_lookup: ChannelLookup::Linear,
            keyframe: KeyframeSettings::default(),
            name_delimiter: '.',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "channel_lookup": "hashed" }"#).unwrap();
        assert_eq!(cfg.channel_lookup, ChannelLookup::Hashed);
        assert_eq!(cfg.name_delimiter, '.');
        assert_eq!(cfg.keyframe, KeyframeSettings::default());
    }
}
