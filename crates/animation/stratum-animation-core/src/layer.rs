//! Layers: ordered, blended contributions to the final animated values.

use serde::{Deserialize, Serialize};

use crate::ids::StripKey;

/// How a layer's values combine with the result of the layers before it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixMode {
    /// `b * influence`
    #[default]
    Replace,
    /// Linear blend from the accumulated value towards this layer's value.
    Offset,
    Add,
    Subtract,
    Multiply,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    name: String,
    /// Expected in [0,1]. Layers at or below zero are skipped during evaluation.
    pub influence: f32,
    pub mix_mode: MixMode,
    pub(crate) strips: Vec<StripKey>,
}

impl Layer {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            influence: 1.0,
            mix_mode: MixMode::default(),
            strips: Vec::new(),
        }
    }

    /// Layer names are not uniqued.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn strip_count(&self) -> usize {
        self.strips.len()
    }
}
