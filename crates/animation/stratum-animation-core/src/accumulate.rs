//! Per-property evaluation results and layer blending.

use hashbrown::HashMap;

use crate::binding::ResolvedProperty;
use crate::interp::lerp_f32;
use crate::layer::{Layer, MixMode};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropIdentifier {
    pub rna_path: String,
    pub array_index: i32,
}

impl PropIdentifier {
    pub fn new(rna_path: &str, array_index: i32) -> Self {
        Self {
            rna_path: rna_path.to_string(),
            array_index,
        }
    }
}

/// A value together with where it will be written.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimatedProperty {
    pub value: f32,
    pub resolved: ResolvedProperty,
}

/// Evaluated curves for one Output: property identifier -> value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvaluationResult {
    values: HashMap<PropIdentifier, AnimatedProperty>,
}

impl EvaluationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(
        &mut self,
        rna_path: &str,
        array_index: i32,
        value: f32,
        resolved: ResolvedProperty,
    ) {
        self.values.insert(
            PropIdentifier::new(rna_path, array_index),
            AnimatedProperty { value, resolved },
        );
    }

    pub fn get(&self, key: &PropIdentifier) -> Option<&AnimatedProperty> {
        self.values.get(key)
    }

    pub fn value(&self, rna_path: &str, array_index: i32) -> Option<f32> {
        self.get(&PropIdentifier::new(rna_path, array_index))
            .map(|prop| prop.value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropIdentifier, &AnimatedProperty)> {
        self.values.iter()
    }
}

/// Combine an accumulated value `a` with a layer value `b`.
#[inline]
pub fn mix(mode: MixMode, a: f32, b: f32, influence: f32) -> f32 {
    match mode {
        MixMode::Replace => b * influence,
        MixMode::Offset => lerp_f32(a, b, influence),
        MixMode::Add => a + b * influence,
        MixMode::Subtract => a - b * influence,
        MixMode::Multiply => a * (b * influence),
    }
}

/// Blend `current` (the result of `layer`) into the accumulated `last` result.
///
/// Properties only in `last` pass through. Properties new in `current` are
/// added to zero: `value * influence`.
pub fn blend_layer_results(
    mut last: EvaluationResult,
    current: &EvaluationResult,
    layer: &Layer,
) -> EvaluationResult {
    for (key, prop) in current.iter() {
        match last.values.get_mut(key) {
            Some(acc) => {
                acc.value = mix(layer.mix_mode, acc.value, prop.value, layer.influence);
            }
            None => {
                last.values.insert(
                    key.clone(),
                    AnimatedProperty {
                        value: prop.value * layer.influence,
                        resolved: prop.resolved.clone(),
                    },
                );
            }
        }
    }
    last
}
