//! Layered evaluation of an Animation for one Output.
//!
//! Layers are walked in order. Each layer contributes the result of its first
//! strip that contains the evaluation time and has data for the Output (no
//! blending of overlapping strips within a layer). The first contributing layer
//! is taken as-is; every later one is blended in with its mix mode and
//! influence. The final result is written to the target.

use log::{debug, trace};

use crate::accumulate::{blend_layer_results, EvaluationResult};
use crate::animation::{Animation, LayerHandle};
use crate::binding::PropertyTarget;
use crate::ids::StableIndex;
use crate::layer::Layer;
use crate::strip::{KeyframeStrip, Strip, StripData};

/// Evaluation parameters shared by every layer of one evaluation call.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EvalContext {
    /// Scene time in frames.
    pub eval_time: f32,
}

impl EvalContext {
    pub fn at(eval_time: f32) -> Self {
        Self { eval_time }
    }
}

/// Evaluate `animation` for `output` at the context time, without writing
/// anything. `None` when no layer contributed.
pub fn evaluate_result<T: PropertyTarget + ?Sized>(
    target: &T,
    animation: &Animation,
    output: StableIndex,
    ctx: &EvalContext,
) -> Option<EvaluationResult> {
    let mut last_result: Option<EvaluationResult> = None;

    for layer in animation.layers_in_order() {
        if layer.influence <= 0.0 {
            debug!("skipping layer '{}' without influence", layer.name());
            continue;
        }
        let Some(layer_result) = evaluate_layer_inner(target, animation, layer, output, ctx)
        else {
            continue;
        };
        last_result = Some(match last_result {
            // nothing to blend with yet, influence and mix mode are ignored
            None => layer_result,
            Some(last) => blend_layer_results(last, &layer_result, layer),
        });
    }

    last_result
}

/// Evaluate `animation` for `output` and write the result to `target`.
///
/// With `flush_to_original` the values are also written to the target's
/// original, when it has one.
pub fn evaluate_animation<T: PropertyTarget + ?Sized>(
    target: &mut T,
    animation: &Animation,
    output: StableIndex,
    ctx: &EvalContext,
    flush_to_original: bool,
) {
    if let Some(result) = evaluate_result(&*target, animation, output, ctx) {
        apply_evaluation_result(&result, target, flush_to_original);
    }
}

/// Evaluate a single layer, ignoring its influence and mix mode.
pub fn evaluate_layer<T: PropertyTarget + ?Sized>(
    target: &T,
    animation: &Animation,
    layer: LayerHandle,
    output: StableIndex,
    ctx: &EvalContext,
) -> Option<EvaluationResult> {
    let layer = animation.layer(layer)?;
    evaluate_layer_inner(target, animation, layer, output, ctx)
}

fn evaluate_layer_inner<T: PropertyTarget + ?Sized>(
    target: &T,
    animation: &Animation,
    layer: &Layer,
    output: StableIndex,
    ctx: &EvalContext,
) -> Option<EvaluationResult> {
    animation
        .strips_of(layer)
        .filter(|strip| strip.contains_frame(ctx.eval_time))
        .find_map(|strip| evaluate_strip(target, strip, output, ctx))
}

fn evaluate_strip<T: PropertyTarget + ?Sized>(
    target: &T,
    strip: &Strip,
    output: StableIndex,
    ctx: &EvalContext,
) -> Option<EvaluationResult> {
    // positive offsets move the strip content later, so sample earlier
    let offset_ctx = EvalContext::at(ctx.eval_time - strip.frame_offset);
    match strip.data() {
        StripData::Keyframe(key_strip) => {
            evaluate_keyframe_strip(target, key_strip, output, &offset_ctx)
        }
    }
}

fn evaluate_keyframe_strip<T: PropertyTarget + ?Sized>(
    target: &T,
    key_strip: &KeyframeStrip,
    output: StableIndex,
    ctx: &EvalContext,
) -> Option<EvaluationResult> {
    let group = key_strip.chans_for_out(output)?;

    let mut result = EvaluationResult::new();
    for curve in group.fcurves() {
        if !curve.is_evaluatable() {
            continue;
        }
        let Some(resolved) = target.resolve_property(curve.rna_path(), curve.array_index())
        else {
            trace!(
                "unresolved property {}[{}]",
                curve.rna_path(),
                curve.array_index()
            );
            continue;
        };
        result.store(
            curve.rna_path(),
            curve.array_index(),
            curve.evaluate(ctx.eval_time),
            resolved,
        );
    }
    Some(result)
}

/// Write every value of `result` to `target`, and to its original when
/// `flush_to_original` is set. Originals that cannot resolve a property are
/// skipped for that property.
pub fn apply_evaluation_result<T: PropertyTarget + ?Sized>(
    result: &EvaluationResult,
    target: &mut T,
    flush_to_original: bool,
) {
    for (prop, animated) in result.iter() {
        if !target.write_property(&animated.resolved, animated.value) {
            trace!(
                "could not write {}[{}]",
                prop.rna_path,
                prop.array_index
            );
        }
        if !flush_to_original {
            continue;
        }
        let Some(original) = target.original_mut() else {
            trace!("no original to flush {}[{}] to", prop.rna_path, prop.array_index);
            continue;
        };
        match original.resolve_property(&prop.rna_path, prop.array_index) {
            Some(resolved) => {
                original.write_property(&resolved, animated.value);
            }
            None => trace!(
                "original has no {}[{}], skipping flush",
                prop.rna_path,
                prop.array_index
            ),
        }
    }
}
