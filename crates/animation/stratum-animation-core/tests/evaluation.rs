use stratum_animation_core::evaluation::evaluate_result;
use stratum_animation_core::{
    evaluate_animation, evaluate_layer, Animation, EvalContext, KeyframeSettings, MixMode,
    OutputHandle, SceneObject, StableIndex, StripHandle, StripType,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn setup() -> (Animation, SceneObject, OutputHandle) {
    let mut anim = Animation::new("Anim");
    let mut cube = SceneObject::object("Cube").with_property("location", [-1.0, -2.0, -3.0]);
    let out = anim.output_add();
    assert!(anim.assign_id(Some(out), &mut cube));
    (anim, cube, out)
}

fn keyed_strip(
    anim: &mut Animation,
    layer_name: &str,
    out: OutputHandle,
    keys: &[(i32, f32, f32)],
) -> StripHandle {
    let layer = anim.layer_add(layer_name);
    let strip = anim.strip_add(layer, StripType::Keyframe).unwrap();
    for (index, time, value) in keys {
        anim.keyframe_insert_with(
            strip,
            out,
            "location",
            *index,
            *time,
            *value,
            &KeyframeSettings::linear(),
        )
        .unwrap();
    }
    strip
}

/// it should sample a single layer and only touch animated components
#[test]
fn evaluate_single_layer() {
    let (mut anim, mut cube, out) = setup();
    keyed_strip(&mut anim, "Kübus layer", out, &[(0, 1.0, 47.0), (0, 5.0, 47.1)]);

    evaluate_animation(&mut cube, &anim, StableIndex(1), &EvalContext::at(3.0), false);

    // halfway between the keys
    approx(cube.property_value("location", 0).unwrap(), 47.05, 1e-4);
    assert_eq!(cube.property_value("location", 1), Some(-2.0));
    assert_eq!(cube.property_value("location", 2), Some(-3.0));
}

/// it should add the second layer on top of the first
#[test]
fn evaluate_replace_then_add() {
    let (mut anim, mut cube, out) = setup();
    keyed_strip(&mut anim, "Base", out, &[(0, 1.0, 10.0)]);
    keyed_strip(&mut anim, "Additive", out, &[(0, 1.0, 4.0), (1, 1.0, 6.0)]);
    let additive = anim.layers().nth(1).unwrap();
    {
        let layer = anim.layer_mut(additive).unwrap();
        layer.mix_mode = MixMode::Add;
        layer.influence = 0.5;
    }

    evaluate_animation(&mut cube, &anim, StableIndex(1), &EvalContext::at(1.0), false);
    approx(cube.property_value("location", 0).unwrap(), 12.0, 1e-5);
    // only in the second layer: added to zero
    approx(cube.property_value("location", 1).unwrap(), 3.0, 1e-5);
}

/// it should ignore influence and mix mode of the first contributing layer
#[test]
fn first_layer_passes_through() {
    let (mut anim, mut cube, out) = setup();
    keyed_strip(&mut anim, "Base", out, &[(0, 1.0, 10.0)]);
    let base = anim.layers().next().unwrap();
    {
        let layer = anim.layer_mut(base).unwrap();
        layer.mix_mode = MixMode::Multiply;
        layer.influence = 0.25;
    }
    evaluate_animation(&mut cube, &anim, StableIndex(1), &EvalContext::at(1.0), false);
    approx(cube.property_value("location", 0).unwrap(), 10.0, 0.0);
}

/// it should skip layers without influence entirely
#[test]
fn zero_influence_contributes_nothing() {
    let (mut anim, mut cube, out) = setup();
    keyed_strip(&mut anim, "Base", out, &[(0, 1.0, 10.0)]);
    keyed_strip(&mut anim, "Silenced", out, &[(0, 1.0, 999.0), (2, 1.0, 999.0)]);
    let silenced = anim.layers().nth(1).unwrap();
    anim.layer_mut(silenced).unwrap().influence = 0.0;

    evaluate_animation(&mut cube, &anim, StableIndex(1), &EvalContext::at(1.0), false);
    approx(cube.property_value("location", 0).unwrap(), 10.0, 0.0);
    assert_eq!(cube.property_value("location", 2), Some(-3.0));

    // alone, a silenced layer writes nothing
    let base = anim.layers().next().unwrap();
    anim.layer_mut(base).unwrap().influence = -1.0;
    let result = evaluate_result(&cube, &anim, StableIndex(1), &EvalContext::at(1.0));
    assert!(result.is_none());
}

/// it should blend with each mix mode in layer order
#[test]
fn mix_modes_in_layer_order() {
    let cases = [
        (MixMode::Replace, 2.0),
        (MixMode::Offset, 7.0),
        (MixMode::Add, 12.0),
        (MixMode::Subtract, 8.0),
        (MixMode::Multiply, 20.0),
    ];
    for (mode, expected) in cases {
        let (mut anim, mut cube, out) = setup();
        keyed_strip(&mut anim, "Base", out, &[(0, 1.0, 10.0)]);
        keyed_strip(&mut anim, "Top", out, &[(0, 1.0, 4.0)]);
        let top = anim.layers().nth(1).unwrap();
        let layer = anim.layer_mut(top).unwrap();
        layer.mix_mode = mode;
        layer.influence = 0.5;

        evaluate_animation(&mut cube, &anim, StableIndex(1), &EvalContext::at(1.0), false);
        approx(cube.property_value("location", 0).unwrap(), expected, 1e-5);
    }
}

/// it should use the first strip containing the frame and apply its offset
#[test]
fn strip_range_and_offset() {
    let (mut anim, cube, out) = setup();
    let first = keyed_strip(&mut anim, "Timeline", out, &[(0, 0.0, 0.0), (0, 10.0, 10.0)]);
    let layer = anim.layers().next().unwrap();
    anim.strip_mut(first).unwrap().resize(0.0, 10.0);

    let second = anim.strip_add(layer, StripType::Keyframe).unwrap();
    for (time, value) in [(0.0, 100.0), (10.0, 200.0)] {
        let settings = KeyframeSettings::linear();
        anim.keyframe_insert_with(second, out, "location", 0, time, value, &settings)
            .unwrap();
    }
    {
        let strip = anim.strip_mut(second).unwrap();
        strip.resize(5.0, f32::INFINITY);
        strip.frame_offset = 20.0;
    }

    let sample = |t: f32| {
        evaluate_layer(&cube, &anim, layer, StableIndex(1), &EvalContext::at(t))
            .and_then(|r| r.value("location", 0))
    };
    approx(sample(3.0).unwrap(), 3.0, 1e-5);
    // both strips contain frame 7: the first one wins
    approx(sample(7.0).unwrap(), 7.0, 1e-5);
    // 25 - 20 = 5 in strip time
    approx(sample(25.0).unwrap(), 150.0, 1e-4);
    approx(sample(12.0).unwrap(), 100.0, 0.0);
    assert_eq!(sample(-1.0), None);
}

/// it should fall through to the next strip when a strip has nothing for the output
#[test]
fn strip_without_channels_is_skipped() {
    let (mut anim, cube, out) = setup();
    let layer = anim.layer_add("Base");
    let empty = anim.strip_add(layer, StripType::Keyframe).unwrap();
    let keyed = anim.strip_add(layer, StripType::Keyframe).unwrap();
    anim.keyframe_insert(keyed, out, "location", 0, 1.0, 5.0).unwrap();

    let result = evaluate_layer(&cube, &anim, layer, StableIndex(1), &EvalContext::at(1.0))
        .unwrap();
    approx(result.value("location", 0).unwrap(), 5.0, 0.0);
    assert!(anim.strip(empty).unwrap().as_keyframe().unwrap().channel_groups().is_empty());
}

/// it should only evaluate the curves of the requested output
#[test]
fn outputs_are_partitioned() {
    let (mut anim, mut cube, out) = setup();
    let mut suzanne = SceneObject::object("Suzanne");
    let out_suzanne = anim.assign_animation(&mut suzanne).unwrap();
    let layer = anim.layer_add("Base");
    let strip = anim.strip_add(layer, StripType::Keyframe).unwrap();
    anim.keyframe_insert(strip, out, "location", 0, 1.0, 1.0).unwrap();
    anim.keyframe_insert(strip, out_suzanne, "location", 0, 1.0, 2.0).unwrap();

    evaluate_animation(&mut cube, &anim, StableIndex(1), &EvalContext::at(1.0), false);
    evaluate_animation(&mut suzanne, &anim, StableIndex(2), &EvalContext::at(1.0), false);
    approx(cube.property_value("location", 0).unwrap(), 1.0, 0.0);
    approx(suzanne.property_value("location", 0).unwrap(), 2.0, 0.0);
}

/// it should skip unresolvable and muted curves
#[test]
fn unresolved_and_muted_curves() {
    let (mut anim, mut cube, out) = setup();
    let layer = anim.layer_add("Base");
    let strip = anim.strip_add(layer, StripType::Keyframe).unwrap();
    anim.keyframe_insert(strip, out, "location", 0, 1.0, 1.0).unwrap();
    anim.keyframe_insert(strip, out, "location", 7, 1.0, 1.0).unwrap();
    anim.keyframe_insert(strip, out, "does_not_exist", 0, 1.0, 1.0).unwrap();
    anim.keyframe_insert(strip, out, "location", 1, 1.0, 9.0)
        .unwrap()
        .flags
        .insert(stratum_animation_core::CurveFlags::MUTED);

    let result = evaluate_result(&cube, &anim, StableIndex(1), &EvalContext::at(1.0)).unwrap();
    assert_eq!(result.len(), 1);

    evaluate_animation(&mut cube, &anim, StableIndex(1), &EvalContext::at(1.0), false);
    assert_eq!(cube.property("location"), Some(&[1.0, -2.0, -3.0][..]));
}

/// it should mirror values to the original when flushing
#[test]
fn flush_to_original() {
    let (mut anim, cube, out) = setup();
    keyed_strip(&mut anim, "Base", out, &[(0, 1.0, 4.0), (1, 1.0, 5.0)]);

    let mut evaluated = cube.evaluated_copy();
    evaluate_animation(&mut evaluated, &anim, StableIndex(1), &EvalContext::at(1.0), false);
    assert_eq!(evaluated.property_value("location", 0), Some(4.0));
    assert_eq!(evaluated.original().unwrap().property_value("location", 0), Some(-1.0));

    evaluate_animation(&mut evaluated, &anim, StableIndex(1), &EvalContext::at(1.0), true);
    let original = evaluated.original().unwrap();
    assert_eq!(original.property_value("location", 0), Some(4.0));
    assert_eq!(original.property_value("location", 1), Some(5.0));

    // no original: flushing is a no-op beyond the normal write
    let mut plain = SceneObject::object("Cube");
    evaluate_animation(&mut plain, &anim, StableIndex(1), &EvalContext::at(1.0), true);
    assert_eq!(plain.property_value("location", 0), Some(4.0));
}

/// it should skip properties the original cannot resolve
#[test]
fn flush_skips_missing_original_properties() {
    let (mut anim, cube, out) = setup();
    let layer = anim.layer_add("Base");
    let strip = anim.strip_add(layer, StripType::Keyframe).unwrap();
    anim.keyframe_insert(strip, out, "location", 0, 1.0, 4.0).unwrap();
    anim.keyframe_insert(strip, out, "scale", 0, 1.0, 2.0).unwrap();

    let mut evaluated = cube.evaluated_copy();
    evaluated.set_property("scale", [1.0, 1.0, 1.0]);
    evaluate_animation(&mut evaluated, &anim, StableIndex(1), &EvalContext::at(1.0), true);

    assert_eq!(evaluated.property_value("scale", 0), Some(2.0));
    let original = evaluated.original().unwrap();
    assert_eq!(original.property("scale"), None);
    assert_eq!(original.property_value("location", 0), Some(4.0));
}
