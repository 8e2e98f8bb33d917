use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stratum_animation_core::{
    evaluate_animation, sample_fcurve, Animation, ChannelLookup, Config, EvalContext, FCurve,
    KeyframeSettings, MixMode, SceneObject, StableIndex, StripType,
};

const PROPERTIES: [&str; 4] = ["location", "rotation_euler", "scale", "color"];

fn build_animation(layers: usize, lookup: ChannelLookup) -> (Animation, SceneObject) {
    let config = Config {
        channel_lookup: lookup,
        keyframe: KeyframeSettings::linear(),
        ..Config::default()
    };
    let mut anim = Animation::with_config("Bench", config);
    let mut target = SceneObject::object("Cube");
    for property in PROPERTIES {
        target.set_property(property, [0.0, 0.0, 0.0]);
    }
    let out = anim.output_add();
    anim.assign_id(Some(out), &mut target);

    for layer_index in 0..layers {
        let layer = anim.layer_add(&format!("Layer {layer_index}"));
        if layer_index > 0 {
            if let Some(data) = anim.layer_mut(layer) {
                data.mix_mode = MixMode::Add;
                data.influence = 0.5;
            }
        }
        for strip_index in 0..2 {
            let Some(strip) = anim.strip_add(layer, StripType::Keyframe) else {
                continue;
            };
            let start = strip_index as f32 * 100.0;
            if let Some(data) = anim.strip_mut(strip) {
                data.resize(start, start + 100.0);
            }
            for property in PROPERTIES {
                for component in 0..3 {
                    for key in 0..20 {
                        let time = start + key as f32 * 5.0;
                        let _ = anim.keyframe_insert(
                            strip,
                            out,
                            property,
                            component,
                            time,
                            (time * 0.1).sin(),
                        );
                    }
                }
            }
        }
    }
    (anim, target)
}

fn sample_benchmark(c: &mut Criterion) {
    let mut curve = FCurve::new("location", 0);
    for i in 0..64 {
        let time = i as f32;
        let _ = curve.insert_key(time, time.cos(), &KeyframeSettings::default());
    }
    c.bench_function("sample_bezier_64_keys", |b| {
        b.iter(|| black_box(sample_fcurve(&curve, black_box(31.5))))
    });
}

fn layered_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_animation");
    for (label, lookup) in [("linear", ChannelLookup::Linear), ("hashed", ChannelLookup::Hashed)] {
        for layers in [1, 4, 16] {
            let (anim, mut target) = build_animation(layers, lookup);
            let ctx = EvalContext::at(142.5);
            group.bench_function(format!("{layers}_layers_{label}"), |b| {
                b.iter(|| {
                    evaluate_animation(
                        black_box(&mut target),
                        &anim,
                        StableIndex(1),
                        &ctx,
                        false,
                    )
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, sample_benchmark, layered_benchmark);
criterion_main!(benches);
