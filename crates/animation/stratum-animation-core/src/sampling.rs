//! F-Curve sampling.
//!
//! Model:
//! - Keys are sorted by frame time.
//! - Before the first key and after the last key the curve holds the end value.
//! - Segment [Ki -> K(i+1)] uses Ki's interpolation:
//!   Constant holds Ki, Linear blends linearly, Bezier eases time with
//!   `interp::DEFAULT_EASE` and then blends linearly.
//!
//! API:
//! - sample_fcurve(&FCurve, time) where time is in frames (already strip-local).

use crate::fcurve::{FCurve, Interpolation, Keyframe};
use crate::interp::{bezier_ease, lerp_f32, DEFAULT_EASE};

/// Find the segment [i, i+1] around `time` and the local parameter in [0,1].
/// Callers handle the out-of-range and single-key cases first.
fn find_segment(keys: &[Keyframe], time: f32) -> (usize, f32) {
    // First key strictly after `time`; always in 1..len for in-range times.
    let right = keys
        .partition_point(|k| k.time <= time)
        .clamp(1, keys.len() - 1);
    let left = right - 1;
    let t0 = keys[left].time;
    let t1 = keys[right].time;
    let denom = (t1 - t0).max(f32::EPSILON);
    (left, ((time - t0) / denom).clamp(0.0, 1.0))
}

/// Sample a curve at `time`. Empty curves yield 0.0.
pub fn sample_fcurve(curve: &FCurve, time: f32) -> f32 {
    let keys = curve.keys();
    match keys {
        [] => 0.0,
        [only] => only.value,
        [first, .., last] => {
            if time <= first.time {
                return first.value;
            }
            if time >= last.time {
                return last.value;
            }
            let (i, lt) = find_segment(keys, time);
            let left = &keys[i];
            let right = &keys[i + 1];
            match left.interpolation {
                Interpolation::Constant => left.value,
                Interpolation::Linear => lerp_f32(left.value, right.value, lt),
                Interpolation::Bezier => {
                    lerp_f32(left.value, right.value, bezier_ease(lt, DEFAULT_EASE))
                }
            }
        }
    }
}
