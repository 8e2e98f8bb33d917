//! Scalar interpolation helpers used by curve sampling and layer blending.

pub mod functions;

pub use functions::{bezier_ease, lerp_f32, DEFAULT_EASE};
