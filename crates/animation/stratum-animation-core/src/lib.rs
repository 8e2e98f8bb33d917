//! Stratum Animation Core (engine-agnostic)
//!
//! Layered animation data-blocks: an [`Animation`] holds ordered layers of
//! strips and a set of outputs. Targets bind to one output each; evaluation
//! walks the layers, samples the active strip of each, blends the per-property
//! results and writes them back through [`PropertyTarget`].

pub mod accumulate;
pub mod animation;
pub mod binding;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod fcurve;
pub mod ids;
pub mod interp;
pub mod layer;
pub mod library;
pub mod output;
pub mod sampling;
pub mod scene;
pub mod stored_animation;
pub mod strip;

// Re-exports for consumers (hosts)
pub use accumulate::{blend_layer_results, EvaluationResult, PropIdentifier};
pub use animation::{Animation, LayerHandle, OutputHandle, StripHandle};
pub use binding::{AnimBinding, Animatable, PropertyTarget, ResolvedProperty, TargetHandle};
pub use config::{ChannelLookup, Config};
pub use error::{InsertKeyError, KeyframeError, StoredAnimationError};
pub use evaluation::{evaluate_animation, evaluate_layer, EvalContext};
pub use fcurve::{CurveFlags, FCurve, Interpolation, Keyframe, KeyframeSettings, KeyframeType};
pub use ids::{AnimationId, Handle, IdType, StableIndex};
pub use layer::{Layer, MixMode};
pub use library::AnimationLibrary;
pub use output::Output;
pub use sampling::sample_fcurve;
pub use scene::SceneObject;
pub use stored_animation::{parse_stored_animation_json, to_stored_animation_json};
pub use strip::{ChannelGroup, KeyframeStrip, Strip, StripData, StripType};
