//! Target-side collaborators.
//!
//! A host object that wants to be animated implements [`Animatable`] (identity
//! plus the binding record it carries) and [`PropertyTarget`] (resolving and
//! writing float properties by path). Property handles are small string keys.

use serde::{Deserialize, Serialize};

use crate::ids::{AnimationId, IdType, StableIndex};

/// Opaque property handle (small string key).
pub type TargetHandle = String;

/// Binding record living on an animated target.
///
/// Records which Animation drives the target and which Output of it. The cached
/// output name lets a target find its Output again by name when the stable
/// index is meaningless, e.g. after being assigned to a different Animation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimBinding {
    pub animation: Option<AnimationId>,
    pub output_stable_index: StableIndex,
    pub output_name: String,
}

impl AnimBinding {
    pub fn is_bound_to(&self, animation: AnimationId) -> bool {
        self.animation == Some(animation)
    }
}

/// A data-block that may carry an animation binding.
pub trait Animatable {
    fn id_type(&self) -> IdType;

    /// Type-prefixed name, e.g. `OBCube`.
    fn id_name(&self) -> &str;

    /// Name without the type prefix.
    fn name(&self) -> &str {
        self.id_type().strip_prefix(self.id_name())
    }

    fn anim_binding(&self) -> Option<&AnimBinding>;

    /// Binding record, created on demand. `None` when this kind of target
    /// cannot be animated at all.
    fn anim_binding_ensure(&mut self) -> Option<&mut AnimBinding>;
}

/// A resolved property location: which property and which component of it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedProperty {
    pub handle: TargetHandle,
    pub component: usize,
}

/// Float property access by (path, array index).
pub trait PropertyTarget {
    fn resolve_property(&self, rna_path: &str, array_index: i32) -> Option<ResolvedProperty>;

    /// Write a value to a previously resolved location. Returns false if the
    /// location no longer exists.
    fn write_property(&mut self, property: &ResolvedProperty, value: f32) -> bool;

    /// The authoritative object this one is an evaluated copy of, if any.
    fn original_mut(&mut self) -> Option<&mut dyn PropertyTarget> {
        None
    }
}
