//! AnimationLibrary: the environment that owns Animations and drives targets.
//!
//! Owns every Animation, moves targets between Animations (keeping the user
//! counts of both sides right), and evaluates a target from its binding record.

use log::{debug, trace, warn};

use crate::animation::{Animation, OutputHandle};
use crate::binding::{Animatable, PropertyTarget};
use crate::config::Config;
use crate::error::StoredAnimationError;
use crate::evaluation::{evaluate_animation, EvalContext};
use crate::ids::AnimationId;
use crate::stored_animation::parse_stored_animation_json;

#[derive(Debug, Default)]
pub struct AnimationLibrary {
    config: Config,
    items: Vec<(AnimationId, Animation)>,
}

impl AnimationLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Animations created by this library use `config`.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            items: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create an empty Animation.
    pub fn create(&mut self, name: &str) -> AnimationId {
        self.insert(Animation::with_config(name, self.config.clone()))
    }

    pub fn insert(&mut self, animation: Animation) -> AnimationId {
        let id = animation.id();
        debug!("library: added animation '{}'", animation.name());
        self.items.push((id, animation));
        id
    }

    /// Load a stored animation from JSON.
    pub fn load_json(&mut self, json: &str) -> Result<AnimationId, StoredAnimationError> {
        let animation = parse_stored_animation_json(json, self.config.clone())?;
        Ok(self.insert(animation))
    }

    /// Deep-copy an Animation. The copy starts without users.
    pub fn duplicate(&mut self, id: AnimationId) -> Option<AnimationId> {
        let copy = self.get(id)?.clone();
        Some(self.insert(copy))
    }

    /// Remove an Animation. Targets still bound to it keep a dangling binding
    /// and evaluate to nothing.
    pub fn remove(&mut self, id: AnimationId) -> Option<Animation> {
        let pos = self.items.iter().position(|(aid, _)| *aid == id)?;
        let (_, animation) = self.items.remove(pos);
        if animation.users() > 0 {
            warn!(
                "removing animation '{}' which still has {} users",
                animation.name(),
                animation.users()
            );
        }
        Some(animation)
    }

    pub fn get(&self, id: AnimationId) -> Option<&Animation> {
        self.items
            .iter()
            .find(|(aid, _)| *aid == id)
            .map(|(_, animation)| animation)
    }

    pub fn get_mut(&mut self, id: AnimationId) -> Option<&mut Animation> {
        self.items
            .iter_mut()
            .find(|(aid, _)| *aid == id)
            .map(|(_, animation)| animation)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Animation> {
        self.items.iter().map(|(_, animation)| animation)
    }

    /// Bind `target` to Animation `id`, releasing whatever Animation it was
    /// bound to before. Creates an Output when none suits the target.
    pub fn assign_animation(
        &mut self,
        id: AnimationId,
        target: &mut dyn Animatable,
    ) -> Option<OutputHandle> {
        if self.get(id).is_none() {
            return None;
        }
        let previous = target.anim_binding().and_then(|binding| binding.animation);
        if previous.is_some_and(|prev| prev != id) {
            self.unassign(target);
        }
        self.get_mut(id)?.assign_animation(target)
    }

    /// Release `target` from the Animation it is bound to.
    ///
    /// Returns false when it was not bound. A binding to an Animation that is no
    /// longer in the library is simply cleared.
    pub fn unassign(&mut self, target: &mut dyn Animatable) -> bool {
        let Some(bound) = target.anim_binding().and_then(|binding| binding.animation) else {
            return false;
        };
        match self.get_mut(bound) {
            Some(animation) => animation.unassign_id(target),
            None => {
                if let Some(binding) = target.anim_binding_ensure() {
                    binding.animation = None;
                }
            }
        }
        true
    }

    /// Evaluate the Animation bound to `target` for its bound Output and write
    /// the values. Returns false when there is nothing to evaluate.
    pub fn evaluate_target<T>(
        &self,
        target: &mut T,
        ctx: &EvalContext,
        flush_to_original: bool,
    ) -> bool
    where
        T: Animatable + PropertyTarget + ?Sized,
    {
        let Some(binding) = target.anim_binding() else {
            return false;
        };
        let output = binding.output_stable_index;
        let Some(animation) = binding.animation.and_then(|id| self.get(id)) else {
            trace!("{}: no animation to evaluate", target.id_name());
            return false;
        };
        if !output.is_assigned() {
            trace!("{}: bound without an output", target.id_name());
            return false;
        }
        evaluate_animation(target, animation, output, ctx, flush_to_original);
        true
    }
}
