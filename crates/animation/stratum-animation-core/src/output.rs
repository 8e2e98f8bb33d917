//! Outputs and output resolution.
//!
//! An Output is one independently animatable slot in an Animation. Targets
//! refer to it through their binding record: by stable index once bound to this
//! Animation, otherwise by the cached output name or their own ID name.

use std::sync::atomic::Ordering;

use log::{debug, warn};

use crate::animation::{Animation, OutputHandle};
use crate::binding::Animatable;
use crate::ids::{IdType, OutputKey, StableIndex};

#[derive(Clone, Debug, PartialEq)]
pub struct Output {
    pub(crate) stable_index: StableIndex,
    pub(crate) name: String,
    pub(crate) idtype: Option<IdType>,
    pub(crate) fallback: String,
}

impl Output {
    pub(crate) fn new(stable_index: StableIndex) -> Self {
        Self {
            stable_index,
            name: String::new(),
            idtype: None,
            fallback: String::new(),
        }
    }

    pub fn stable_index(&self) -> StableIndex {
        self.stable_index
    }

    /// Unique within the owning Animation, empty until a target is assigned.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of target this Output is restricted to. `None` accepts any kind.
    pub fn idtype(&self) -> Option<IdType> {
        self.idtype
    }

    /// Name of the first target bound, without its type prefix.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn is_suitable_for(&self, target: &dyn Animatable) -> bool {
        self.idtype.map_or(true, |idtype| idtype == target.id_type())
    }

    fn adopt_target(&mut self, target: &dyn Animatable) {
        if self.idtype.is_none() {
            self.idtype = Some(target.id_type());
        }
        if self.fallback.is_empty() {
            self.fallback = target.name().to_string();
        }
    }
}

/// Strip a trailing `<delim><digits>` suffix, so "Cube.004" uniquifies from "Cube".
fn name_base(name: &str, delimiter: char) -> &str {
    match name.rsplit_once(delimiter) {
        Some((base, digits))
            if !base.is_empty()
                && !digits.is_empty()
                && digits.chars().all(|c| c.is_ascii_digit()) =>
        {
            base
        }
        _ => name,
    }
}

impl Animation {
    /// Reserve the next Output stable index. The first reservation returns 1.
    ///
    /// Only needs a shared reference, so callers holding the Animation behind
    /// `&` can reserve indices concurrently; each call returns a distinct value.
    pub fn next_stable_index(&self) -> StableIndex {
        let previous = self.last_output_stable_index.fetch_add(1, Ordering::AcqRel);
        StableIndex(previous.wrapping_add(1))
    }

    /// Add an Output with the next stable index. The first Output gets index 1.
    pub fn output_add(&mut self) -> OutputHandle {
        let next = self.next_stable_index();
        let key = self.outputs.insert(Output::new(next));
        self.output_order.push(key);
        debug!("animation '{}': added output {}", self.name, next.0);
        OutputHandle::new(self.id, key)
    }

    /// Add an Output pre-configured for `target`: restricted to its type and
    /// with its name as fallback. The Output stays unnamed until assigned.
    pub fn output_add_for(&mut self, target: &dyn Animatable) -> OutputHandle {
        let handle = self.output_add();
        if let Some(output) = self.outputs.get_mut(handle.key()) {
            output.adopt_target(target);
        }
        handle
    }

    pub fn output(&self, handle: OutputHandle) -> Option<&Output> {
        self.outputs.get(self.own(handle)?)
    }

    pub fn output_count(&self) -> usize {
        self.output_order.len()
    }

    /// Outputs in creation order.
    pub fn outputs(&self) -> impl Iterator<Item = OutputHandle> + '_ {
        let owner = self.id;
        self.output_order
            .iter()
            .map(move |key| OutputHandle::new(owner, *key))
    }

    pub fn output_for_stable_index(&self, stable_index: StableIndex) -> Option<OutputHandle> {
        if !stable_index.is_assigned() {
            return None;
        }
        self.find_output(|output| output.stable_index == stable_index)
    }

    pub fn output_find_by_name(&self, name: &str) -> Option<OutputHandle> {
        self.find_output(|output| output.name == name)
    }

    fn find_output(&self, pred: impl Fn(&Output) -> bool) -> Option<OutputHandle> {
        self.output_order
            .iter()
            .copied()
            .find(|key| self.outputs.get(*key).is_some_and(&pred))
            .map(|key| OutputHandle::new(self.id, key))
    }

    fn output_name_taken(&self, skip: OutputKey, name: &str) -> bool {
        self.output_order
            .iter()
            .filter(|key| **key != skip)
            .filter_map(|key| self.outputs.get(*key))
            .any(|output| output.name == name)
    }

    fn unique_output_name(&self, skip: OutputKey, name: &str) -> String {
        if name.is_empty() || !self.output_name_taken(skip, name) {
            return name.to_string();
        }
        let delimiter = self.config.name_delimiter;
        let base = name_base(name, delimiter);
        let mut number = 1u32;
        loop {
            let candidate = format!("{base}{delimiter}{number:03}");
            if !self.output_name_taken(skip, &candidate) {
                return candidate;
            }
            number += 1;
        }
    }

    /// Rename an Output. A name already used by another Output of this
    /// Animation gets a numeric suffix (`Cube` -> `Cube.001`).
    pub fn output_name_set(&mut self, handle: OutputHandle, name: &str) -> bool {
        let Some(key) = self.own(handle) else {
            return false;
        };
        let unique = self.unique_output_name(key, name);
        match self.outputs.get_mut(key) {
            Some(output) => {
                output.name = unique;
                true
            }
            None => false,
        }
    }

    fn output_suitable(&self, handle: OutputHandle, target: &dyn Animatable) -> bool {
        self.output(handle)
            .is_some_and(|output| output.is_suitable_for(target))
    }

    /// Find the Output that should drive `target`.
    ///
    /// Tried in order: the binding's stable index (only when the binding already
    /// points at this Animation), the binding's cached output name, then the
    /// target's own ID name. Every candidate must accept the target's type.
    pub fn find_suitable_output_for(&self, target: &dyn Animatable) -> Option<OutputHandle> {
        if let Some(binding) = target.anim_binding() {
            if binding.is_bound_to(self.id) {
                if let Some(handle) = self
                    .output_for_stable_index(binding.output_stable_index)
                    .filter(|h| self.output_suitable(*h, target))
                {
                    debug!(
                        "{}: matched output by stable index {}",
                        target.id_name(),
                        binding.output_stable_index
                    );
                    return Some(handle);
                }
            }

            if !binding.output_name.is_empty() {
                if let Some(handle) = self
                    .output_find_by_name(&binding.output_name)
                    .filter(|h| self.output_suitable(*h, target))
                {
                    debug!(
                        "{}: matched output by cached name '{}'",
                        target.id_name(),
                        binding.output_name
                    );
                    return Some(handle);
                }
            }
        }

        let handle = self
            .output_find_by_name(target.id_name())
            .filter(|h| self.output_suitable(*h, target))?;
        debug!("{}: matched output by ID name", target.id_name());
        Some(handle)
    }

    /// Bind `target` to this Animation and the given Output.
    ///
    /// `None` binds to the Animation without choosing an Output yet. Fails when
    /// the target cannot be animated, is bound to another Animation, or the
    /// Output rejects the target's type; nothing is modified on failure.
    pub fn assign_id(&mut self, output: Option<OutputHandle>, target: &mut dyn Animatable) -> bool {
        let output_key = match output {
            Some(handle) => match self.own(handle).filter(|key| self.outputs.contains_key(*key)) {
                Some(key) => Some(key),
                None => return false,
            },
            None => None,
        };

        let mut unique_name = None;
        if let Some(key) = output_key {
            let Some(out) = self.outputs.get(key) else {
                return false;
            };
            if !out.is_suitable_for(&*target) {
                warn!(
                    "output '{}' is restricted to {:?}, cannot assign {}",
                    out.name,
                    out.idtype,
                    target.id_name()
                );
                return false;
            }
            if out.name.is_empty() {
                unique_name = Some(self.unique_output_name(key, target.id_name()));
            }
        }

        let id_type = target.id_type();
        let fallback = target.name().to_string();
        let animation_id = self.id;
        let Some(binding) = target.anim_binding_ensure() else {
            debug!("target of type {id_type} cannot be animated");
            return false;
        };
        if binding.animation.is_some_and(|bound| bound != animation_id) {
            debug!("target is bound to another animation, unassign it first");
            return false;
        }
        let newly_bound = binding.animation.is_none();

        binding.animation = Some(animation_id);
        if let Some(out) = output_key.and_then(|key| self.outputs.get_mut(key)) {
            if out.idtype.is_none() {
                out.idtype = Some(id_type);
            }
            if out.fallback.is_empty() {
                out.fallback = fallback;
            }
            if let Some(name) = unique_name {
                out.name = name;
            }
            binding.output_stable_index = out.stable_index;
            binding.output_name = out.name.clone();
        } else {
            binding.output_stable_index = StableIndex::NONE;
        }

        if newly_bound {
            self.users += 1;
        }
        true
    }

    /// Detach `target` from this Animation. The cached output name is refreshed
    /// from the live Output first so a later name match still works.
    pub fn unassign_id(&mut self, target: &mut dyn Animatable) {
        match target.anim_binding().and_then(|binding| binding.animation) {
            None => return,
            Some(bound) if bound != self.id => {
                warn!(
                    "{} is bound to another animation, not unassigning from '{}'",
                    target.id_name(),
                    self.name
                );
                return;
            }
            Some(_) => {}
        }
        let Some(binding) = target.anim_binding_ensure() else {
            return;
        };
        if let Some(output) = self
            .output_for_stable_index(binding.output_stable_index)
            .and_then(|handle| self.output(handle))
        {
            binding.output_name = output.name.clone();
        }
        binding.animation = None;
        self.users = self.users.saturating_sub(1);
    }

    /// Bind `target` to the most suitable Output, creating one when none fits.
    ///
    /// Returns `None` when the target cannot be animated or is bound to another
    /// Animation. Use [`crate::AnimationLibrary::assign_animation`] to switch
    /// between Animations.
    pub fn assign_animation(&mut self, target: &mut dyn Animatable) -> Option<OutputHandle> {
        let bound = target.anim_binding_ensure()?.animation;
        if bound.is_some_and(|other| other != self.id) {
            warn!(
                "{} is bound to another animation, cannot assign '{}'",
                target.id_name(),
                self.name
            );
            return None;
        }
        self.unassign_id(target);

        let output = match self.find_suitable_output_for(&*target) {
            Some(handle) => handle,
            None => self.output_add(),
        };
        self.assign_id(Some(output), target).then_some(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneObject;

    fn set_output(anim: &mut Animation, handle: OutputHandle, stable: u32, name: &str) {
        let output = anim.outputs.get_mut(handle.key()).unwrap();
        output.stable_index = StableIndex(stable);
        output.name = name.to_string();
        output.idtype = Some(IdType::OBJECT);
    }

    #[test]
    fn suitable_output_follows_fallback_chain() {
        let mut anim = Animation::new("Anim");
        let mut cube = SceneObject::object("Küüübus");

        assert_eq!(anim.find_suitable_output_for(&cube), None);

        // name & type match, no binding yet
        let out = anim.output_add();
        set_output(&mut anim, out, 327, "OBKüüübus");
        assert_eq!(anim.find_suitable_output_for(&cube), Some(out));

        // binding has one output's name and the other's stable index, but does
        // not point at this animation: the name wins
        let other = anim.output_add();
        anim.outputs.get_mut(other.key()).unwrap().stable_index = StableIndex(47);
        {
            let binding = cube.anim_binding_ensure().unwrap();
            binding.animation = None;
            binding.output_stable_index = StableIndex(47);
            binding.output_name = "OBKüüübus".to_string();
        }
        assert_eq!(anim.find_suitable_output_for(&cube), Some(out));

        // once bound to this animation, the stable index wins
        cube.anim_binding_ensure().unwrap().animation = Some(anim.id());
        assert_eq!(anim.find_suitable_output_for(&cube), Some(other));

        // nothing in the binding matches: fall back to the ID name
        {
            let binding = cube.anim_binding_ensure().unwrap();
            binding.output_stable_index = StableIndex(161);
            binding.output_name = "¿¿What's this??".to_string();
        }
        assert_eq!(anim.find_suitable_output_for(&cube), Some(out));
    }

    #[test]
    fn wrong_type_is_not_suitable() {
        let mut anim = Animation::new("Anim");
        let out = anim.output_add();
        set_output(&mut anim, out, 1, "CACube");
        let camera = SceneObject::new(IdType::CAMERA, "Cube");
        assert_eq!(anim.find_suitable_output_for(&camera), None);
    }

    #[test]
    fn name_base_strips_numeric_suffix() {
        assert_eq!(name_base("Cube.004", '.'), "Cube");
        assert_eq!(name_base("Cube.v2", '.'), "Cube.v2");
        assert_eq!(name_base("Cube.", '.'), "Cube.");
        assert_eq!(name_base(".001", '.'), ".001");
        assert_eq!(name_base("Cube", '.'), "Cube");
    }
}
