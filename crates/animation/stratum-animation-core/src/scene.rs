//! In-memory scene object: a reference animation target.
//!
//! Properties are named float arrays (`location` -> `[x, y, z]`). An evaluated
//! copy keeps its original boxed inside it so flush-to-original has somewhere to
//! write.

use hashbrown::HashMap;

use crate::binding::{AnimBinding, Animatable, PropertyTarget, ResolvedProperty};
use crate::ids::IdType;

#[derive(Clone, Debug)]
pub struct SceneObject {
    id_type: IdType,
    id_name: String,
    properties: HashMap<String, Vec<f32>>,
    binding: Option<AnimBinding>,
    animatable: bool,
    original: Option<Box<SceneObject>>,
}

impl SceneObject {
    pub fn new(id_type: IdType, name: &str) -> Self {
        Self {
            id_type,
            id_name: format!("{id_type}{name}"),
            properties: HashMap::new(),
            binding: None,
            animatable: true,
            original: None,
        }
    }

    /// An object (`OB`) with a zeroed `location` property.
    pub fn object(name: &str) -> Self {
        Self::new(IdType::OBJECT, name).with_property("location", [0.0, 0.0, 0.0])
    }

    pub fn with_property(mut self, rna_path: &str, values: impl Into<Vec<f32>>) -> Self {
        self.set_property(rna_path, values);
        self
    }

    /// Mark this object as a kind that cannot carry animation.
    pub fn without_animation_support(mut self) -> Self {
        self.animatable = false;
        self
    }

    pub fn set_property(&mut self, rna_path: &str, values: impl Into<Vec<f32>>) {
        self.properties.insert(rna_path.to_string(), values.into());
    }

    pub fn property(&self, rna_path: &str) -> Option<&[f32]> {
        self.properties.get(rna_path).map(Vec::as_slice)
    }

    pub fn property_value(&self, rna_path: &str, index: usize) -> Option<f32> {
        self.property(rna_path)?.get(index).copied()
    }

    pub fn rename(&mut self, name: &str) {
        self.id_name = format!("{}{name}", self.id_type);
    }

    /// Clone this object as an evaluated copy that owns its original.
    pub fn evaluated_copy(&self) -> SceneObject {
        let mut copy = self.clone();
        copy.original = Some(Box::new(self.clone()));
        copy
    }

    pub fn original(&self) -> Option<&SceneObject> {
        self.original.as_deref()
    }
}

impl Animatable for SceneObject {
    fn id_type(&self) -> IdType {
        self.id_type
    }

    fn id_name(&self) -> &str {
        &self.id_name
    }

    fn anim_binding(&self) -> Option<&AnimBinding> {
        self.binding.as_ref()
    }

    fn anim_binding_ensure(&mut self) -> Option<&mut AnimBinding> {
        if !self.animatable {
            return None;
        }
        Some(self.binding.get_or_insert_with(AnimBinding::default))
    }
}

impl PropertyTarget for SceneObject {
    fn resolve_property(&self, rna_path: &str, array_index: i32) -> Option<ResolvedProperty> {
        let component = usize::try_from(array_index).ok()?;
        let values = self.properties.get(rna_path)?;
        (component < values.len()).then(|| ResolvedProperty {
            handle: rna_path.to_string(),
            component,
        })
    }

    fn write_property(&mut self, property: &ResolvedProperty, value: f32) -> bool {
        match self
            .properties
            .get_mut(&property.handle)
            .and_then(|values| values.get_mut(property.component))
        {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    fn original_mut(&mut self) -> Option<&mut dyn PropertyTarget> {
        self.original
            .as_deref_mut()
            .map(|original| original as &mut dyn PropertyTarget)
    }
}
