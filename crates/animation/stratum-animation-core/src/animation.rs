//! The Animation data-block: layers, strips, and outputs.
//!
//! Layers and outputs keep their order in side vectors; the elements themselves
//! live in slot maps so handles to unrelated elements survive insertion and
//! removal. Strips of all layers share one slot map, each layer records the keys
//! of its own strips in evaluation order.

use std::sync::atomic::{AtomicU32, Ordering};

use log::{debug, warn};
use slotmap::SlotMap;

use crate::config::Config;
use crate::error::KeyframeError;
use crate::fcurve::{FCurve, KeyframeSettings};
use crate::ids::{AnimationId, Handle, LayerKey, OutputKey, Slotted, StableIndex, StripKey};
use crate::layer::Layer;
use crate::output::Output;
use crate::strip::{Strip, StripType};

pub type LayerHandle = Handle<Layer>;
pub type StripHandle = Handle<Strip>;
pub type OutputHandle = Handle<Output>;

#[derive(Debug)]
pub struct Animation {
    pub(crate) id: AnimationId,
    pub(crate) name: String,
    pub(crate) config: Config,
    pub(crate) layers: SlotMap<LayerKey, Layer>,
    pub(crate) layer_order: Vec<LayerKey>,
    pub(crate) active_layer: Option<LayerKey>,
    pub(crate) strips: SlotMap<StripKey, Strip>,
    pub(crate) outputs: SlotMap<OutputKey, Output>,
    pub(crate) output_order: Vec<OutputKey>,
    pub(crate) last_output_stable_index: AtomicU32,
    pub(crate) users: u32,
}

impl Animation {
    pub fn new(name: &str) -> Self {
        Self::with_config(name, Config::default())
    }

    pub fn with_config(name: &str, config: Config) -> Self {
        Self {
            id: AnimationId::new(),
            name: name.to_string(),
            config,
            layers: SlotMap::with_key(),
            layer_order: Vec::new(),
            active_layer: None,
            strips: SlotMap::with_key(),
            outputs: SlotMap::with_key(),
            output_order: Vec::new(),
            last_output_stable_index: AtomicU32::new(0),
            users: 0,
        }
    }

    pub fn id(&self) -> AnimationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of targets currently bound to this Animation.
    pub fn users(&self) -> u32 {
        self.users
    }

    /// Highest stable index handed out so far.
    pub fn last_output_stable_index(&self) -> StableIndex {
        StableIndex(self.last_output_stable_index.load(Ordering::Acquire))
    }

    /// Key of a handle issued by this Animation. Foreign handles yield `None`.
    pub(crate) fn own<T: Slotted>(&self, handle: Handle<T>) -> Option<T::Key> {
        (handle.owner() == self.id).then(|| handle.key())
    }

    /* Layers */

    /// Append a layer with full influence and make it the active layer.
    pub fn layer_add(&mut self, name: &str) -> LayerHandle {
        let key = self.layers.insert(Layer::new(name));
        self.layer_order.push(key);
        self.active_layer = Some(key);
        debug!("animation '{}': added layer '{name}'", self.name);
        LayerHandle::new(self.id, key)
    }

    /// Remove a layer and every strip on it. Returns false for handles that
    /// do not belong to this Animation.
    pub fn layer_remove(&mut self, handle: LayerHandle) -> bool {
        let Some(key) = self.own(handle) else {
            return false;
        };
        let Some(pos) = self.layer_order.iter().position(|k| *k == key) else {
            return false;
        };
        let Some(layer) = self.layers.remove(key) else {
            return false;
        };
        self.layer_order.remove(pos);
        for strip in &layer.strips {
            self.strips.remove(*strip);
        }
        if self.active_layer == Some(key) {
            self.active_layer = self.layer_order.last().copied();
        }
        debug!(
            "animation '{}': removed layer '{}' with {} strips",
            self.name,
            layer.name(),
            layer.strip_count()
        );
        true
    }

    pub fn layer_count(&self) -> usize {
        self.layer_order.len()
    }

    /// Layers in evaluation order.
    pub fn layers(&self) -> impl Iterator<Item = LayerHandle> + '_ {
        let owner = self.id;
        self.layer_order
            .iter()
            .map(move |key| LayerHandle::new(owner, *key))
    }

    pub fn layer(&self, handle: LayerHandle) -> Option<&Layer> {
        self.layers.get(self.own(handle)?)
    }

    pub fn layer_mut(&mut self, handle: LayerHandle) -> Option<&mut Layer> {
        let key = self.own(handle)?;
        self.layers.get_mut(key)
    }

    pub fn active_layer(&self) -> Option<LayerHandle> {
        self.active_layer.map(|key| LayerHandle::new(self.id, key))
    }

    pub fn set_active_layer(&mut self, handle: LayerHandle) -> bool {
        match self.own(handle).filter(|key| self.layers.contains_key(*key)) {
            Some(key) => {
                self.active_layer = Some(key);
                true
            }
            None => false,
        }
    }

    pub(crate) fn layers_in_order(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.layer_order
            .iter()
            .filter_map(|key| self.layers.get(*key))
    }

    /* Strips */

    /// Append an unbounded strip to a layer.
    pub fn strip_add(&mut self, layer: LayerHandle, strip_type: StripType) -> Option<StripHandle> {
        let layer_key = self.own(layer)?;
        if !self.layers.contains_key(layer_key) {
            return None;
        }
        let key = self
            .strips
            .insert(Strip::with_lookup(strip_type, self.config.channel_lookup));
        let layer = self.layers.get_mut(layer_key)?;
        layer.strips.push(key);
        debug!("layer '{}': added {strip_type:?} strip", layer.name());
        Some(StripHandle::new(self.id, key))
    }

    /// Remove a strip from a layer. Returns false unless the strip is on that layer.
    pub fn strip_remove(&mut self, layer: LayerHandle, strip: StripHandle) -> bool {
        let (Some(layer_key), Some(strip_key)) = (self.own(layer), self.own(strip)) else {
            return false;
        };
        let Some(layer) = self.layers.get_mut(layer_key) else {
            return false;
        };
        let Some(pos) = layer.strips.iter().position(|k| *k == strip_key) else {
            return false;
        };
        layer.strips.remove(pos);
        debug!("layer '{}': removed strip", layer.name());
        self.strips.remove(strip_key).is_some()
    }

    /// Strips of a layer in evaluation order. Empty for foreign handles.
    pub fn strips(&self, layer: LayerHandle) -> impl Iterator<Item = StripHandle> + '_ {
        let owner = self.id;
        self.layer(layer)
            .into_iter()
            .flat_map(move |layer| {
                layer
                    .strips
                    .iter()
                    .map(move |key| StripHandle::new(owner, *key))
            })
    }

    pub fn strip(&self, handle: StripHandle) -> Option<&Strip> {
        self.strips.get(self.own(handle)?)
    }

    pub fn strip_mut(&mut self, handle: StripHandle) -> Option<&mut Strip> {
        let key = self.own(handle)?;
        self.strips.get_mut(key)
    }

    pub(crate) fn strips_of<'a>(
        &'a self,
        layer: &'a Layer,
    ) -> impl Iterator<Item = &'a Strip> + 'a {
        layer.strips.iter().filter_map(|key| self.strips.get(*key))
    }

    /* Keyframing */

    /// Insert a key for `output` on a keyframe strip, using the configured
    /// default keyframe settings.
    pub fn keyframe_insert(
        &mut self,
        strip: StripHandle,
        output: OutputHandle,
        rna_path: &str,
        array_index: i32,
        time: f32,
        value: f32,
    ) -> Result<&mut FCurve, KeyframeError> {
        let settings = self.config.keyframe;
        self.keyframe_insert_with(strip, output, rna_path, array_index, time, value, &settings)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn keyframe_insert_with(
        &mut self,
        strip: StripHandle,
        output: OutputHandle,
        rna_path: &str,
        array_index: i32,
        time: f32,
        value: f32,
        settings: &KeyframeSettings,
    ) -> Result<&mut FCurve, KeyframeError> {
        let output = match self.own(output).and_then(|key| self.outputs.get(key)) {
            Some(output) => output,
            None => {
                warn!("{}", KeyframeError::UnknownOutput);
                return Err(KeyframeError::UnknownOutput);
            }
        };
        let strip = match self.own(strip).and_then(|key| self.strips.get_mut(key)) {
            Some(strip) => strip,
            None => {
                warn!("{}", KeyframeError::UnknownStrip);
                return Err(KeyframeError::UnknownStrip);
            }
        };
        let Some(key_strip) = strip.as_keyframe_mut() else {
            warn!("{}", KeyframeError::NotKeyframeStrip);
            return Err(KeyframeError::NotKeyframeStrip);
        };
        key_strip.keyframe_insert(output, rna_path, array_index, time, value, settings)
    }

    /* Curves */

    /// Every curve of every strip, in layer and strip order.
    pub fn curves(&self) -> impl Iterator<Item = &FCurve> + '_ {
        self.layers_in_order()
            .flat_map(move |layer| self.strips_of(layer))
            .filter_map(Strip::as_keyframe)
            .flat_map(|key_strip| key_strip.channel_groups())
            .flat_map(|group| group.fcurves())
    }

    /// Visit every curve mutably (storage order).
    pub fn for_each_curve_mut(&mut self, mut f: impl FnMut(&mut FCurve)) {
        for strip in self.strips.values_mut() {
            if let Some(key_strip) = strip.as_keyframe_mut() {
                for group in key_strip.channel_groups_mut() {
                    group.fcurves_mut().iter_mut().for_each(&mut f);
                }
            }
        }
    }
}

/// Deep copy. The copy gets a fresh identity and no users; handles issued by
/// the source are not valid on it.
impl Clone for Animation {
    fn clone(&self) -> Self {
        Self {
            id: AnimationId::new(),
            name: self.name.clone(),
            config: self.config.clone(),
            layers: self.layers.clone(),
            layer_order: self.layer_order.clone(),
            active_layer: self.active_layer,
            strips: self.strips.clone(),
            outputs: self.outputs.clone(),
            output_order: self.output_order.clone(),
            last_output_stable_index: AtomicU32::new(
                self.last_output_stable_index.load(Ordering::Acquire),
            ),
            users: 0,
        }
    }
}
