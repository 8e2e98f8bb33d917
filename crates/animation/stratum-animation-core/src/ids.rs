//! Identifiers for animations, outputs, targets, and slot-stored entities.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use slotmap::{new_key_type, Key, KeyData};
use uuid::Uuid;

use crate::layer::Layer;
use crate::output::Output;
use crate::strip::Strip;

new_key_type! {
    pub(crate) struct LayerKey;
    pub(crate) struct StripKey;
    pub(crate) struct OutputKey;
}

/// Element kinds stored in an Animation's slot maps, with their key type.
pub(crate) trait Slotted {
    type Key: Key;
}

impl Slotted for Layer {
    type Key = LayerKey;
}

impl Slotted for Strip {
    type Key = StripKey;
}

impl Slotted for Output {
    type Key = OutputKey;
}

/// Identity of one Animation data-block. Fresh for every new or copied Animation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AnimationId(pub Uuid);

impl AnimationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnimationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Permanent identity of an Output within one Animation.
///
/// Allocated once, never reused. `0` means "not assigned".
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StableIndex(pub u32);

impl StableIndex {
    pub const NONE: Self = Self(0);

    #[inline]
    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for StableIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Two-letter code naming the kind of data-block a target is (`OB`, `CA`, ...).
///
/// Target names carry this code as a prefix, so an object called "Cube" has the
/// ID name `OBCube`.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct IdType([u8; 2]);

impl IdType {
    pub const OBJECT: Self = Self(*b"OB");
    pub const CAMERA: Self = Self(*b"CA");
    pub const LIGHT: Self = Self(*b"LA");
    pub const MESH: Self = Self(*b"ME");
    pub const MATERIAL: Self = Self(*b"MA");
    pub const WORLD: Self = Self(*b"WO");
    pub const SCENE: Self = Self(*b"SC");
    pub const ANIMATION: Self = Self(*b"AN");

    /// Parse a two-letter uppercase ASCII code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.as_bytes() {
            [a, b] if a.is_ascii_uppercase() && b.is_ascii_uppercase() => Some(Self([*a, *b])),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("??")
    }

    /// Strip this type's code from the front of an ID name, if present.
    pub fn strip_prefix<'a>(&self, id_name: &'a str) -> &'a str {
        id_name.strip_prefix(self.as_str()).unwrap_or(id_name)
    }
}

impl fmt::Debug for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdType({})", self.as_str())
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for IdType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IdType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        IdType::from_code(&code)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid ID type code '{code}'")))
    }
}

/// Generation-tagged handle to an element stored inside one Animation.
///
/// A handle remembers which Animation created it, so passing it to a different
/// Animation (including a copy of the original) is detected and rejected. Once
/// the element is removed the handle goes stale and never aliases a newer element.
pub struct Handle<T> {
    owner: AnimationId,
    key: KeyData,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// The Animation this handle was issued by.
    pub fn owner(&self) -> AnimationId {
        self.owner
    }
}

impl<T: Slotted> Handle<T> {
    pub(crate) fn new(owner: AnimationId, key: T::Key) -> Self {
        Self {
            owner,
            key: key.data(),
            _marker: PhantomData,
        }
    }

    pub(crate) fn key(&self) -> T::Key {
        T::Key::from(self.key)
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.key == other.key
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("owner", &self.owner)
            .field("key", &self.key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn handle_keys_do_not_alias_reused_slots() {
        let owner = AnimationId::new();
        let mut layers: SlotMap<LayerKey, Layer> = SlotMap::with_key();
        let old = layers.insert(Layer::new("Old"));
        let handle: Handle<Layer> = Handle::new(owner, old);
        assert_eq!(handle.key(), old);
        assert_eq!(handle.owner(), owner);

        layers.remove(old);
        let reused = layers.insert(Layer::new("New"));
        assert_ne!(handle.key(), reused);
        assert!(layers.get(handle.key()).is_none());
        assert_ne!(handle, Handle::<Layer>::new(owner, reused));
    }

    #[test]
    fn stable_index_zero_is_unassigned() {
        assert!(!StableIndex::NONE.is_assigned());
        assert!(StableIndex(1).is_assigned());
        assert_eq!(StableIndex::default(), StableIndex::NONE);
    }

    #[test]
    fn id_type_codes() {
        assert_eq!(IdType::from_code("OB"), Some(IdType::OBJECT));
        assert_eq!(IdType::from_code("ob"), None);
        assert_eq!(IdType::from_code("OBJ"), None);
        assert_eq!(IdType::OBJECT.strip_prefix("OBCube"), "Cube");
        assert_eq!(IdType::CAMERA.strip_prefix("OBCube"), "OBCube");
    }

    #[test]
    fn id_type_serde_as_code() {
        let json = serde_json::to_string(&IdType::CAMERA).unwrap();
        assert_eq!(json, "\"CA\"");
        let back: IdType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, IdType::CAMERA);
        assert!(serde_json::from_str::<IdType>("\"camera\"").is_err());
    }
}
