//! Object (map) value type.

use alloc::string::{String, ToString};

use indexmap::IndexMap;
use indexmap::map::{IntoIter, Iter, IterMut};
use inlet_path::SourcePath;

use crate::Value;

/// An ordered map of string keys to [`Value`]s.
///
/// Preserves insertion order; replacing the value of an existing key keeps
/// its position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object(IndexMap<String, Value>);

impl Object {
    /// An empty object.
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// An empty object with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self(IndexMap::with_capacity(capacity))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The value stored under `key`, mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert or replace, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Iterate mutably over entries in insertion order.
    pub fn iter_mut(&mut self) -> IterMut<'_, String, Value> {
        self.0.iter_mut()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Copy every entry of `other` into this object; keys of `other` win.
    pub fn merge(&mut self, other: Object) {
        self.0.extend(other.0);
    }

    /// The value at `segments`, descending through objects by key and arrays
    /// by index.
    pub fn get_path<S: AsRef<str>>(&self, segments: &[S]) -> Option<&Value> {
        let (head, rest) = segments.split_first()?;
        let mut current = self.get(head.as_ref())?;
        for segment in rest {
            current = current.child(segment.as_ref())?;
        }
        Some(current)
    }

    /// The value at `segments`, mutably.
    pub fn get_path_mut<S: AsRef<str>>(&mut self, segments: &[S]) -> Option<&mut Value> {
        let (head, rest) = segments.split_first()?;
        let mut current = self.get_mut(head.as_ref())?;
        for segment in rest {
            current = current.child_mut(segment.as_ref())?;
        }
        Some(current)
    }

    /// Whether a value (possibly `Null`) exists at `segments`.
    pub fn contains_path<S: AsRef<str>>(&self, segments: &[S]) -> bool {
        self.get_path(segments).is_some()
    }

    /// Write `value` at `segments`, creating intermediate objects and
    /// replacing any scalar standing in the way. Empty `segments` is a no-op.
    pub fn set_path<S: AsRef<str>>(&mut self, segments: &[S], value: impl Into<Value>) {
        let Some((head, rest)) = segments.split_first() else {
            return;
        };
        let slot = self
            .0
            .entry(head.as_ref().to_string())
            .or_insert(Value::Null);
        slot.set_in(rest, value.into());
    }

    /// [`Object::get_path`] addressed by a [`SourcePath`].
    pub fn get_at(&self, path: &SourcePath) -> Option<&Value> {
        self.get_path(path.segments())
    }

    /// [`Object::get_path_mut`] addressed by a [`SourcePath`].
    pub fn get_at_mut(&mut self, path: &SourcePath) -> Option<&mut Value> {
        self.get_path_mut(path.segments())
    }

    /// [`Object::set_path`] addressed by a [`SourcePath`].
    pub fn set_at(&mut self, path: &SourcePath, value: impl Into<Value>) {
        self.set_path(path.segments(), value);
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Object {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.0
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl IntoIterator for Object {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Object {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
