//! ConcurrentMultiMap - A reader-writer locked multi valued map
//!
//! Each `String` key is associated with an ordered sequence of values.
//! `put` appends to a key's sequence, while `put_all` and `replace_values`
//! swap the whole sequence out. Values keep the order they were added in.
//!
//! ```text
//! a -> 1, 2
//! b -> 3
//! ```
//!
//! Reads share the instance's lock and writes hold it exclusively, each for
//! the duration of a single call. `get` and `entries` hand back copies, so
//! the caller may mutate what they receive freely.
//!
//! Removal comes in two flavours with deliberately different results:
//!
//! * `delete(key, value)` drops every occurrence of `value`, and removes the
//!   key itself once its sequence is empty.
//! * `delete_all(key)` empties the sequence but leaves the key present.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use tracing::trace;

#[cfg(feature = "serde")]
use serde::{
    de::{Deserialize, Deserializer},
    ser::{Serialize, SerializeMap, Serializer},
};

use crate::utils::{remove_matching, slice_eq, DefaultHashBuilder};

/// A map of keys to ordered value sequences, guarded by one reader-writer
/// lock.
///
/// Share it between threads with an `Arc` or a scoped borrow.
///
/// # Examples
/// ```
/// use lockmaps::multimap::ConcurrentMultiMap;
///
/// let mmap = ConcurrentMultiMap::new(4);
/// mmap.put("a", 1);
/// mmap.put("a", 2);
/// assert_eq!(mmap.get("a"), vec![1, 2]);
///
/// mmap.delete("a", &1);
/// assert_eq!(mmap.get("a"), vec![2]);
///
/// assert_eq!(mmap.delete_all("a"), Some(vec![2]));
/// assert!(mmap.contains_key("a"));
/// assert!(mmap.get("a").is_empty());
///
/// assert_eq!(mmap.replace_values("missing", [3]), None);
/// assert!(!mmap.contains_key("missing"));
/// ```
pub struct ConcurrentMultiMap<V, S = DefaultHashBuilder> {
    hint: usize,
    items: RwLock<HashMap<String, Vec<V>, S>>,
}

impl<V> ConcurrentMultiMap<V, DefaultHashBuilder> {
    /// Create an empty multimap whose backing storage is sized by `hint`.
    pub fn new(hint: usize) -> Self {
        Self::with_hasher(hint, DefaultHashBuilder::default())
    }
}

impl<V, S> ConcurrentMultiMap<V, S>
where
    S: BuildHasher + Clone,
{
    /// Create an empty multimap using `hasher` for the backing storage.
    pub fn with_hasher(hint: usize, hasher: S) -> Self {
        ConcurrentMultiMap {
            hint,
            items: RwLock::new(HashMap::with_capacity_and_hasher(hint, hasher)),
        }
    }

    /// The capacity hint this multimap was created with.
    pub fn hint(&self) -> usize {
        self.hint
    }

    /// Remove every key and value, leaving the multimap empty.
    pub fn clear(&self) {
        let previous = {
            let mut items = self.items.write();
            let hasher = items.hasher().clone();
            std::mem::replace(&mut *items, HashMap::with_capacity_and_hasher(self.hint, hasher))
        };
        trace!(hint = self.hint, dropped = previous.len(), "clear");
        drop(previous);
    }

    /// Returns true if `key` is present and at least one of its values is
    /// equal to `value`.
    pub fn contains_entry(&self, key: &str, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.items
            .read()
            .get(key)
            .map(|values| values.contains(value))
            .unwrap_or(false)
    }

    /// Returns true if `key` is present, even if its sequence is empty.
    pub fn contains_key(&self, key: &str) -> bool {
        self.items.read().contains_key(key)
    }

    /// Returns true if any key holds a value equal to `value`.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        let items = self.items.read();
        items.values().any(|values| values.contains(value))
    }

    /// Snapshot of every key and its sequence.
    ///
    /// Both the outer map and the inner sequences are copies. Mutating them
    /// has no effect on this multimap.
    pub fn entries(&self) -> HashMap<String, Vec<V>, S>
    where
        V: Clone,
    {
        self.items.read().clone()
    }

    /// Compare the content of this multimap to `other`. They are equal when
    /// they have the same number of keys, and each key of this multimap maps
    /// to a sequence in `other` of the same length with equal values in the
    /// same positions.
    pub fn equals<S2>(&self, other: &HashMap<String, Vec<V>, S2>) -> bool
    where
        V: PartialEq,
        S2: BuildHasher,
    {
        let items = self.items.read();
        if items.len() != other.len() {
            return false;
        }
        items.iter().all(|(k, values)| {
            other
                .get(k)
                .map(|theirs| slice_eq(values, theirs))
                .unwrap_or(false)
        })
    }

    /// Returns a copy of the values associated with `key`. An absent key
    /// yields an empty sequence.
    pub fn get(&self, key: &str) -> Vec<V>
    where
        V: Clone,
    {
        self.items.read().get(key).cloned().unwrap_or_default()
    }

    /// Returns true if this multimap contains no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `value` to the sequence of `key`, creating it if needed.
    pub fn put<K: Into<String>>(&self, key: K, value: V) {
        self.items
            .write()
            .entry(key.into())
            .or_default()
            .push(value);
    }

    /// Set the sequence of `key` to exactly `values`, discarding anything
    /// previously stored for it. Unlike `replace_values` this creates the
    /// key when it is absent.
    pub fn put_all<K: Into<String>>(&self, key: K, values: Vec<V>) {
        let previous = self.items.write().insert(key.into(), values);
        drop(previous);
    }

    /// Remove every occurrence of `value` from the sequence of `key`. The
    /// remaining values keep their order. If nothing is left the key is
    /// removed as well.
    pub fn delete(&self, key: &str, value: &V)
    where
        V: PartialEq,
    {
        let removed = {
            let mut items = self.items.write();
            let Some(values) = items.get_mut(key) else {
                return;
            };
            let removed = remove_matching(values, value);
            if values.is_empty() {
                items.remove(key);
                trace!(key, removed = removed.len(), "delete removed key");
            }
            removed
        };
        // Dropped with the lock released.
        drop(removed);
    }

    /// Empty the sequence of `key` in place, returning what it held. The key
    /// stays present. Returns `None`, and changes nothing, if the key is
    /// absent.
    pub fn delete_all(&self, key: &str) -> Option<Vec<V>> {
        let mut items = self.items.write();
        let values = items.get_mut(key)?;
        let capacity = values.len();
        let previous = std::mem::replace(values, Vec::with_capacity(capacity));
        trace!(key, len = previous.len(), "delete_all");
        Some(previous)
    }

    /// Replace the sequence of an existing `key` with `values`, returning a
    /// copy of the new sequence. Returns `None`, and does not create the key,
    /// if it is absent.
    pub fn replace_values<I>(&self, key: &str, values: I) -> Option<Vec<V>>
    where
        I: IntoIterator<Item = V>,
        V: Clone,
    {
        let values: Vec<V> = values.into_iter().collect();
        let (previous, current) = {
            let mut items = self.items.write();
            let slot = items.get_mut(key)?;
            let previous = std::mem::replace(slot, values);
            (previous, slot.clone())
        };
        trace!(key, len = current.len(), dropped = previous.len(), "replace_values");
        drop(previous);
        Some(current)
    }

    /// The number of distinct keys. This is not the total number of values.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }
}

impl<V, S> Default for ConcurrentMultiMap<V, S>
where
    S: BuildHasher + Clone + Default,
{
    fn default() -> Self {
        Self::with_hasher(0, S::default())
    }
}

impl<V, S> fmt::Debug for ConcurrentMultiMap<V, S>
where
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = self.items.read();
        f.debug_map().entries(items.iter()).finish()
    }
}

impl<V, S> FromIterator<(String, V)> for ConcurrentMultiMap<V, S>
where
    S: BuildHasher + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mmap = Self::default();
        for (k, v) in iter {
            mmap.put(k, v);
        }
        mmap
    }
}

impl<V, S> From<HashMap<String, Vec<V>, S>> for ConcurrentMultiMap<V, S> {
    fn from(items: HashMap<String, Vec<V>, S>) -> Self {
        ConcurrentMultiMap {
            hint: items.len(),
            items: RwLock::new(items),
        }
    }
}

#[cfg(feature = "serde")]
impl<V, S> Serialize for ConcurrentMultiMap<V, S>
where
    V: Serialize,
{
    fn serialize<Se>(&self, serializer: Se) -> Result<Se::Ok, Se::Error>
    where
        Se: Serializer,
    {
        let items = self.items.read();
        let mut state = serializer.serialize_map(Some(items.len()))?;

        for (key, values) in items.iter() {
            state.serialize_entry(key, values)?;
        }

        state.end()
    }
}

#[cfg(feature = "serde")]
impl<'de, V, S> Deserialize<'de> for ConcurrentMultiMap<V, S>
where
    V: Deserialize<'de>,
    S: BuildHasher + Clone + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items = HashMap::<String, Vec<V>, S>::deserialize(deserializer)?;
        Ok(Self::from(items))
    }
}
