//! ConcurrentMap - A reader-writer locked single valued map
//!
//! A `ConcurrentMap` maps `String` keys to one value each. Every operation
//! takes the instance's lock for its own duration only: reads share the lock,
//! writes hold it exclusively. Values handed back to the caller are clones,
//! and the collection returning operations (`get_all`, `key_set`, `values`)
//! produce snapshots the caller owns outright.
//!
//! Two behaviours are easy to trip over:
//!
//! * `clone()` is an alias. The clone shares the lock and the storage of the
//!   original, so a write through either handle is visible through both. Use
//!   `get_all()` if you need an independent copy.
//! * `put_all()` replaces the *whole* backing map. It does not merge.
//!
//! Nothing here is atomic across two instances. If you need to move a value
//! from one map to another consistently, you must provide that exclusion
//! yourself.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use std::sync::Arc;
use tracing::trace;

#[cfg(feature = "serde")]
use serde::{
    de::{Deserialize, Deserializer},
    ser::{Serialize, SerializeMap, Serializer},
};

#[cfg(feature = "serde")]
use crate::utils::MapCollector;

use crate::utils::DefaultHashBuilder;

struct MapInner<V, S> {
    hint: usize,
    items: RwLock<HashMap<String, V, S>>,
}

/// A single valued map guarded by one reader-writer lock.
///
/// # Examples
/// ```
/// use lockmaps::map::ConcurrentMap;
///
/// let map = ConcurrentMap::new(4);
/// map.put("a", 1);
/// assert_eq!(map.get("a"), Some(1));
///
/// // A clone is the same map.
/// let alias = map.clone();
/// alias.put("b", 2);
/// assert_eq!(map.len(), 2);
/// assert!(map.ptr_eq(&alias));
/// ```
pub struct ConcurrentMap<V, S = DefaultHashBuilder> {
    inner: Arc<MapInner<V, S>>,
}

impl<V> ConcurrentMap<V, DefaultHashBuilder> {
    /// Create an empty map whose backing storage is sized by `hint`. The
    /// hint is also reused each time the map is cleared.
    pub fn new(hint: usize) -> Self {
        Self::with_hasher(hint, DefaultHashBuilder::default())
    }
}

impl<V, S> ConcurrentMap<V, S>
where
    S: BuildHasher + Clone,
{
    /// Create an empty map using `hasher` for the backing storage.
    pub fn with_hasher(hint: usize, hasher: S) -> Self {
        ConcurrentMap {
            inner: Arc::new(MapInner {
                hint,
                items: RwLock::new(HashMap::with_capacity_and_hasher(hint, hasher)),
            }),
        }
    }

    /// The capacity hint this map was created with.
    pub fn hint(&self) -> usize {
        self.inner.hint
    }

    /// Remove all mappings. The backing storage is reallocated with the
    /// original hint.
    pub fn clear(&self) {
        let previous = {
            let mut items = self.inner.items.write();
            let hasher = items.hasher().clone();
            std::mem::replace(
                &mut *items,
                HashMap::with_capacity_and_hasher(self.inner.hint, hasher),
            )
        };
        trace!(hint = self.inner.hint, dropped = previous.len(), "clear");
        // Values are dropped with the lock released.
        drop(previous);
    }

    /// Returns true if `other` is a handle to the same map, IE one was
    /// produced by cloning the other.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns true if a mapping for `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.items.read().contains_key(key)
    }

    /// Returns true if one or more keys map to `value`.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        let items = self.inner.items.read();
        for item in items.values() {
            if item == value {
                return true;
            }
        }
        false
    }

    /// Compare the content of this map to `other`. The maps are equal when
    /// they hold the same number of keys and every key of this map is
    /// associated with an equal value in `other`.
    pub fn equals<S2>(&self, other: &HashMap<String, V, S2>) -> bool
    where
        V: PartialEq,
        S2: BuildHasher,
    {
        let items = self.inner.items.read();
        if items.len() != other.len() {
            return false;
        }
        items.iter().all(|(k, v)| other.get(k) == Some(v))
    }

    /// Returns a clone of the value mapped to `key`, or `None` if there is no
    /// mapping.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        self.inner.items.read().get(key).cloned()
    }

    /// Take a snapshot of every mapping. Changes to the returned map are not
    /// reflected in this one, nor the reverse.
    pub fn get_all(&self) -> HashMap<String, V, S>
    where
        V: Clone,
    {
        self.inner.items.read().clone()
    }

    /// Returns true if this map contains no mappings.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the keys. The order is unspecified.
    pub fn key_set(&self) -> Vec<String> {
        self.inner.items.read().keys().cloned().collect()
    }

    /// Associate `value` with `key`, returning the value it replaced.
    pub fn put<K: Into<String>>(&self, key: K, value: V) -> Option<V> {
        self.inner.items.write().insert(key.into(), value)
    }

    /// Replace the entire content of this map with `src`.
    ///
    /// This is *not* a merge: any mapping not present in `src` is gone once
    /// this returns.
    pub fn put_all(&self, src: HashMap<String, V, S>) {
        let len = src.len();
        let previous = std::mem::replace(&mut *self.inner.items.write(), src);
        trace!(len, dropped = previous.len(), "put_all");
        drop(previous);
    }

    /// Remove the mapping for `key` if present, returning its value.
    pub fn delete(&self, key: &str) -> Option<V> {
        self.inner.items.write().remove(key)
    }

    /// The number of mappings.
    pub fn len(&self) -> usize {
        self.inner.items.read().len()
    }

    /// Snapshot of the values. The order is unspecified, and two calls are
    /// not guaranteed to agree with each other or with `key_set`.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.inner.items.read().values().cloned().collect()
    }
}

impl<V, S> Clone for ConcurrentMap<V, S> {
    /// Returns a new handle to this *same* map. Nothing is copied, and writes
    /// through the clone are seen by the original.
    fn clone(&self) -> Self {
        ConcurrentMap {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, S> Default for ConcurrentMap<V, S>
where
    S: BuildHasher + Clone + Default,
{
    fn default() -> Self {
        Self::with_hasher(0, S::default())
    }
}

impl<V, S> fmt::Debug for ConcurrentMap<V, S>
where
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = self.inner.items.read();
        f.debug_map().entries(items.iter()).finish()
    }
}

impl<V, S> FromIterator<(String, V)> for ConcurrentMap<V, S>
where
    S: BuildHasher + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let items: HashMap<String, V, S> = iter.into_iter().collect();
        let map = Self::with_hasher(items.len(), S::default());
        map.put_all(items);
        map
    }
}

#[cfg(feature = "serde")]
impl<V, S> Serialize for ConcurrentMap<V, S>
where
    V: Serialize,
{
    fn serialize<Se>(&self, serializer: Se) -> Result<Se::Ok, Se::Error>
    where
        Se: Serializer,
    {
        let items = self.inner.items.read();
        let mut state = serializer.serialize_map(Some(items.len()))?;

        for (key, val) in items.iter() {
            state.serialize_entry(key, val)?;
        }

        state.end()
    }
}

#[cfg(feature = "serde")]
impl<'de, V, S> Deserialize<'de> for ConcurrentMap<V, S>
where
    V: Deserialize<'de>,
    S: BuildHasher + Clone + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(MapCollector::<Self, String, V>::new())
    }
}
