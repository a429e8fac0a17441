#[cfg(feature = "serde")]
use std::fmt;
#[cfg(feature = "serde")]
use std::iter;
#[cfg(feature = "serde")]
use std::marker::PhantomData;

#[cfg(feature = "serde")]
use serde::de::{Deserialize, MapAccess, Visitor};

/// The hasher used by the backing maps unless one is supplied with
/// `with_hasher`.
#[cfg(feature = "foldhash")]
pub type DefaultHashBuilder = foldhash::fast::RandomState;

/// The hasher used by the backing maps unless one is supplied with
/// `with_hasher`.
#[cfg(all(feature = "ahash", not(feature = "foldhash")))]
pub type DefaultHashBuilder = ahash::RandomState;

/// The hasher used by the backing maps unless one is supplied with
/// `with_hasher`.
#[cfg(all(not(feature = "ahash"), not(feature = "foldhash")))]
pub type DefaultHashBuilder = std::collections::hash_map::RandomState;

/// Remove every element equal to `value`, keeping the survivors in their
/// original order. The removed elements are handed back so the caller
/// controls where they are dropped.
pub(crate) fn remove_matching<V: PartialEq>(items: &mut Vec<V>, value: &V) -> Vec<V> {
    let (kept, removed): (Vec<V>, Vec<V>) = std::mem::take(items)
        .into_iter()
        .partition(|item| item != value);
    *items = kept;
    removed
}

/// Positional equality of two sequences. Lengths are compared first so a
/// shorter `other` is a mismatch rather than an out of range index.
pub(crate) fn slice_eq<V: PartialEq>(left: &[V], right: &[V]) -> bool {
    left.len() == right.len() && left.iter().zip(right.iter()).all(|(l, r)| l == r)
}

#[cfg(feature = "serde")]
pub struct MapCollector<T, K, V>(PhantomData<(T, K, V)>);

#[cfg(feature = "serde")]
impl<T, K, V> MapCollector<T, K, V> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

#[cfg(feature = "serde")]
impl<'de, T, K, V> Visitor<'de> for MapCollector<T, K, V>
where
    T: FromIterator<(K, V)>,
    K: Deserialize<'de>,
    V: Deserialize<'de>,
{
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        iter::from_fn(|| access.next_entry().transpose()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{remove_matching, slice_eq};

    #[test]
    fn test_remove_matching_is_stable() {
        let mut items = vec![1, 2, 1, 3, 1, 4];
        assert_eq!(remove_matching(&mut items, &1), [1, 1, 1]);
        assert_eq!(items, [2, 3, 4]);

        assert!(remove_matching(&mut items, &9).is_empty());
        assert_eq!(items, [2, 3, 4]);
    }

    #[test]
    fn test_remove_matching_to_empty() {
        let mut items = vec!["a", "a"];
        assert_eq!(remove_matching(&mut items, &"a").len(), 2);
        assert!(items.is_empty());
    }

    #[test]
    fn test_slice_eq_length_mismatch() {
        assert!(slice_eq(&[1, 2], &[1, 2]));
        assert!(!slice_eq(&[1, 2, 3], &[1, 2]));
        assert!(!slice_eq(&[1], &[1, 2]));
        assert!(!slice_eq(&[1, 2], &[2, 1]));
        assert!(slice_eq::<u8>(&[], &[]));
    }
}
