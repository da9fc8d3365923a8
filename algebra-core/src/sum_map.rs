//! Sparse keyed sums.
//!
//! A [`SumMap<K, V>`] associates keys with monoid values. Two maps
//! combine key by key; a key missing from one side contributes the
//! identity element. If `V` is a [`CommutativeMonoid`] then so is
//! `SumMap<K, V>`, which is what makes it suitable for accumulating
//! contributions whose order of arrival is arbitrary.
//!
//! Keys are kept ordered so that iteration and `Debug` output are
//! deterministic.

use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::{CommutativeMonoid, Monoid, Semigroup};

/// A sparse map whose values are combined with their monoid operation.
///
/// The map never needs explicit entries for the identity: `get_or_empty`
/// returns `V::empty()` for an absent key. Structural equality is
/// exact, so a map holding an explicit identity entry is not `==` to
/// one without it.
///
/// # Examples
///
/// ```
/// use algebra_core::{Monoid, Semigroup, SumMap};
///
/// #[derive(Clone, Copy, Debug, PartialEq)]
/// struct Add(i64);
///
/// impl Semigroup for Add {
///     fn combine(&self, other: &Self) -> Self {
///         Add(self.0 + other.0)
///     }
/// }
///
/// impl Monoid for Add {
///     fn empty() -> Self {
///         Add(0)
///     }
/// }
///
/// let mut m = SumMap::singleton('a', Add(1));
/// m.accumulate('a', Add(4));
/// m.accumulate('b', Add(2));
///
/// assert_eq!(m.get_or_empty(&'a'), Add(5));
/// assert_eq!(m.get_or_empty(&'b'), Add(2));
/// assert_eq!(m.get_or_empty(&'z'), Add(0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SumMap<K, V> {
    entries: BTreeMap<K, V>,
}

impl<K, V> SumMap<K, V>
where
    K: Ord,
{
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Create a map with a single entry.
    pub fn singleton(key: K, value: V) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(key, value);
        Self { entries }
    }

    /// The stored value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// `true` if `key` has an explicit entry.
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Replace the value for `key`, returning the previous one.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    /// Number of explicit entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if there are no explicit entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, K, V> {
        self.entries.iter()
    }

    /// Iterate keys in order.
    pub fn keys(&self) -> btree_map::Keys<'_, K, V> {
        self.entries.keys()
    }

    /// Apply `f` to every value, keeping the keys.
    ///
    /// ```
    /// use algebra_core::SumMap;
    ///
    /// let m = SumMap::singleton(1u32, 3.0_f64);
    /// let doubled = m.map_values(|v| v * 2.0);
    /// assert_eq!(doubled.get(&1), Some(&6.0));
    /// ```
    pub fn map_values<W, F>(&self, mut f: F) -> SumMap<K, W>
    where
        K: Clone,
        F: FnMut(&V) -> W,
    {
        SumMap {
            entries: self
                .entries
                .iter()
                .map(|(k, v)| (k.clone(), f(v)))
                .collect(),
        }
    }
}

impl<K, V> SumMap<K, V>
where
    K: Ord,
    V: Monoid + Clone,
{
    /// The value for `key`, or the identity element if absent.
    pub fn get_or_empty(&self, key: &K) -> V {
        self.entries.get(key).cloned().unwrap_or_else(V::empty)
    }

    /// Combine `value` into the entry for `key`.
    pub fn accumulate(&mut self, key: K, value: V) {
        match self.entries.entry(key) {
            btree_map::Entry::Occupied(mut slot) => slot.get_mut().combine_assign(&value),
            btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }
}

impl<K: Ord, V> Default for SumMap<K, V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K, V> Semigroup for SumMap<K, V>
where
    K: Ord + Clone,
    V: Monoid + Clone,
{
    fn combine(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.combine_assign(other);
        out
    }

    fn combine_assign(&mut self, other: &Self) {
        for (k, v) in other.iter() {
            self.accumulate(k.clone(), v.clone());
        }
    }
}

impl<K, V> Monoid for SumMap<K, V>
where
    K: Ord + Clone,
    V: Monoid + Clone,
{
    fn empty() -> Self {
        Self::new()
    }
}

impl<K, V> CommutativeMonoid for SumMap<K, V>
where
    K: Ord + Clone,
    V: CommutativeMonoid + Clone,
{
}

/// Collecting accumulates duplicate keys rather than overwriting them.
impl<K, V> FromIterator<(K, V)> for SumMap<K, V>
where
    K: Ord,
    V: Monoid + Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (k, v) in iter {
            out.accumulate(k, v);
        }
        out
    }
}

impl<K, V> IntoIterator for SumMap<K, V> {
    type Item = (K, V);
    type IntoIter = btree_map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, K, V> IntoIterator for &'a SumMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = btree_map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
