use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ops::{Index, RangeBounds},
};

use crate::{natural, Compare, Cursor, CursorMut, Natural, RbTree, Search};

/// An ordered map based on a [red-black tree].
///
/// Entries are stored in the tree as `(key, value)` pairs ordered by key alone; the mapped value
/// never takes part in a comparison.
///
/// [red-black tree]: https://en.wikipedia.org/wiki/Red%E2%80%93black_tree
pub struct RbMap<K, V, C = Natural<K>> {
    tree: RbTree<(K, V), ByKey<C>>,
}

/// Orders map entries by key, ignoring the mapped value.
#[derive(Copy, Clone, Debug, Default)]
pub struct ByKey<C>(C);

impl<C> ByKey<C> {
    /// Returns the key comparator.
    pub fn key_comparator(&self) -> &C {
        &self.0
    }
}

impl<K, V, C: Compare<K>> Compare<(K, V)> for ByKey<C> {
    #[inline]
    fn compare(&self, a: &(K, V), b: &(K, V)) -> Ordering {
        self.0.compare(&a.0, &b.0)
    }
}

impl<K: Ord, V> RbMap<K, V> {
    /// Creates a new, empty `RbMap` ordered by [`Ord`].
    pub fn new() -> Self {
        Self::with_comparator(natural())
    }
}

impl<K, V, C> RbMap<K, V, C> {
    /// Creates a new, empty `RbMap` ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            tree: RbTree::with_comparator(ByKey(cmp)),
        }
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the largest number of elements the map could theoretically hold.
    pub fn max_size(&self) -> usize {
        self.tree.max_size()
    }

    /// Returns the comparator ordering the keys.
    pub fn key_comparator(&self) -> &C {
        self.tree.comparator().key_comparator()
    }

    /// Returns the comparator ordering the entries.
    pub fn value_comparator(&self) -> &ByKey<C> {
        self.tree.comparator()
    }

    /// Returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first().map(|(k, v)| (k, v))
    }

    /// Removes and returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first()
    }

    /// Returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last().map(|(k, v)| (k, v))
    }

    /// Removes and returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last()
    }

    /// Returns a cursor at the entry with the minimum key, or at the end if the map is empty.
    pub fn begin(&self) -> Cursor<'_, (K, V), ByKey<C>> {
        self.tree.begin()
    }

    /// Returns a cursor at the end position, one past the entry with the maximum key.
    pub fn end(&self) -> Cursor<'_, (K, V), ByKey<C>> {
        self.tree.end()
    }

    /// Returns a mutable cursor at the entry with the minimum key, or at the end if the map is
    /// empty.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, (K, V), ByKey<C>> {
        self.tree.cursor_first_mut()
    }

    /// Returns a mutable cursor at the end position.
    pub fn cursor_end_mut(&mut self) -> CursorMut<'_, (K, V), ByKey<C>> {
        self.tree.cursor_end_mut()
    }

    /// Returns an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, &V)> + ExactSizeIterator + '_ {
        self.tree.iter().map(|(k, v)| (k, v))
    }

    /// Returns an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.tree.iter().map(|(k, _)| k)
    }

    /// Returns an iterator over the values of the map, in order by key.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.tree.iter().map(|(_, v)| v)
    }

    /// Exchanges the contents of two maps.
    pub fn swap(&mut self, other: &mut Self) {
        self.tree.swap(&mut other.tree);
    }

    /// Clears the map, removing all elements.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self)
    where
        C: Compare<K>,
    {
        self.tree.assert_invariants();
    }
}

impl<K, V, C: Compare<K>> RbMap<K, V, C> {
    // Returns an ordering closure locating `key` among the entries.
    fn locate<'a>(cmp: &'a C, key: &'a K) -> impl Fn(&(K, V)) -> Ordering + 'a {
        move |(k, _): &(K, V)| cmp.compare(k, key)
    }

    /// Inserts a key-value pair into the map.
    ///
    /// Returns `true` if the pair was inserted. If the map already contains `key`, neither the key
    /// nor the value in the map is changed and `false` is returned.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.tree.insert_raw((key, value)).1
    }

    /// Returns `true` if the map contains a value associated with `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns the number of entries with the given key, which is either 0 or 1.
    pub fn count(&self, key: &K) -> usize {
        usize::from(self.contains_key(key))
    }

    /// Returns a reference to the value associated with `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key and the value associated with `key`.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let cmp = self.key_comparator();
        self.tree
            .find_by(Self::locate(cmp, key))
            .get()
            .map(|(k, v)| (k, v))
    }

    /// Returns a mutable reference to the value associated with `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let node = self.tree.find_raw(Self::locate(self.key_comparator(), key));

        if node == self.tree.header() {
            return None;
        }

        // SAFETY: only the mapped value is exposed, which never takes part in comparisons.
        Some(unsafe { &mut crate::value_mut(node).1 })
    }

    /// Returns a mutable reference to the value associated with `key`, inserting
    /// `V::default()` first if the key is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let search = self.tree.search_raw(Self::locate(self.key_comparator(), &key));

        let node = match search {
            Search::Found(node) => node,
            Search::Vacant(parent, dir) => unsafe {
                self.tree.insert_at(parent, dir, (key, V::default()))
            },
        };

        // SAFETY: only the mapped value is exposed, which never takes part in comparisons.
        unsafe { &mut crate::value_mut(node).1 }
    }

    /// Removes the value associated with `key` from the map.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes the entry associated with `key` from the map, returning the stored key and value.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let node = self.tree.find_raw(Self::locate(self.key_comparator(), key));

        if node == self.tree.header() {
            return None;
        }

        Some(unsafe { self.tree.remove_at(node) })
    }

    /// Removes every entry whose key lies within `range`, returning the number of removed entries.
    pub fn remove_range<R>(&mut self, range: R) -> usize
    where
        R: RangeBounds<K>,
    {
        let cmp = self.key_comparator();
        let (front, back) = self
            .tree
            .span_raw(range.start_bound(), range.end_bound(), |(k, _), b| {
                cmp.compare(k, b)
            });

        unsafe { self.tree.remove_span(front, back) }
    }

    /// Returns an iterator over the entries whose keys lie within `range`, sorted by key.
    pub fn range<R>(&self, range: R) -> Range<'_, K, V, C>
    where
        R: RangeBounds<K>,
    {
        let cmp = self.key_comparator();
        let (front, back) = self
            .tree
            .span_raw(range.start_bound(), range.end_bound(), |(k, _), b| {
                cmp.compare(k, b)
            });

        Range {
            inner: crate::Range::new(&self.tree, front, back),
        }
    }

    /// Returns a cursor at the first entry whose key is not ordered before `key`.
    pub fn lower_bound(&self, key: &K) -> Cursor<'_, (K, V), ByKey<C>> {
        self.tree.lower_bound_by(Self::locate(self.key_comparator(), key))
    }

    /// Returns a cursor at the first entry whose key is ordered after `key`.
    pub fn upper_bound(&self, key: &K) -> Cursor<'_, (K, V), ByKey<C>> {
        self.tree.upper_bound_by(Self::locate(self.key_comparator(), key))
    }

    /// Returns a cursor at the entry with the given key, or at the end if there is none.
    pub fn find(&self, key: &K) -> Cursor<'_, (K, V), ByKey<C>> {
        self.tree.find_by(Self::locate(self.key_comparator(), key))
    }

    /// Returns a mutable cursor at the entry with the given key, or at the end if there is none.
    ///
    /// [`CursorMut::remove_current`] erases the entry at the cursor, and [`CursorMut::insert`]
    /// uses the cursor as an insertion hint.
    pub fn find_mut(&mut self, key: &K) -> CursorMut<'_, (K, V), ByKey<C>> {
        let node = self.tree.find_raw(Self::locate(self.key_comparator(), key));
        CursorMut::new(&mut self.tree, node)
    }

    /// Returns a mutable cursor at the first entry whose key is not ordered before `key`.
    pub fn lower_bound_mut(&mut self, key: &K) -> CursorMut<'_, (K, V), ByKey<C>> {
        let node = self
            .tree
            .lower_bound_raw(Self::locate(self.key_comparator(), key));
        CursorMut::new(&mut self.tree, node)
    }

    /// Returns a mutable cursor at the first entry whose key is ordered after `key`.
    pub fn upper_bound_mut(&mut self, key: &K) -> CursorMut<'_, (K, V), ByKey<C>> {
        let node = self
            .tree
            .upper_bound_raw(Self::locate(self.key_comparator(), key));
        CursorMut::new(&mut self.tree, node)
    }

    /// Returns the pair `(lower_bound(key), upper_bound(key))`.
    pub fn equal_range(
        &self,
        key: &K,
    ) -> (Cursor<'_, (K, V), ByKey<C>>, Cursor<'_, (K, V), ByKey<C>>) {
        (self.lower_bound(key), self.upper_bound(key))
    }
}

impl<K, V, C> CursorMut<'_, (K, V), ByKey<C>> {
    /// Returns a mutable reference to the value of the entry at the cursor.
    ///
    /// This returns `None` if the cursor is pointing to the "ghost" non-element.
    pub fn value_mut(&mut self) -> Option<&mut V> {
        // SAFETY: only the mapped value is exposed, which never takes part in comparisons.
        unsafe { self.get_mut().map(|(_, v)| v) }
    }
}

/// An iterator over a span of the entries of a [`RbMap`], sorted by key.
pub struct Range<'map, K, V, C> {
    inner: crate::Range<'map, (K, V), ByKey<C>>,
}

impl<'map, K, V, C> Iterator for Range<'map, K, V, C> {
    type Item = (&'map K, &'map V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }
}

impl<K, V, C> DoubleEndedIterator for Range<'_, K, V, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, v)| (k, v))
    }
}

impl<K, V, C: Compare<K>> Index<&K> for RbMap<K, V, C> {
    type Output = V;

    /// Returns a reference to the value associated with `key`.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &K) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K: Clone, V: Clone, C: Clone> Clone for RbMap<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<K, V, C: Default> Default for RbMap<K, V, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for RbMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for RbMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl<K: Eq, V: Eq, C> Eq for RbMap<K, V, C> {}

impl<K: PartialOrd, V: PartialOrd, C> PartialOrd for RbMap<K, V, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.tree.partial_cmp(&other.tree)
    }
}

impl<K: Ord, V: Ord, C> Ord for RbMap<K, V, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tree.cmp(&other.tree)
    }
}

impl<K: Hash, V: Hash, C> Hash for RbMap<K, V, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tree.hash(state);
    }
}

impl<K, V, C: Compare<K>> Extend<(K, V)> for RbMap<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.tree.extend(iter);
    }
}

impl<K, V, C: Compare<K> + Default> FromIterator<(K, V)> for RbMap<K, V, C> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = RbMap::default();
        map.extend(iter);
        map
    }
}

impl<K, V, C> IntoIterator for RbMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = crate::IntoIter<(K, V), ByKey<C>>;

    fn into_iter(self) -> Self::IntoIter {
        self.tree.into_iter()
    }
}
