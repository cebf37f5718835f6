use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ops::RangeBounds,
};

use crate::{natural, Compare, Cursor, CursorMut, IntoIter, Iter, Natural, Range, RbTree};

/// An ordered set based on a [red-black tree].
///
/// [red-black tree]: https://en.wikipedia.org/wiki/Red%E2%80%93black_tree
pub struct RbSet<T, C = Natural<T>> {
    tree: RbTree<T, C>,
}

impl<T: Ord> RbSet<T> {
    /// Creates a new, empty `RbSet` ordered by [`Ord`].
    pub fn new() -> Self {
        Self::with_comparator(natural())
    }
}

impl<T, C> RbSet<T, C> {
    /// Creates a new, empty `RbSet` ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            tree: RbTree::with_comparator(cmp),
        }
    }

    /// Returns `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the largest number of elements the set could theoretically hold.
    pub fn max_size(&self) -> usize {
        self.tree.max_size()
    }

    /// Returns the comparator ordering the set.
    pub fn comparator(&self) -> &C {
        self.tree.comparator()
    }

    /// Returns the minimum element of the set.
    pub fn first(&self) -> Option<&T> {
        self.tree.first()
    }

    /// Returns the maximum element of the set.
    pub fn last(&self) -> Option<&T> {
        self.tree.last()
    }

    /// Removes and returns the minimum element of the set.
    pub fn pop_first(&mut self) -> Option<T> {
        self.tree.pop_first()
    }

    /// Removes and returns the maximum element of the set.
    pub fn pop_last(&mut self) -> Option<T> {
        self.tree.pop_last()
    }

    /// Returns a cursor at the minimum element, or at the end if the set is empty.
    pub fn begin(&self) -> Cursor<'_, T, C> {
        self.tree.begin()
    }

    /// Returns a cursor at the end position, one past the maximum element.
    pub fn end(&self) -> Cursor<'_, T, C> {
        self.tree.end()
    }

    /// Returns a mutable cursor at the minimum element, or at the end if the set is empty.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, T, C> {
        self.tree.cursor_first_mut()
    }

    /// Returns a mutable cursor at the end position.
    pub fn cursor_end_mut(&mut self) -> CursorMut<'_, T, C> {
        self.tree.cursor_end_mut()
    }

    /// Returns an iterator over the elements of the set, in ascending order.
    pub fn iter(&self) -> Iter<'_, T, C> {
        self.tree.iter()
    }

    /// Exchanges the contents of two sets.
    pub fn swap(&mut self, other: &mut Self) {
        self.tree.swap(&mut other.tree);
    }

    /// Clears the set, removing all elements.
    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<T, C: Compare<T>> RbSet<T, C> {
    /// Adds a value to the set.
    ///
    /// Returns `true` if the value was inserted, and `false` if an equivalent value was already
    /// present, in which case the set is unchanged.
    pub fn insert(&mut self, value: T) -> bool {
        self.tree.insert_raw(value).1
    }

    /// Returns `true` if the set contains a value equivalent to `value`.
    pub fn contains(&self, value: &T) -> bool {
        self.tree.contains(value)
    }

    /// Returns the number of elements equivalent to `value`, which is either 0 or 1.
    pub fn count(&self, value: &T) -> usize {
        self.tree.count(value)
    }

    /// Returns a reference to the element equivalent to `value`.
    pub fn get(&self, value: &T) -> Option<&T> {
        self.tree.get(value)
    }

    /// Removes the element equivalent to `value`, returning `true` if it was present.
    pub fn remove(&mut self, value: &T) -> bool {
        self.tree.erase(value) == 1
    }

    /// Removes and returns the element equivalent to `value`.
    pub fn take(&mut self, value: &T) -> Option<T> {
        self.tree.take(value)
    }

    /// Removes every element within `range`, returning the number of removed elements.
    pub fn remove_range<R: RangeBounds<T>>(&mut self, range: R) -> usize {
        self.tree.erase_range(range)
    }

    /// Returns an iterator over the elements within `range`, in ascending order.
    pub fn range<R: RangeBounds<T>>(&self, range: R) -> Range<'_, T, C> {
        self.tree.range(range)
    }

    /// Returns a cursor at the element equivalent to `value`, or at the end if there is none.
    pub fn find(&self, value: &T) -> Cursor<'_, T, C> {
        self.tree.find(value)
    }

    /// Returns a mutable cursor at the element equivalent to `value`, or at the end if there is
    /// none.
    pub fn find_mut(&mut self, value: &T) -> CursorMut<'_, T, C> {
        self.tree.find_mut(value)
    }

    /// Returns a mutable cursor at the first element not ordered before `value`.
    pub fn lower_bound_mut(&mut self, value: &T) -> CursorMut<'_, T, C> {
        self.tree.lower_bound_mut(value)
    }

    /// Returns a mutable cursor at the first element ordered after `value`.
    pub fn upper_bound_mut(&mut self, value: &T) -> CursorMut<'_, T, C> {
        self.tree.upper_bound_mut(value)
    }

    /// Returns a cursor at the first element not ordered before `value`.
    pub fn lower_bound(&self, value: &T) -> Cursor<'_, T, C> {
        self.tree.lower_bound(value)
    }

    /// Returns a cursor at the first element ordered after `value`.
    pub fn upper_bound(&self, value: &T) -> Cursor<'_, T, C> {
        self.tree.upper_bound(value)
    }

    /// Returns the pair `(lower_bound(value), upper_bound(value))`.
    pub fn equal_range(&self, value: &T) -> (Cursor<'_, T, C>, Cursor<'_, T, C>) {
        self.tree.equal_range(value)
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.tree.assert_invariants();
    }
}

impl<T: Clone, C: Clone> Clone for RbSet<T, C> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<T, C: Default> Default for RbSet<T, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<T: fmt::Debug, C> fmt::Debug for RbSet<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tree.fmt(f)
    }
}

impl<T: PartialEq, C> PartialEq for RbSet<T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl<T: Eq, C> Eq for RbSet<T, C> {}

impl<T: PartialOrd, C> PartialOrd for RbSet<T, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.tree.partial_cmp(&other.tree)
    }
}

impl<T: Ord, C> Ord for RbSet<T, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tree.cmp(&other.tree)
    }
}

impl<T: Hash, C> Hash for RbSet<T, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tree.hash(state);
    }
}

impl<T, C: Compare<T>> Extend<T> for RbSet<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.tree.extend(iter);
    }
}

impl<T, C: Compare<T> + Default> FromIterator<T> for RbSet<T, C> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            tree: RbTree::from_iter(iter),
        }
    }
}

impl<T, C> IntoIterator for RbSet<T, C> {
    type Item = T;
    type IntoIter = IntoIter<T, C>;

    fn into_iter(self) -> IntoIter<T, C> {
        self.tree.into_iter()
    }
}

impl<'set, T, C> IntoIterator for &'set RbSet<T, C> {
    type Item = &'set T;
    type IntoIter = Iter<'set, T, C>;

    fn into_iter(self) -> Iter<'set, T, C> {
        self.iter()
    }
}
