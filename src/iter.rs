use core::{iter::FusedIterator, ptr::NonNull};

use crate::{value, Compare, Node, RbTree};

/// An iterator over the elements of a [`RbTree`], in ascending order.
pub struct Iter<'tree, T, C> {
    tree: &'tree RbTree<T, C>,

    front: NonNull<Node<T>>,
    // One past the next element yielded from the back.
    back: NonNull<Node<T>>,

    len: usize,
}

impl<'tree, T, C> Iter<'tree, T, C> {
    pub(crate) fn new(tree: &'tree RbTree<T, C>) -> Self {
        Iter {
            tree,

            front: tree.leftmost(),
            back: tree.header(),
            len: tree.len(),
        }
    }
}

impl<'tree, T, C> Iterator for Iter<'tree, T, C> {
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.front;
        self.front = self.tree.successor_raw(cur);
        self.len -= 1;

        Some(unsafe { value(cur) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<T, C> DoubleEndedIterator for Iter<'_, T, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        self.back = self.tree.predecessor_raw(self.back);
        self.len -= 1;

        Some(unsafe { value(self.back) })
    }
}

impl<T, C> ExactSizeIterator for Iter<'_, T, C> {}

impl<T, C> FusedIterator for Iter<'_, T, C> {}

impl<T, C> Clone for Iter<'_, T, C> {
    fn clone(&self) -> Self {
        Iter { ..*self }
    }
}

/// An iterator over a span of the elements of a [`RbTree`], in ascending order.
///
/// Created by [`RbTree::range`] and [`Cursor::until`](crate::Cursor::until).
pub struct Range<'tree, T, C> {
    tree: &'tree RbTree<T, C>,
    front: NonNull<Node<T>>,
    back: NonNull<Node<T>>,
}

impl<'tree, T, C> Range<'tree, T, C> {
    // `front` must not come after `back`.
    pub(crate) fn new(
        tree: &'tree RbTree<T, C>,
        front: NonNull<Node<T>>,
        back: NonNull<Node<T>>,
    ) -> Self {
        Range { tree, front, back }
    }
}

impl<'tree, T, C> Iterator for Range<'tree, T, C> {
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }

        let cur = self.front;
        self.front = self.tree.successor_raw(cur);

        Some(unsafe { value(cur) })
    }
}

impl<T, C> DoubleEndedIterator for Range<'_, T, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }

        self.back = self.tree.predecessor_raw(self.back);

        Some(unsafe { value(self.back) })
    }
}

impl<T, C> FusedIterator for Range<'_, T, C> {}

impl<T, C> Clone for Range<'_, T, C> {
    fn clone(&self) -> Self {
        Range { ..*self }
    }
}

/// An owning iterator over the elements of a [`RbTree`], in ascending order.
pub struct IntoIter<T, C> {
    tree: RbTree<T, C>,
}

impl<T, C> Iterator for IntoIter<T, C> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.tree.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.tree.len(), Some(self.tree.len()))
    }
}

impl<T, C> DoubleEndedIterator for IntoIter<T, C> {
    fn next_back(&mut self) -> Option<T> {
        self.tree.pop_last()
    }
}

impl<T, C> ExactSizeIterator for IntoIter<T, C> {}

impl<T, C> FusedIterator for IntoIter<T, C> {}

impl<T, C> IntoIterator for RbTree<T, C> {
    type Item = T;
    type IntoIter = IntoIter<T, C>;

    fn into_iter(self) -> IntoIter<T, C> {
        IntoIter { tree: self }
    }
}

impl<'tree, T, C> IntoIterator for &'tree RbTree<T, C> {
    type Item = &'tree T;
    type IntoIter = Iter<'tree, T, C>;

    fn into_iter(self) -> Iter<'tree, T, C> {
        self.iter()
    }
}

impl<T, C: Compare<T>> Extend<T> for RbTree<T, C> {
    /// Inserts every value in order; values equivalent to an element already present are dropped.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert_raw(value);
        }
    }
}

impl<'a, T: Copy + 'a, C: Compare<T>> Extend<&'a T> for RbTree<T, C> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, C: Compare<T> + Default> FromIterator<T> for RbTree<T, C> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = RbTree::default();
        tree.extend(iter);
        tree
    }
}
