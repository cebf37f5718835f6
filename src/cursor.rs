use core::{cmp::Ordering, fmt, marker::PhantomData, ptr::NonNull};

use crate::{links, value, value_mut, Compare, Dir, Node, Range, RbTree};

/// A cursor over a [`RbTree`].
///
/// A cursor points either to an element of the tree or to the end position, a "ghost"
/// non-element that connects the last element to the first. Two cursors are equal when they point
/// to the same position.
pub struct Cursor<'tree, T, C> {
    curs: CursorRaw<T, C>,
    phantom: PhantomData<&'tree RbTree<T, C>>,
}

impl<'tree, T, C> Cursor<'tree, T, C> {
    pub(crate) fn new(tree: &'tree RbTree<T, C>, node: NonNull<Node<T>>) -> Cursor<'tree, T, C> {
        Cursor {
            curs: CursorRaw {
                tree: tree.into(),
                node,
            },
            phantom: PhantomData,
        }
    }

    /// Moves the cursor to the next element of the `RbTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the first
    /// element. If it is pointing to the last element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        unsafe { self.curs.move_next() }
    }

    /// Moves the cursor to the previous element of the `RbTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the last
    /// element. If it is pointing to the first element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_prev(&mut self) {
        unsafe { self.curs.move_prev() }
    }

    /// Returns a reference to the item pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<&'tree T> {
        unsafe { self.curs.get() }
    }

    /// Returns a reference to the next item.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the first element.
    /// If it is pointing to the last element, this method returns `None`.
    pub fn peek_next(&self) -> Option<&'tree T> {
        unsafe { self.curs.peek_next() }
    }

    /// Returns a reference to the previous item.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the last element.
    /// If it is pointing to the first element, this method returns `None`.
    pub fn peek_prev(&self) -> Option<&'tree T> {
        unsafe { self.curs.peek_prev() }
    }

    /// Returns `true` if the cursor is pointing to the "ghost" non-element.
    pub fn is_end(&self) -> bool {
        self.curs.is_end()
    }

    /// Returns an iterator over the elements from this cursor up to, but not including, `last`.
    ///
    /// If `last` comes before this cursor, the iterator is empty in both directions. The end
    /// position comes after every element.
    ///
    /// # Panics
    ///
    /// Panics if `last` belongs to a different tree.
    pub fn until(self, last: Cursor<'tree, T, C>) -> Range<'tree, T, C> {
        assert_eq!(
            self.curs.tree, last.curs.tree,
            "cursors must belong to the same tree"
        );

        let tree = unsafe { self.curs.tree.as_ref() };
        let (front, back) = match tree.position_order(self.curs.node, last.curs.node) {
            Ordering::Greater => (last.curs.node, last.curs.node),
            _ => (self.curs.node, last.curs.node),
        };

        Range::new(tree, front, back)
    }
}

impl<T, C> Clone for Cursor<'_, T, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, C> Copy for Cursor<'_, T, C> {}

impl<T, C> PartialEq for Cursor<'_, T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.curs.node == other.curs.node
    }
}

impl<T, C> Eq for Cursor<'_, T, C> {}

impl<T: fmt::Debug, C> fmt::Debug for Cursor<'_, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.get()).finish()
    }
}

/// A cursor over a [`RbTree`] which supports editing operations.
///
/// A cursor points either to an element of the tree or to a "ghost" non-element that connects the
/// last element to the first.
pub struct CursorMut<'tree, T, C> {
    curs: CursorRaw<T, C>,
    phantom: PhantomData<&'tree mut RbTree<T, C>>,
}

impl<'tree, T, C> CursorMut<'tree, T, C> {
    pub(crate) fn new(
        tree: &'tree mut RbTree<T, C>,
        node: NonNull<Node<T>>,
    ) -> CursorMut<'tree, T, C> {
        CursorMut {
            curs: CursorRaw {
                tree: tree.into(),
                node,
            },
            phantom: PhantomData,
        }
    }

    /// Returns a read-only cursor pointing to the current element.
    ///
    /// The `CursorMut` remains immutably borrowed for the lifetime of the returned `Cursor`.
    pub fn as_cursor(&self) -> Cursor<'_, T, C> {
        Cursor {
            curs: CursorRaw {
                tree: self.curs.tree,
                node: self.curs.node,
            },
            phantom: PhantomData,
        }
    }

    /// Moves the cursor to the next element of the `RbTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method will move it to the first
    /// element. If it is pointing to the last element, this method will move it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        unsafe { self.curs.move_next() }
    }

    /// Moves the cursor to the previous element of the `RbTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method will move it to the last
    /// element. If it is pointing to the first element, this method will move it to the "ghost"
    /// non-element.
    pub fn move_prev(&mut self) {
        unsafe { self.curs.move_prev() }
    }

    /// Returns a reference to the item pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<&T> {
        unsafe { self.curs.get() }
    }

    /// Returns a mutable reference to the item pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    ///
    /// # Safety
    ///
    /// The caller must ensure that modifications to the returned value do not violate the
    /// invariants of the tree. In particular, the result of comparisons between the returned item
    /// and the other items in the tree must not change.
    pub unsafe fn get_mut(&mut self) -> Option<&mut T> {
        unsafe { self.curs.get_mut() }
    }

    /// Converts the cursor into a mutable reference to the item it points to, borrowed for the
    /// lifetime of the tree borrow.
    ///
    /// # Safety
    ///
    /// Same as [`CursorMut::get_mut`].
    pub unsafe fn into_mut(mut self) -> Option<&'tree mut T> {
        unsafe { self.curs.get_mut() }
    }

    /// Returns a reference to the next item.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the first element.
    /// If it is pointing to the last element, this method returns `None`.
    pub fn peek_next(&self) -> Option<&T> {
        unsafe { self.curs.peek_next() }
    }

    /// Returns a reference to the previous item.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the last element.
    /// If it is pointing to the first element, this method returns `None`.
    pub fn peek_prev(&self) -> Option<&T> {
        unsafe { self.curs.peek_prev() }
    }

    /// Returns `true` if the cursor is pointing to the "ghost" non-element.
    pub fn is_end(&self) -> bool {
        self.curs.is_end()
    }

    /// Removes the current element from the tree.
    ///
    /// This returns the removed element and moves the cursor to the next element. If the cursor is
    /// pointing to the "ghost" non-element, this method returns `None`, and neither the tree nor
    /// the cursor is modified.
    pub fn remove_current(&mut self) -> Option<T> {
        unsafe { self.curs.remove_current() }
    }

    /// Removes the current element from the tree.
    ///
    /// This returns the removed element and moves the cursor to the previous element. If the cursor is
    /// pointing to the "ghost" non-element, this method returns `None`, and neither the tree nor
    /// the cursor is modified.
    pub fn remove_current_and_move_prev(&mut self) -> Option<T> {
        unsafe { self.curs.remove_current_and_move_prev() }
    }

    /// Removes elements from the current one onwards, stopping at the first element for which
    /// `stop` returns `true` or at the "ghost" non-element.
    ///
    /// The cursor is left at the position where removal stopped. Returns the number of removed
    /// elements.
    pub fn remove_until<F>(&mut self, mut stop: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let mut removed = 0;

        while self.get().map_or(false, |v| !stop(v)) {
            drop(self.remove_current());
            removed += 1;
        }

        removed
    }
}

impl<T, C: Compare<T>> CursorMut<'_, T, C> {
    /// Inserts `value` into the tree, using the cursor's position as a hint.
    ///
    /// If `value` belongs immediately before the current position, it is linked there without
    /// searching the tree. Otherwise this is an ordinary insertion. Afterwards the cursor points to
    /// the element equivalent to `value`, and `true` is returned if `value` was inserted.
    pub fn insert(&mut self, value: T) -> bool {
        unsafe { self.curs.insert_hinted(value) }
    }
}

impl<T: fmt::Debug, C> fmt::Debug for CursorMut<'_, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.get()).finish()
    }
}

struct CursorRaw<T, C> {
    tree: NonNull<RbTree<T, C>>,
    node: NonNull<Node<T>>,
}

impl<T, C> Clone for CursorRaw<T, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, C> Copy for CursorRaw<T, C> {}

impl<T, C> CursorRaw<T, C> {
    fn is_end(&self) -> bool {
        self.node == unsafe { self.tree.as_ref() }.header()
    }

    unsafe fn move_next(&mut self) {
        let tree = unsafe { self.tree.as_ref() };
        self.node = tree.successor_raw(self.node);
    }

    unsafe fn move_prev(&mut self) {
        let tree = unsafe { self.tree.as_ref() };
        self.node = tree.predecessor_raw(self.node);
    }

    unsafe fn get<'a>(&self) -> Option<&'a T> {
        (!self.is_end()).then(|| unsafe { value(self.node) })
    }

    unsafe fn get_mut<'a>(&mut self) -> Option<&'a mut T> {
        (!self.is_end()).then(|| unsafe { value_mut(self.node) })
    }

    unsafe fn peek_next<'a>(&self) -> Option<&'a T> {
        let tree = unsafe { self.tree.as_ref() };
        let next = tree.successor_raw(self.node);

        (next != tree.header()).then(|| unsafe { value(next) })
    }

    unsafe fn peek_prev<'a>(&self) -> Option<&'a T> {
        let tree = unsafe { self.tree.as_ref() };
        let prev = tree.predecessor_raw(self.node);

        (prev != tree.header()).then(|| unsafe { value(prev) })
    }

    unsafe fn remove_current(&mut self) -> Option<T> {
        if self.is_end() {
            return None;
        }

        let remove = self.node;

        // Removal relocates nodes rather than values, so the successor stays put.
        unsafe { self.move_next() };

        let tree = unsafe { self.tree.as_mut() };
        Some(unsafe { tree.remove_at(remove) })
    }

    unsafe fn remove_current_and_move_prev(&mut self) -> Option<T> {
        if self.is_end() {
            return None;
        }

        let remove = self.node;

        unsafe { self.move_prev() };

        let tree = unsafe { self.tree.as_mut() };
        Some(unsafe { tree.remove_at(remove) })
    }

    unsafe fn insert_hinted(&mut self, value_to_insert: T) -> bool
    where
        C: Compare<T>,
    {
        let tree = unsafe { self.tree.as_mut() };
        let pos = self.node;
        let header = tree.header();

        // The hint is usable if the value lies strictly between the previous element and `pos`.
        let prev = (pos != tree.leftmost()).then(|| tree.predecessor_raw(pos));
        let fits_before =
            pos == header || tree.comparator().compares_lt(&value_to_insert, unsafe { value(pos) });
        let fits_after = prev.map_or(true, |prev| {
            tree.comparator()
                .compares_lt(unsafe { value(prev) }, &value_to_insert)
        });

        if !(fits_before && fits_after) {
            let (node, inserted) = tree.insert_raw(value_to_insert);
            self.node = node;
            return inserted;
        }

        // The gap before `pos` is either the empty left slot of `pos`, or the empty right slot of
        // the maximum of its left subtree. The header's left subtree is the whole tree.
        self.node = unsafe {
            match (links(pos).left(), prev) {
                (None, _) => tree.insert_at(pos, Dir::Left, value_to_insert),
                (Some(_), Some(prev)) => tree.insert_at(prev, Dir::Right, value_to_insert),
                (Some(_), None) => unreachable!("a left subtree holds a predecessor"),
            }
        };

        true
    }
}
