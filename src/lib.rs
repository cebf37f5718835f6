//! A red-black tree anchored on a header sentinel, and the ordered map and set built on it.
#![no_std]

// Conventions used in comments:
// - The header is the sentinel node owned by the tree. Its left link is the root, its other links
//   are unused, and it carries no value. Every element's chain of parents ends at the header, and
//   the header is the `end` position of every cursor.
// - `x` is the node being fixed up, `p(x)` its parent and `g(x)` its grandparent.
// - A missing child counts as a black leaf.
//
// The red-black invariants:
// 1. The root is black.
// 2. A red node never has a red child.
// 3. Every path from a node to a missing child passes through the same number of black nodes (the
//    node's black-height).
//
// Corollaries:
// 4. A node with exactly one child is black, and that child is a red node with no children.
//
//    Proof:
//
//    Let `n` have a single child `c`.
//    a. The path from `n` through its missing child has no black nodes below `n` (by 3).
//    b. Thus `c` is red and has no black descendants; a red `c` has no red children (by 2), so it
//       has no children at all.
//    c. `n` is black, since `c` is red (by 2).
//    QED
//
// 5. The root is a left child: the header's left link is the root.

#[cfg(any(test, feature = "std"))]
extern crate std;

extern crate alloc;

use alloc::{boxed::Box, vec::Vec};
use core::{
    cell::UnsafeCell,
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    mem::{self, MaybeUninit},
    ops::{Bound, Not, RangeBounds},
    ptr::NonNull,
};

use cordyceps::Linked;
use log::{debug, trace};

mod cursor;
mod debug;
mod iter;
pub mod map;
pub mod set;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use compare::{natural, Compare, Natural};
pub use cursor::{Cursor, CursorMut};
pub use iter::{IntoIter, Iter, Range};
pub use map::{ByKey, RbMap};
pub use set::RbSet;

/// A red-black tree ordering its values with a [`Compare`] implementation.
///
/// The tree owns its values. No two values in the tree compare equal: inserting a value equivalent
/// to one already present leaves the tree unchanged.
///
/// Lookups and cursors see the tree as a sequence of ascending values followed by a single "end"
/// position, which is the tree's sentinel.
pub struct RbTree<T, C = Natural<T>> {
    header: NonNull<Node<T>>,
    leftmost: NonNull<Node<T>>,
    len: usize,
    cmp: C,
    _owns: PhantomData<Box<Node<T>>>,
}

// SAFETY: the tree exclusively owns all of its nodes; the raw links are never shared with another
// tree.
unsafe impl<T: Send, C: Send> Send for RbTree<T, C> {}

// SAFETY: shared access only hands out shared references to values.
unsafe impl<T: Sync, C: Sync> Sync for RbTree<T, C> {}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

impl Color {
    fn toggle(self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[repr(C)]
pub(crate) struct Node<T> {
    links: Links<T>,
    // Uninitialized only for the header.
    value: MaybeUninit<T>,
}

pub(crate) struct Links<T> {
    inner: UnsafeCell<LinksInner<T>>,
}

struct LinksInner<T> {
    parent: Link<T>,
    children: [Link<T>; 2],
    color: Color,
}

type Link<T> = Option<NonNull<Node<T>>>;

unsafe impl<T> Linked<Links<T>> for Node<T> {
    type Handle = Box<Node<T>>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        NonNull::from(Box::leak(r))
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<T>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl<T> Node<T> {
    fn header() -> NonNull<Node<T>> {
        <Node<T> as Linked<Links<T>>>::into_ptr(Box::new(Node {
            links: Links::new(Color::Red),
            value: MaybeUninit::uninit(),
        }))
    }

    // New nodes are always red.
    fn alloc(value: T) -> NonNull<Node<T>> {
        <Node<T> as Linked<Links<T>>>::into_ptr(Box::new(Node {
            links: Links::new(Color::Red),
            value: MaybeUninit::new(value),
        }))
    }

    // Frees a node that has been unlinked from its tree, returning its value.
    //
    // # Safety
    //
    // `node` must have been returned by `Node::alloc` and must not be reachable from any tree.
    unsafe fn free(node: NonNull<Node<T>>) -> T {
        let Node { value, .. } = *unsafe { <Node<T> as Linked<Links<T>>>::from_ptr(node) };
        unsafe { value.assume_init() }
    }
}

// Node accessors ==============================================================

#[inline]
unsafe fn links<'a, T>(node: NonNull<Node<T>>) -> &'a Links<T> {
    unsafe { <Node<T> as Linked<Links<T>>>::links(node).as_ref() }
}

#[inline]
unsafe fn value<'a, T>(node: NonNull<Node<T>>) -> &'a T {
    unsafe { (*node.as_ptr()).value.assume_init_ref() }
}

#[inline]
unsafe fn value_mut<'a, T>(node: NonNull<Node<T>>) -> &'a mut T {
    unsafe { (*node.as_ptr()).value.assume_init_mut() }
}

#[inline]
unsafe fn color_of<T>(node: Link<T>) -> Color {
    node.map(|n| unsafe { links(n).color() })
        .unwrap_or(Color::Black)
}

// Elements always have a parent; the root's parent is the header.
#[inline]
unsafe fn parent_of<T>(node: NonNull<Node<T>>) -> NonNull<Node<T>> {
    unsafe { links(node).parent() }.expect("only the header has no parent")
}

// Returns `true` if `node` is its parent's left child. This holds for the root, which is the left
// child of the header, and never for the header itself.
#[inline]
unsafe fn is_left_child<T>(node: NonNull<Node<T>>) -> bool {
    unsafe {
        match links(node).parent() {
            Some(parent) => links(parent).left() == Some(node),
            None => false,
        }
    }
}

#[inline]
unsafe fn which_child<T>(parent: NonNull<Node<T>>, child: NonNull<Node<T>>) -> Dir {
    if unsafe { links(parent).left() } == Some(child) {
        Dir::Left
    } else {
        Dir::Right
    }
}

// Returns the minimum node in the subtree rooted at `node`.
#[inline]
unsafe fn subtree_min<T>(mut node: NonNull<Node<T>>) -> NonNull<Node<T>> {
    while let Some(left) = unsafe { links(node).left() } {
        node = left;
    }

    node
}

// Returns the maximum node in the subtree rooted at `node`.
#[inline]
unsafe fn subtree_max<T>(mut node: NonNull<Node<T>>) -> NonNull<Node<T>> {
    while let Some(right) = unsafe { links(node).right() } {
        node = right;
    }

    node
}

/// The outcome of a descent looking for a value.
pub(crate) enum Search<T> {
    /// An element equivalent to the target.
    Found(NonNull<Node<T>>),
    /// The empty child slot of the first node where the target would be linked.
    Vacant(NonNull<Node<T>>, Dir),
}

impl<T: Ord> RbTree<T> {
    /// Returns a new empty tree ordered by [`Ord`].
    pub fn new() -> RbTree<T> {
        RbTree::with_comparator(natural())
    }
}

impl<T, C> RbTree<T, C> {
    /// Returns a new empty tree ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> RbTree<T, C> {
        let header = Node::header();

        RbTree {
            header,
            leftmost: header,
            len: 0,
            cmp,
            _owns: PhantomData,
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        let empty = self.len == 0;

        if cfg!(debug_assertions) {
            assert_eq!(empty, self.root().is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the largest number of elements the tree could theoretically hold.
    pub fn max_size(&self) -> usize {
        isize::MAX as usize / mem::size_of::<Node<T>>()
    }

    /// Returns the comparator ordering the tree.
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Returns a cursor at the minimum element, or at the end if the tree is empty.
    ///
    /// This operation completes in _O(1)_ time.
    pub fn begin(&self) -> Cursor<'_, T, C> {
        Cursor::new(self, self.leftmost)
    }

    /// Returns a cursor at the end position, one past the maximum element.
    pub fn end(&self) -> Cursor<'_, T, C> {
        Cursor::new(self, self.header)
    }

    /// Returns a mutable cursor at the minimum element, or at the end if the tree is empty.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, T, C> {
        let node = self.leftmost;
        CursorMut::new(self, node)
    }

    /// Returns a mutable cursor at the end position.
    pub fn cursor_end_mut(&mut self) -> CursorMut<'_, T, C> {
        let node = self.header;
        CursorMut::new(self, node)
    }

    /// Returns an iterator over the elements in ascending order.
    ///
    /// The iterator is double-ended; `iter().rev()` visits the elements in descending order.
    pub fn iter(&self) -> Iter<'_, T, C> {
        Iter::new(self)
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<&T> {
        self.begin().get()
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<&T> {
        let root = self.root()?;
        unsafe { Some(value(subtree_max(root))) }
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T> {
        self.cursor_first_mut().remove_current()
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T> {
        let root = self.root()?;
        unsafe { Some(self.remove_at(subtree_max(root))) }
    }

    /// Exchanges the contents of two trees, including their comparators.
    ///
    /// This operation completes in _O(1)_ time. Each root keeps pointing at the header of the tree
    /// that now owns it, since headers travel with their nodes.
    pub fn swap(&mut self, other: &mut RbTree<T, C>) {
        mem::swap(self, other);
    }

    /// Returns a cursor at the element for which `f` returns [`Ordering::Equal`], or at the end if
    /// there is none.
    ///
    /// `f` reports where an element lies relative to the target: [`Ordering::Less`] for elements
    /// before it and [`Ordering::Greater`] for elements after it. It must agree with the tree's
    /// ordering.
    pub fn find_by<F>(&self, f: F) -> Cursor<'_, T, C>
    where
        F: FnMut(&T) -> Ordering,
    {
        Cursor::new(self, self.find_raw(f))
    }

    /// Mutable version of [`RbTree::find_by`].
    pub fn find_by_mut<F>(&mut self, f: F) -> CursorMut<'_, T, C>
    where
        F: FnMut(&T) -> Ordering,
    {
        let node = self.find_raw(f);
        CursorMut::new(self, node)
    }

    /// Returns a cursor at the first element for which `f` does not return [`Ordering::Less`].
    pub fn lower_bound_by<F>(&self, f: F) -> Cursor<'_, T, C>
    where
        F: FnMut(&T) -> Ordering,
    {
        Cursor::new(self, self.lower_bound_raw(f))
    }

    /// Mutable version of [`RbTree::lower_bound_by`].
    pub fn lower_bound_by_mut<F>(&mut self, f: F) -> CursorMut<'_, T, C>
    where
        F: FnMut(&T) -> Ordering,
    {
        let node = self.lower_bound_raw(f);
        CursorMut::new(self, node)
    }

    /// Returns a cursor at the first element for which `f` returns [`Ordering::Greater`].
    pub fn upper_bound_by<F>(&self, f: F) -> Cursor<'_, T, C>
    where
        F: FnMut(&T) -> Ordering,
    {
        Cursor::new(self, self.upper_bound_raw(f))
    }

    /// Mutable version of [`RbTree::upper_bound_by`].
    pub fn upper_bound_by_mut<F>(&mut self, f: F) -> CursorMut<'_, T, C>
    where
        F: FnMut(&T) -> Ordering,
    {
        let node = self.upper_bound_raw(f);
        CursorMut::new(self, node)
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        let cleared = self.len;
        let mut opt_cur = self.root();

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend to the minimum node.
                let min = subtree_min(cur);
                let parent = parent_of(min);
                let right = links(min).right();

                // Elevate the node's right child (which may be None).
                self.replace_child(parent, min, right);
                if let Some(right) = right {
                    links(right).set_parent(Some(parent));
                }

                drop(Node::free(min));

                // If the node had no right child, climb to the parent. Reaching the header means
                // the tree is empty.
                opt_cur = right.or((parent != self.header).then_some(parent));
            }
        }

        self.len = 0;
        self.leftmost = self.header;

        debug_assert!(self.root().is_none());

        if cleared > 0 {
            debug!("cleared {cleared} elements");
        }
    }

    // Internals ==============================================================

    #[inline]
    pub(crate) fn root(&self) -> Link<T> {
        unsafe { links(self.header).left() }
    }

    #[inline]
    pub(crate) fn header(&self) -> NonNull<Node<T>> {
        self.header
    }

    #[inline]
    pub(crate) fn leftmost(&self) -> NonNull<Node<T>> {
        self.leftmost
    }

    // Returns the next position in order. The successor of the maximum is the header, and the
    // successor of the header is the minimum.
    pub(crate) fn successor_raw(&self, node: NonNull<Node<T>>) -> NonNull<Node<T>> {
        if node == self.header {
            return self.leftmost;
        }

        unsafe {
            if let Some(right) = links(node).right() {
                return subtree_min(right);
            }

            // The root is a left child, so this stops at the header at the latest.
            let mut cur = node;
            while !is_left_child(cur) {
                cur = parent_of(cur);
            }

            parent_of(cur)
        }
    }

    // Returns the previous position in order. The predecessor of the header is the maximum, and the
    // predecessor of the minimum is the header.
    pub(crate) fn predecessor_raw(&self, node: NonNull<Node<T>>) -> NonNull<Node<T>> {
        unsafe {
            // For the header this descends from the root.
            if let Some(left) = links(node).left() {
                return subtree_max(left);
            }

            if node == self.header || node == self.leftmost {
                return self.header;
            }

            let mut cur = node;
            while is_left_child(cur) {
                cur = parent_of(cur);
            }

            parent_of(cur)
        }
    }

    // Returns the in-order relation of two positions of this tree, with the header after every
    // element. Runs in time proportional to the height, without consulting the comparator.
    pub(crate) fn position_order(&self, a: NonNull<Node<T>>, b: NonNull<Node<T>>) -> Ordering {
        if a == b {
            return Ordering::Equal;
        } else if a == self.header {
            return Ordering::Greater;
        } else if b == self.header {
            return Ordering::Less;
        }

        unsafe fn depth<T>(header: NonNull<Node<T>>, mut node: NonNull<Node<T>>) -> usize {
            let mut depth = 0;
            while node != header {
                node = unsafe { parent_of(node) };
                depth += 1;
            }
            depth
        }

        unsafe {
            let (mut x, mut y) = (a, b);
            let (mut dx, mut dy) = (depth(self.header, a), depth(self.header, b));

            // The side of the current node that each climb arrived from.
            let (mut from_x, mut from_y) = (None, None);

            while dx > dy {
                let parent = parent_of(x);
                from_x = Some(which_child(parent, x));
                x = parent;
                dx -= 1;
            }

            while dy > dx {
                let parent = parent_of(y);
                from_y = Some(which_child(parent, y));
                y = parent;
                dy -= 1;
            }

            // Both are elements, so this meets at the root at the latest.
            while x != y {
                let (px, py) = (parent_of(x), parent_of(y));
                from_x = Some(which_child(px, x));
                from_y = Some(which_child(py, y));
                x = px;
                y = py;
            }

            match (from_x, from_y) {
                // `a` is the common ancestor.
                (None, Some(Dir::Left)) => Ordering::Greater,
                (None, _) => Ordering::Less,
                (Some(Dir::Left), _) => Ordering::Less,
                (Some(Dir::Right), _) => Ordering::Greater,
            }
        }
    }

    pub(crate) fn search_raw<F>(&self, mut f: F) -> Search<T>
    where
        F: FnMut(&T) -> Ordering,
    {
        let mut parent = self.header;
        let mut dir = Dir::Left;

        unsafe {
            while let Some(cur) = links(parent).child(dir) {
                dir = match f(value(cur)) {
                    Ordering::Less => Dir::Right,
                    Ordering::Equal => return Search::Found(cur),
                    Ordering::Greater => Dir::Left,
                };
                parent = cur;
            }
        }

        Search::Vacant(parent, dir)
    }

    pub(crate) fn find_raw<F>(&self, f: F) -> NonNull<Node<T>>
    where
        F: FnMut(&T) -> Ordering,
    {
        match self.search_raw(f) {
            Search::Found(node) => node,
            Search::Vacant(..) => self.header,
        }
    }

    pub(crate) fn lower_bound_raw<F>(&self, mut f: F) -> NonNull<Node<T>>
    where
        F: FnMut(&T) -> Ordering,
    {
        let mut best = self.header;
        let mut opt_cur = self.root();

        while let Some(cur) = opt_cur {
            unsafe {
                if f(value(cur)) == Ordering::Less {
                    opt_cur = links(cur).right();
                } else {
                    best = cur;
                    opt_cur = links(cur).left();
                }
            }
        }

        best
    }

    pub(crate) fn upper_bound_raw<F>(&self, mut f: F) -> NonNull<Node<T>>
    where
        F: FnMut(&T) -> Ordering,
    {
        let mut best = self.header;
        let mut opt_cur = self.root();

        while let Some(cur) = opt_cur {
            unsafe {
                if f(value(cur)) == Ordering::Greater {
                    best = cur;
                    opt_cur = links(cur).left();
                } else {
                    opt_cur = links(cur).right();
                }
            }
        }

        best
    }

    // Resolves a pair of bounds into the half-open span of positions `[front, back)`.
    //
    // `order` compares an element against a bound value. Bounds that exclude each other resolve to
    // an empty span.
    pub(crate) fn span_raw<Q, F>(
        &self,
        start: Bound<&Q>,
        end: Bound<&Q>,
        order: F,
    ) -> (NonNull<Node<T>>, NonNull<Node<T>>)
    where
        Q: ?Sized,
        F: Fn(&T, &Q) -> Ordering,
    {
        let front = match start {
            Bound::Included(s) => self.lower_bound_raw(|v| order(v, s)),
            Bound::Excluded(s) => self.upper_bound_raw(|v| order(v, s)),
            Bound::Unbounded => self.leftmost,
        };

        let back = match end {
            Bound::Included(e) => self.upper_bound_raw(|v| order(v, e)),
            Bound::Excluded(e) => self.lower_bound_raw(|v| order(v, e)),
            Bound::Unbounded => self.header,
        };

        // Every element before `front` fails the start bound, so `back` lies before `front` exactly
        // when it is an element that fails the start bound.
        let inverted = back != self.header
            && match start {
                Bound::Included(s) => order(unsafe { value(back) }, s) == Ordering::Less,
                Bound::Excluded(s) => order(unsafe { value(back) }, s) != Ordering::Greater,
                Bound::Unbounded => false,
            };

        if inverted {
            (back, back)
        } else {
            (front, back)
        }
    }

    // Removes every element in `[front, back)`, returning the number removed.
    //
    // # Safety
    //
    // `front` and `back` must be positions of this tree, with `front` not after `back`.
    pub(crate) unsafe fn remove_span(
        &mut self,
        front: NonNull<Node<T>>,
        back: NonNull<Node<T>>,
    ) -> usize {
        let mut removed = 0;
        let mut cur = front;

        while cur != back {
            // Removal relocates nodes rather than values, so `next` stays valid.
            let next = self.successor_raw(cur);
            drop(unsafe { self.remove_at(cur) });
            removed += 1;
            cur = next;
        }

        removed
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that `old_child` is a child node of `parent`.
    #[inline]
    unsafe fn replace_child(
        &mut self,
        parent: NonNull<Node<T>>,
        old_child: NonNull<Node<T>>,
        new_child: Link<T>,
    ) {
        unsafe {
            let parent_links = links(parent);

            if parent_links.left() == Some(old_child) {
                parent_links.set_child(Dir::Left, new_child);
            } else {
                debug_assert_eq!(
                    parent_links.right(),
                    Some(old_child),
                    "`old_child` must be a child of `parent`"
                );
                parent_links.set_child(Dir::Right, new_child);
            }
        }
    }

    // Rotates `node` down towards `dir`, lifting its `!dir` child into its place.
    //
    // Colors are not updated. Rotating the root relinks the header.
    unsafe fn rotate(&mut self, node: NonNull<Node<T>>, dir: Dir) {
        unsafe {
            let up = links(node)
                .child(!dir)
                .expect("rotation requires a child to lift");

            // `across` moves from the `dir` child of `up` to the `!dir` child of `node`.
            let across = links(up).child(dir);
            links(node).set_child(!dir, across);
            if let Some(across) = across {
                links(across).set_parent(Some(node));
            }

            let parent = parent_of(node);
            self.replace_child(parent, node, Some(up));
            links(up).set_parent(Some(parent));

            links(up).set_child(dir, Some(node));
            links(node).set_parent(Some(up));
        }
    }

    // Links a new red node holding `value` as the `dir` child of `parent` and rebalances.
    //
    // # Safety
    //
    // The `dir` child slot of `parent` must be empty and must be the in-order position of `value`.
    pub(crate) unsafe fn insert_at(
        &mut self,
        parent: NonNull<Node<T>>,
        dir: Dir,
        value: T,
    ) -> NonNull<Node<T>> {
        let node = Node::alloc(value);

        unsafe {
            debug_assert!(links(parent).child(dir).is_none());

            links(node).set_parent(Some(parent));
            links(parent).set_child(dir, Some(node));

            if self.len == 0 || (parent == self.leftmost && dir == Dir::Left) {
                self.leftmost = node;
            }

            self.len += 1;
            self.rebalance_inserted(node);
        }

        node
    }

    // Performs a bottom-up rebalance of the tree after the insertion of the red node `node`.
    unsafe fn rebalance_inserted(&mut self, node: NonNull<Node<T>>) {
        let mut x = node;

        unsafe {
            loop {
                let parent = parent_of(x);
                if parent == self.header || links(parent).color() == Color::Black {
                    break;
                }

                // A red parent is never the root, so `g(x)` is an element.
                let grandparent = parent_of(parent);
                let side = which_child(grandparent, parent);
                let uncle = links(grandparent).child(!side);

                if color_of(uncle) == Color::Red {
                    trace!("insert fix-up: red uncle, recoloring");

                    links(parent).toggle_color();
                    if let Some(uncle) = uncle {
                        links(uncle).toggle_color();
                    }
                    links(grandparent).toggle_color();

                    x = grandparent;
                    continue;
                }

                let mut parent = parent;
                if which_child(parent, x) != side {
                    trace!("insert fix-up: straightening zig-zag");

                    self.rotate(parent, side);
                    x = parent;
                    parent = parent_of(x);
                }

                trace!("insert fix-up: rotating at grandparent");

                links(parent).toggle_color();
                links(grandparent).toggle_color();
                self.rotate(grandparent, !side);
                break;
            }

            if let Some(root) = self.root() {
                links(root).set_color(Color::Black);
            }
        }
    }

    /// Removes the element at `node` from the tree and returns its value.
    ///
    /// Other elements keep their nodes: when `node` has two children, its successor's node is
    /// relocated into `node`'s position rather than having its value moved.
    ///
    /// # Safety
    ///
    /// `node` must be an element of `self`, and not the header.
    pub(crate) unsafe fn remove_at(&mut self, node: NonNull<Node<T>>) -> T {
        debug_assert_ne!(node, self.header, "the end position holds no element");

        unsafe {
            if node == self.leftmost {
                self.leftmost = self.successor_raw(node);
            }

            let parent = parent_of(node);
            let left = links(node).left();
            let right = links(node).right();

            // The node that leaves its position is `node` itself, or `node`'s successor when `node`
            // has two children. After splicing it out, `child` sits in its former slot: the `side`
            // child of `child_parent`.
            let (removed_color, child, child_parent, side) = match (left, right) {
                (Some(left), Some(right)) => {
                    let successor = subtree_min(right);
                    let successor_right = links(successor).right();

                    let (child_parent, side) = if successor == right {
                        (successor, Dir::Right)
                    } else {
                        // Elevate the successor's right child to replace it.
                        let successor_parent = parent_of(successor);
                        links(successor_parent).set_child(Dir::Left, successor_right);
                        if let Some(successor_right) = successor_right {
                            links(successor_right).set_parent(Some(successor_parent));
                        }

                        links(successor).set_child(Dir::Right, Some(right));
                        links(right).set_parent(Some(successor));

                        (successor_parent, Dir::Left)
                    };

                    // Relocate the successor into `node`'s position, taking over its color.
                    links(successor).set_child(Dir::Left, Some(left));
                    links(left).set_parent(Some(successor));

                    self.replace_child(parent, node, Some(successor));
                    links(successor).set_parent(Some(parent));

                    let removed_color = links(successor).set_color(links(node).color());

                    (removed_color, successor_right, child_parent, side)
                }

                (Some(child), None) | (None, Some(child)) => {
                    let side = which_child(parent, node);
                    self.replace_child(parent, node, Some(child));
                    links(child).set_parent(Some(parent));

                    (links(node).color(), Some(child), parent, side)
                }

                (None, None) => {
                    let side = which_child(parent, node);
                    self.replace_child(parent, node, None);

                    (links(node).color(), None, parent, side)
                }
            };

            // Removing a black node leaves its slot one black short.
            if removed_color == Color::Black {
                match child {
                    // A lone child of a black node is red (corollary 4); blackening it restores the
                    // black-height.
                    Some(child) => {
                        links(child).set_color(Color::Black);
                    }
                    None if child_parent != self.header => {
                        self.rebalance_removed(child_parent, side);
                    }
                    // The tree is now empty.
                    None => {}
                }
            }

            self.len -= 1;

            Node::free(node)
        }
    }

    // Performs a bottom-up rebalance of the tree after a removal left the `side` child slot of
    // `parent` one black node short ("double black").
    unsafe fn rebalance_removed(&mut self, mut parent: NonNull<Node<T>>, mut side: Dir) {
        unsafe {
            loop {
                // The deficient slot has a black-height of at least one on the other side.
                let mut sibling = links(parent)
                    .child(!side)
                    .expect("a black-height deficit implies a sibling");

                if links(sibling).color() == Color::Red {
                    trace!("erase fix-up: red sibling");

                    links(sibling).toggle_color();
                    links(parent).toggle_color();
                    self.rotate(parent, side);

                    sibling = links(parent)
                        .child(!side)
                        .expect("a red sibling has two black children");
                }

                let near = links(sibling).child(side);
                let far = links(sibling).child(!side);

                if color_of(near) == Color::Black && color_of(far) == Color::Black {
                    trace!("erase fix-up: black nephews, moving deficit up");

                    links(sibling).set_color(Color::Red);

                    let grandparent = parent_of(parent);
                    if links(parent).color() == Color::Red || grandparent == self.header {
                        links(parent).set_color(Color::Black);
                        return;
                    }

                    side = which_child(grandparent, parent);
                    parent = grandparent;
                    continue;
                }

                if color_of(far) == Color::Black {
                    trace!("erase fix-up: red near nephew");

                    let near = near.expect("one nephew is red");
                    links(near).toggle_color();
                    links(sibling).toggle_color();
                    self.rotate(sibling, !side);

                    sibling = near;
                }

                trace!("erase fix-up: red far nephew");

                links(sibling).set_color(links(parent).color());
                links(parent).set_color(Color::Black);
                let far = links(sibling).child(!side).expect("far nephew is red");
                links(far).set_color(Color::Black);
                self.rotate(parent, side);
                return;
            }
        }
    }

    // Copies `src`'s value and color into a new node linked as the `dir` child of `parent`.
    unsafe fn clone_node(
        &mut self,
        src: NonNull<Node<T>>,
        parent: NonNull<Node<T>>,
        dir: Dir,
    ) -> NonNull<Node<T>>
    where
        T: Clone,
    {
        unsafe {
            let node = Node::alloc(value(src).clone());
            links(node).set_color(links(src).color());
            links(node).set_parent(Some(parent));
            links(parent).set_child(dir, Some(node));
            node
        }
    }
}

impl<T, C: Compare<T>> RbTree<T, C> {
    /// Inserts `value` into the tree.
    ///
    /// Returns a cursor at the element equivalent to `value` and `true` if `value` was inserted.
    /// If an equivalent element was already present, the tree is unchanged, `value` is dropped
    /// and `false` is returned.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, value: T) -> (CursorMut<'_, T, C>, bool) {
        let (node, inserted) = self.insert_raw(value);
        (CursorMut::new(self, node), inserted)
    }

    pub(crate) fn insert_raw(&mut self, value: T) -> (NonNull<Node<T>>, bool) {
        let search = self.search_raw(|elem| self.cmp.compare(elem, &value));

        match search {
            Search::Found(node) => (node, false),
            Search::Vacant(parent, dir) => (unsafe { self.insert_at(parent, dir, value) }, true),
        }
    }

    /// Returns a cursor at the element equivalent to `value`, or at the end if there is none.
    pub fn find(&self, value: &T) -> Cursor<'_, T, C> {
        self.find_by(|elem| self.cmp.compare(elem, value))
    }

    /// Mutable version of [`RbTree::find`].
    pub fn find_mut(&mut self, value: &T) -> CursorMut<'_, T, C> {
        let node = self.find_raw(|elem| self.cmp.compare(elem, value));
        CursorMut::new(self, node)
    }

    /// Returns a reference to the element equivalent to `value`.
    pub fn get(&self, value: &T) -> Option<&T> {
        self.find(value).get()
    }

    /// Returns `true` if the tree contains an element equivalent to `value`.
    pub fn contains(&self, value: &T) -> bool {
        !self.find(value).is_end()
    }

    /// Returns the number of elements equivalent to `value`, which is either 0 or 1.
    pub fn count(&self, value: &T) -> usize {
        usize::from(self.contains(value))
    }

    /// Returns a cursor at the first element not ordered before `value`.
    pub fn lower_bound(&self, value: &T) -> Cursor<'_, T, C> {
        self.lower_bound_by(|elem| self.cmp.compare(elem, value))
    }

    /// Mutable version of [`RbTree::lower_bound`].
    pub fn lower_bound_mut(&mut self, value: &T) -> CursorMut<'_, T, C> {
        let node = self.lower_bound_raw(|elem| self.cmp.compare(elem, value));
        CursorMut::new(self, node)
    }

    /// Returns a cursor at the first element ordered after `value`.
    pub fn upper_bound(&self, value: &T) -> Cursor<'_, T, C> {
        self.upper_bound_by(|elem| self.cmp.compare(elem, value))
    }

    /// Mutable version of [`RbTree::upper_bound`].
    pub fn upper_bound_mut(&mut self, value: &T) -> CursorMut<'_, T, C> {
        let node = self.upper_bound_raw(|elem| self.cmp.compare(elem, value));
        CursorMut::new(self, node)
    }

    /// Returns the pair `(lower_bound(value), upper_bound(value))`.
    ///
    /// The cursors are equal if no element is equivalent to `value`; otherwise the first points at
    /// that element and the second at its successor.
    pub fn equal_range(&self, value: &T) -> (Cursor<'_, T, C>, Cursor<'_, T, C>) {
        (self.lower_bound(value), self.upper_bound(value))
    }

    /// Returns a double-ended iterator over the elements within `range`, in ascending order.
    ///
    /// A range whose bounds exclude each other yields nothing.
    pub fn range<R>(&self, range: R) -> Range<'_, T, C>
    where
        R: RangeBounds<T>,
    {
        let (front, back) = self.span_raw(range.start_bound(), range.end_bound(), |v, b| {
            self.cmp.compare(v, b)
        });

        Range::new(self, front, back)
    }

    /// Removes the element equivalent to `value` and returns it.
    pub fn take(&mut self, value: &T) -> Option<T> {
        self.find_mut(value).remove_current()
    }

    /// Removes the element equivalent to `value`, returning the number of removed elements.
    pub fn erase(&mut self, value: &T) -> usize {
        usize::from(self.take(value).is_some())
    }

    /// Removes every element within `range`, returning the number of removed elements.
    ///
    /// This removes the positions from the lower bound of the range's start up to, but not
    /// including, the lower bound of its end.
    pub fn erase_range<R>(&mut self, range: R) -> usize
    where
        R: RangeBounds<T>,
    {
        let (front, back) = self.span_raw(range.start_bound(), range.end_bound(), |v, b| {
            self.cmp.compare(v, b)
        });

        unsafe { self.remove_span(front, back) }
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        unsafe {
            let header_links = links(self.header);
            assert_eq!(header_links.parent(), None, "the header has no parent");
            assert_eq!(header_links.right(), None, "the header has no right child");

            let Some(root) = self.root() else {
                assert_eq!(self.len, 0);
                assert_eq!(self.leftmost, self.header);
                return;
            };

            assert_eq!(links(root).parent(), Some(self.header));
            assert_eq!(links(root).color(), Color::Black, "the root must be black");

            let mut count = 0;
            self.assert_invariants_at(root, &mut count);
            assert_eq!(count, self.len);

            assert_eq!(self.leftmost, subtree_min(root), "stale leftmost");

            // Walk the whole sequence, which must be strictly ascending and end at the header.
            let mut cur = self.leftmost;
            for _ in 1..self.len {
                let next = self.successor_raw(cur);
                assert!(
                    self.cmp.compares_lt(value(cur), value(next)),
                    "elements must be strictly ascending"
                );
                cur = next;
            }
            assert_eq!(self.successor_raw(cur), self.header);
        }
    }

    // Returns the black-height of `node`, counting `node` itself.
    unsafe fn assert_invariants_at(&self, node: NonNull<Node<T>>, count: &mut usize) -> usize {
        *count += 1;

        unsafe {
            let node_links = links(node);
            let mut heights = [0; 2];

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = node_links.child(dir) {
                    // Ensure child's parent link points to this node.
                    assert_eq!(links(child).parent(), Some(node));

                    if node_links.color() == Color::Red {
                        assert_eq!(
                            links(child).color(),
                            Color::Black,
                            "a red node must not have a red child"
                        );
                    }

                    heights[dir as usize] = self.assert_invariants_at(child, count);
                }
            }

            assert_eq!(heights[0], heights[1], "black-heights must match");

            heights[0] + usize::from(node_links.color() == Color::Black)
        }
    }
}

impl<T, C> Drop for RbTree<T, C> {
    fn drop(&mut self) {
        self.clear();

        // SAFETY: the header was allocated by `with_comparator`; its value is uninitialized, so
        // only the allocation is released.
        unsafe { drop(<Node<T> as Linked<Links<T>>>::from_ptr(self.header)) };
    }
}

impl<T: Clone, C: Clone> Clone for RbTree<T, C> {
    /// Returns a structural copy of the tree, with the same shape and colors.
    fn clone(&self) -> Self {
        let mut tree = RbTree::with_comparator(self.cmp.clone());

        let Some(root) = self.root() else {
            return tree;
        };

        unsafe {
            let header = tree.header;
            let mut stack = Vec::new();
            stack.push((root, tree.clone_node(root, header, Dir::Left)));

            while let Some((src, dst)) = stack.pop() {
                for dir in [Dir::Left, Dir::Right] {
                    if let Some(child) = links(src).child(dir) {
                        stack.push((child, tree.clone_node(child, dst, dir)));
                    }
                }
            }

            let copy_root = tree.root().expect("root was just copied");
            tree.leftmost = subtree_min(copy_root);
        }

        tree.len = self.len;
        debug!("cloned a tree of {} elements", self.len);

        tree
    }
}

impl<T, C: Default> Default for RbTree<T, C> {
    fn default() -> Self {
        RbTree::with_comparator(C::default())
    }
}

impl<T: fmt::Debug, C> fmt::Debug for RbTree<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, C> PartialEq for RbTree<T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq, C> Eq for RbTree<T, C> {}

impl<T: PartialOrd, C> PartialOrd for RbTree<T, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord, C> Ord for RbTree<T, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: Hash, C> Hash for RbTree<T, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len);
        for value in self {
            value.hash(state);
        }
    }
}

impl<T> Links<T> {
    #[must_use]
    const fn new(color: Color) -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                color,
            }),
        }
    }

    #[inline]
    fn color(&self) -> Color {
        unsafe { (*self.inner.get()).color }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_parent(&self, parent: Link<T>) -> Link<T> {
        unsafe { mem::replace(&mut (*self.inner.get()).parent, parent) }
    }

    #[inline]
    fn set_child(&self, dir: Dir, child: Link<T>) -> Link<T> {
        unsafe { mem::replace(&mut (*self.inner.get()).children[dir as usize], child) }
    }

    #[inline]
    fn set_color(&self, color: Color) -> Color {
        unsafe { mem::replace(&mut (*self.inner.get()).color, color) }
    }

    #[inline]
    fn toggle_color(&self) {
        self.set_color(self.color().toggle());
    }
}
