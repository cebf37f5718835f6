use std::{ops::Range, prelude::v1::*, string::String, vec};

use log::LevelFilter;
use proptest::prelude::*;
use simplelog::{Config, TestLogger};

use crate::model;

use super::*;

fn init_logging() {
    // Other tests may have installed the logger already.
    let _ = TestLogger::init(LevelFilter::Trace, Config::default());
}

fn insert_find_all(keys: &[u32]) {
    let mut tree: RbTree<u32> = RbTree::new();

    for &key in keys {
        assert!(tree.insert(key).1);
        tree.assert_invariants();
    }

    for key in keys {
        let found = tree.find(key).get().expect("item not found");
        assert_eq!(found, key);
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

#[test]
fn four_elems_find() {
    insert_find_all(&[0, 1, 2, 3]);
    insert_find_all(&[0, 1, 3, 2]);
    insert_find_all(&[0, 2, 1, 3]);
    insert_find_all(&[0, 2, 3, 1]);
    insert_find_all(&[0, 3, 1, 2]);
    insert_find_all(&[0, 3, 2, 1]);

    insert_find_all(&[1, 0, 2, 3]);
    insert_find_all(&[1, 0, 3, 2]);
    insert_find_all(&[1, 2, 0, 3]);
    insert_find_all(&[1, 2, 3, 0]);
    insert_find_all(&[1, 3, 0, 2]);
    insert_find_all(&[1, 3, 2, 0]);

    insert_find_all(&[2, 0, 1, 3]);
    insert_find_all(&[2, 0, 3, 1]);
    insert_find_all(&[2, 1, 0, 3]);
    insert_find_all(&[2, 1, 3, 0]);
    insert_find_all(&[2, 3, 0, 1]);
    insert_find_all(&[2, 3, 1, 0]);

    insert_find_all(&[3, 0, 1, 2]);
    insert_find_all(&[3, 0, 2, 1]);
    insert_find_all(&[3, 1, 0, 2]);
    insert_find_all(&[3, 1, 2, 0]);
    insert_find_all(&[3, 2, 0, 1]);
    insert_find_all(&[3, 2, 1, 0]);
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree: RbTree<u32> = RbTree::new();

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    for key in keys {
        let removed = tree.find_mut(key).remove_current();
        assert_eq!(removed.as_ref(), Some(key), "item not found");
        tree.assert_invariants();
    }

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        let removed = tree.find_mut(key).remove_current();
        assert_eq!(removed.as_ref(), Some(key), "item not found");
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all(&[0, 1]);
    insert_remove_all(&[1, 0]);
}

#[test]
fn remove_three() {
    insert_remove_all(&[0, 1, 2]);
    insert_remove_all(&[0, 2, 1]);
    insert_remove_all(&[1, 0, 2]);
    insert_remove_all(&[1, 2, 0]);
    insert_remove_all(&[2, 0, 1]);
    insert_remove_all(&[2, 1, 0]);
}

#[test]
fn remove_four() {
    insert_remove_all(&[0, 1, 2, 3]);
    insert_remove_all(&[0, 1, 3, 2]);
    insert_remove_all(&[0, 2, 1, 3]);
    insert_remove_all(&[0, 2, 3, 1]);
    insert_remove_all(&[0, 3, 1, 2]);
    insert_remove_all(&[0, 3, 2, 1]);

    insert_remove_all(&[1, 0, 2, 3]);
    insert_remove_all(&[1, 0, 3, 2]);
    insert_remove_all(&[1, 2, 0, 3]);
    insert_remove_all(&[1, 2, 3, 0]);
    insert_remove_all(&[1, 3, 0, 2]);
    insert_remove_all(&[1, 3, 2, 0]);

    insert_remove_all(&[2, 0, 1, 3]);
    insert_remove_all(&[2, 0, 3, 1]);
    insert_remove_all(&[2, 1, 0, 3]);
    insert_remove_all(&[2, 1, 3, 0]);
    insert_remove_all(&[2, 3, 0, 1]);
    insert_remove_all(&[2, 3, 1, 0]);

    insert_remove_all(&[3, 0, 1, 2]);
    insert_remove_all(&[3, 0, 2, 1]);
    insert_remove_all(&[3, 1, 0, 2]);
    insert_remove_all(&[3, 1, 2, 0]);
    insert_remove_all(&[3, 2, 0, 1]);
    insert_remove_all(&[3, 2, 1, 0]);
}

#[test]
fn ascending_and_descending_runs() {
    init_logging();

    let mut tree: RbTree<u32> = (0..512).collect();
    tree.assert_invariants();

    tree.extend((512..1024).rev());
    tree.assert_invariants();
    assert!(tree.iter().copied().eq(0..1024));

    // Removing every other element exercises every removal case along the way.
    for v in (0..1024).step_by(2) {
        assert_eq!(tree.erase(&v), 1);
        tree.assert_invariants();
    }
    assert!(tree.iter().copied().eq((1..1024).step_by(2)));
}

#[test]
fn small_tree_walkthrough() {
    init_logging();

    let mut tree = RbTree::new();
    for v in [5, 3, 8, 1, 4, 7, 9] {
        tree.insert(v);
    }
    tree.assert_invariants();

    assert_eq!(tree.len(), 7);
    assert_eq!(
        tree.iter().copied().collect::<Vec<_>>(),
        vec![1, 3, 4, 5, 7, 8, 9]
    );
    assert_eq!(
        tree.iter().rev().copied().collect::<Vec<_>>(),
        vec![9, 8, 7, 5, 4, 3, 1]
    );

    assert_eq!(tree.erase(&5), 1);
    tree.assert_invariants();
    assert_eq!(
        tree.iter().copied().collect::<Vec<_>>(),
        vec![1, 3, 4, 7, 8, 9]
    );

    for v in [1, 3, 4, 7, 8, 9] {
        assert_eq!(tree.erase(&v), 1);
        tree.assert_invariants();
    }

    assert_eq!(tree.len(), 0);
    assert!(tree.is_empty());
    assert_eq!(tree.begin(), tree.end());
}

#[test]
fn duplicate_insert_is_rejected() {
    let mut tree = RbTree::new();

    let (curs, inserted) = tree.insert(10);
    assert!(inserted);
    assert_eq!(curs.get(), Some(&10));

    let (curs, inserted) = tree.insert(10);
    assert!(!inserted);
    assert_eq!(curs.get(), Some(&10));

    assert_eq!(tree.len(), 1);
    assert_eq!(tree.count(&10), 1);
    assert_eq!(tree.count(&11), 0);
}

#[test]
fn missing_values() {
    let mut tree: RbTree<u32> = [2, 4, 6].into_iter().collect();

    assert!(tree.find(&5).is_end());
    assert_eq!(tree.find(&5), tree.end());
    assert_eq!(tree.get(&5), None);
    assert_eq!(tree.erase(&5), 0);
    assert_eq!(tree.take(&5), None);
    assert_eq!(tree.len(), 3);

    let mut empty: RbTree<u32> = RbTree::new();
    assert!(empty.find(&0).is_end());
    assert!(empty.lower_bound(&0).is_end());
    assert!(empty.upper_bound(&0).is_end());
    assert_eq!(empty.erase(&0), 0);
    assert_eq!(empty.pop_first(), None);
    assert_eq!(empty.pop_last(), None);
    assert_eq!(empty.first(), None);
    assert_eq!(empty.last(), None);
}

#[test]
fn bounds() {
    let tree: RbTree<u32> = [10, 20, 30, 40].into_iter().collect();

    assert_eq!(tree.lower_bound(&20).get(), Some(&20));
    assert_eq!(tree.lower_bound(&21).get(), Some(&30));
    assert_eq!(tree.lower_bound(&0).get(), Some(&10));
    assert!(tree.lower_bound(&41).is_end());

    assert_eq!(tree.upper_bound(&20).get(), Some(&30));
    assert_eq!(tree.upper_bound(&9).get(), Some(&10));
    assert!(tree.upper_bound(&40).is_end());

    let (lo, hi) = tree.equal_range(&30);
    assert_eq!(lo.get(), Some(&30));
    assert_eq!(hi.get(), Some(&40));
    assert_eq!(lo.until(hi).copied().collect::<Vec<_>>(), vec![30]);

    let (lo, hi) = tree.equal_range(&35);
    assert_eq!(lo, hi);
    assert_eq!(lo.until(hi).count(), 0);

    let (lo, hi) = tree.equal_range(&40);
    assert_eq!(lo.get(), Some(&40));
    assert!(hi.is_end());

    // Lookups may search by a projection of the element.
    assert_eq!(tree.find_by(|v| (v / 10).cmp(&3)).get(), Some(&30));
    assert_eq!(tree.lower_bound_by(|v| v.cmp(&25)).get(), Some(&30));
    assert_eq!(tree.upper_bound_by(|v| v.cmp(&30)).get(), Some(&40));
}

#[test]
fn cursors_wrap_around_the_end() {
    let tree: RbTree<u32> = [1, 2, 3].into_iter().collect();

    let mut curs = tree.end();
    assert!(curs.is_end());
    assert_eq!(curs.get(), None);
    assert_eq!(curs.peek_next(), Some(&1));
    assert_eq!(curs.peek_prev(), Some(&3));

    curs.move_prev();
    assert_eq!(curs.get(), Some(&3));
    assert_eq!(curs.peek_next(), None);

    curs.move_next();
    assert!(curs.is_end());

    curs.move_next();
    assert_eq!(curs, tree.begin());
    assert_eq!(curs.peek_prev(), None);

    curs.move_prev();
    assert!(curs.is_end());

    let empty: RbTree<u32> = RbTree::new();
    let mut curs = empty.begin();
    assert!(curs.is_end());
    curs.move_next();
    assert!(curs.is_end());
    curs.move_prev();
    assert!(curs.is_end());
}

#[test]
fn cursor_mut_removal() {
    let mut tree: RbTree<u32> = (0..10).collect();

    let mut curs = tree.find_mut(&4);
    assert_eq!(curs.remove_current(), Some(4));
    assert_eq!(curs.get(), Some(&5));
    assert_eq!(curs.remove_current_and_move_prev(), Some(5));
    assert_eq!(curs.get(), Some(&3));

    let mut curs = tree.cursor_end_mut();
    assert_eq!(curs.remove_current(), None);
    assert_eq!(curs.remove_current_and_move_prev(), None);

    let mut curs = tree.cursor_first_mut();
    assert_eq!(curs.remove_current_and_move_prev(), Some(0));
    assert!(curs.is_end());
    assert_eq!(curs.peek_next(), Some(&1));

    tree.assert_invariants();
    assert_eq!(tree.first(), Some(&1));
    assert_eq!(tree.len(), 7);
}

#[test]
fn hinted_insert() {
    let mut tree: RbTree<u32> = [10, 20, 30].into_iter().collect();

    // Correct hints link the value next to the cursor.
    let mut curs = tree.find_mut(&30);
    assert!(curs.insert(25));
    assert_eq!(curs.get(), Some(&25));
    assert!(curs.insert(22));
    assert_eq!(curs.peek_prev(), Some(&20));
    assert_eq!(curs.peek_next(), Some(&25));

    let mut curs = tree.cursor_end_mut();
    assert!(curs.insert(40));
    assert_eq!(curs.peek_next(), None);

    let mut curs = tree.cursor_first_mut();
    assert!(curs.insert(5));
    assert_eq!(curs.peek_prev(), None);

    // Wrong hints and duplicates fall back to an ordinary insertion.
    let mut curs = tree.cursor_first_mut();
    assert!(curs.insert(35));
    assert_eq!(curs.get(), Some(&35));
    assert!(!curs.insert(20));
    assert_eq!(curs.get(), Some(&20));

    tree.assert_invariants();
    assert_eq!(
        tree.iter().copied().collect::<Vec<_>>(),
        vec![5, 10, 20, 22, 25, 30, 35, 40]
    );
}

#[test]
fn until_with_reversed_cursors_is_empty() {
    let tree: RbTree<u32> = (1..=5).collect();

    let span = tree.find(&4).until(tree.find(&2));
    assert_eq!(span.clone().count(), 0);
    assert_eq!(span.rev().count(), 0);

    let span = tree.end().until(tree.find(&3));
    assert_eq!(span.clone().count(), 0);
    assert_eq!(span.rev().count(), 0);

    assert_eq!(tree.find(&3).until(tree.find(&3)).count(), 0);
    assert_eq!(
        tree.find(&2).until(tree.find(&4)).rev().copied().collect::<Vec<_>>(),
        vec![3, 2]
    );
    assert_eq!(
        tree.find(&3).until(tree.end()).copied().collect::<Vec<_>>(),
        vec![3, 4, 5]
    );
}

#[test]
fn position_order_follows_iteration() {
    let tree: RbTree<u32> = (0..64).map(|i| (i * 37) % 64).collect();
    tree.assert_invariants();

    let positions = (0..64)
        .map(|i| tree.find_raw(|v: &u32| v.cmp(&i)))
        .chain([tree.header()])
        .collect::<Vec<_>>();

    for (i, &a) in positions.iter().enumerate() {
        for (j, &b) in positions.iter().enumerate() {
            assert_eq!(tree.position_order(a, b), i.cmp(&j), "positions {i} and {j}");
        }
    }
}

#[test]
fn sorted_hinted_inserts_stay_balanced() {
    let mut tree: RbTree<u32> = RbTree::new();

    let mut curs = tree.cursor_end_mut();
    for v in 0..256 {
        assert!(curs.insert(v));
        curs.move_next();
    }
    drop(curs);

    tree.assert_invariants();
    assert!(tree.iter().copied().eq(0..256));
}

#[test]
fn ranges() {
    let tree: RbTree<u32> = (0..20).collect();

    assert!(tree.range(5..8).copied().eq(5..8));
    assert!(tree.range(5..=8).copied().eq(5..=8));
    assert!(tree.range(..3).copied().eq(0..3));
    assert!(tree.range(17..).copied().eq(17..20));
    assert!(tree.range(..).copied().eq(0..20));
    assert!(tree.range(15..).rev().copied().eq((15..20).rev()));

    let mut span = tree.range(3..6);
    assert_eq!(span.next(), Some(&3));
    assert_eq!(span.next_back(), Some(&5));
    assert_eq!(span.next(), Some(&4));
    assert_eq!(span.next_back(), None);
    assert_eq!(span.next(), None);

    assert_eq!(tree.range(8..8).count(), 0);
    assert_eq!(tree.range(30..40).count(), 0);

    #[allow(clippy::reversed_empty_ranges)]
    let inverted = tree.range(8..3);
    assert_eq!(inverted.count(), 0);
    #[allow(clippy::reversed_empty_ranges)]
    let inverted = tree.range(8..3);
    assert_eq!(inverted.rev().count(), 0);
}

#[test]
fn erase_ranges() {
    let mut tree: RbTree<u32> = (0..100).collect();

    assert_eq!(tree.erase_range(10..20), 10);
    tree.assert_invariants();
    assert_eq!(tree.lower_bound(&10).get(), Some(&20));

    assert_eq!(tree.erase_range(10..20), 0);
    #[allow(clippy::reversed_empty_ranges)]
    let erased = tree.erase_range(60..50);
    assert_eq!(erased, 0);

    assert_eq!(tree.erase_range(..5), 5);
    assert_eq!(tree.erase_range(90..), 10);
    assert_eq!(tree.first(), Some(&5));
    assert_eq!(tree.last(), Some(&89));
    tree.assert_invariants();

    assert_eq!(tree.erase_range(..), 75);
    assert!(tree.is_empty());
    assert_eq!(tree.begin(), tree.end());
    tree.assert_invariants();
}

#[test]
fn first_last_pop() {
    let mut tree: RbTree<u32> = [4, 2, 9, 7].into_iter().collect();

    assert_eq!(tree.first(), Some(&2));
    assert_eq!(tree.last(), Some(&9));
    assert_eq!(tree.pop_first(), Some(2));
    assert_eq!(tree.pop_last(), Some(9));
    assert_eq!(tree.first(), Some(&4));
    assert_eq!(tree.last(), Some(&7));
    tree.assert_invariants();

    let mut into_iter = tree.into_iter();
    assert_eq!(into_iter.len(), 2);
    assert_eq!(into_iter.next_back(), Some(7));
    assert_eq!(into_iter.next(), Some(4));
    assert_eq!(into_iter.next(), None);
}

#[test]
fn erase_keeps_other_elements_in_place() {
    let mut tree = RbTree::new();
    tree.extend([5u32, 3, 8, 1, 4, 7, 9]);

    // The root has two children, so its successor is relocated into its place.
    let root = tree.root().unwrap();
    unsafe {
        assert_eq!(value(root), &5);
        assert!(links(root).left().is_some() && links(root).right().is_some());
    }

    let successor = tree.find(&7).get().unwrap() as *const u32;
    let before = tree
        .iter()
        .map(|v| (*v, v as *const u32))
        .collect::<Vec<_>>();

    assert_eq!(tree.erase(&5), 1);
    tree.assert_invariants();

    assert_eq!(tree.find(&7).get().unwrap() as *const u32, successor);
    for (v, addr) in before.into_iter().filter(|&(v, _)| v != 5) {
        assert_eq!(tree.find(&v).get().unwrap() as *const u32, addr, "element {v} moved");
    }
}

#[test]
fn clear_and_reuse() {
    init_logging();

    let mut tree: RbTree<String> = ["b", "a", "c"].into_iter().map(String::from).collect();
    tree.clear();
    tree.assert_invariants();
    assert!(tree.is_empty());
    assert_eq!(tree.begin(), tree.end());

    tree.insert(String::from("z"));
    assert_eq!(tree.first().map(String::as_str), Some("z"));
    tree.assert_invariants();
}

#[test]
fn clone_is_independent() {
    init_logging();

    let mut original: RbTree<u32> = (0..50).collect();
    let copy = original.clone();
    copy.assert_invariants();

    original.erase_range(10..40);
    original.insert(1000);

    assert!(copy.iter().copied().eq(0..50));
    assert_eq!(copy.len(), 50);
    assert_ne!(original, copy);
}

#[test]
fn swap_exchanges_contents() {
    let mut a: RbTree<u32> = (0..5).collect();
    let mut b: RbTree<u32> = RbTree::new();

    a.swap(&mut b);
    a.assert_invariants();
    b.assert_invariants();

    assert!(a.is_empty());
    assert!(b.iter().copied().eq(0..5));

    // Both trees remain usable after the exchange.
    a.insert(7);
    b.insert(7);
    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 6);
}

#[test]
fn moved_tree_keeps_working() {
    let tree: RbTree<u32> = (0..8).collect();
    let boxed = Box::new(tree);

    boxed.assert_invariants();
    assert_eq!(boxed.end().peek_prev(), Some(&7));
}

#[test]
fn reverse_and_closure_comparators() {
    let mut tree = RbTree::with_comparator(natural::<i32>().rev());
    tree.extend([3, 1, 2]);
    tree.assert_invariants();
    assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
    assert_eq!(tree.lower_bound(&2).get(), Some(&2));
    assert_eq!(tree.upper_bound(&2).get(), Some(&1));

    let mut by_abs = RbTree::with_comparator(|a: &i32, b: &i32| a.abs().cmp(&b.abs()));
    by_abs.extend([-3, 1, 2, -1]);
    by_abs.assert_invariants();
    assert_eq!(by_abs.iter().copied().collect::<Vec<_>>(), vec![1, 2, -3]);
    assert!(by_abs.contains(&3));
    assert!(by_abs.comparator().compares_lt(&1, &-2));
    assert_eq!(by_abs.comparator().compare(&-2, &2), Ordering::Equal);
}

#[test]
fn comparisons_and_debug() {
    let a: RbTree<u32> = [1, 2, 3].into_iter().collect();
    let b: RbTree<u32> = [3, 2, 1].into_iter().collect();
    let c: RbTree<u32> = [1, 2, 4].into_iter().collect();

    assert_eq!(a, b);
    assert!(a < c);
    assert_eq!(std::format!("{a:?}"), "{1, 2, 3}");
}

#[test]
fn dotgraph_draws_every_node() {
    let tree: RbTree<u32> = (0..7).collect();
    let mut out = String::new();
    tree.dotgraph("t", &mut out).unwrap();

    assert!(out.starts_with("digraph \"graph-t\""));
    for v in 0..7 {
        assert!(out.contains(&std::format!("[label=\"{v}\"")));
    }
    assert!(out.contains("fillcolor=black"));

    let empty: RbTree<u32> = RbTree::new();
    let mut out = String::new();
    empty.dotgraph("e", &mut out).unwrap();
    assert_eq!(out, "digraph \"graph-e\" {}");
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

#[test]
fn model_ops_decode_from_fuzz_bytes() {
    init_logging();

    let bytes = (0..=255u8).cycle().take(1024).collect::<Vec<_>>();
    let mut u = arbitrary::Unstructured::new(&bytes);
    let ops: Vec<model::Op> = arbitrary::Arbitrary::arbitrary(&mut u).unwrap();
    model::run_btree_equivalence(ops);

    let input: model::CursorEquivalenceInput = arbitrary::Arbitrary::arbitrary(&mut u).unwrap();
    model::run_cursor_equivalence(input.values, input.ops);
}

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn cursor_equivalence(
        values in proptest::collection::vec(0u32..200, 0..100),
        ops in proptest::collection::vec(model::cursor_op_strategy(), FUZZ_RANGE),
    ) {
        model::run_cursor_equivalence(values, ops);
    }

    #[test]
    fn clone_matches_original(values in proptest::collection::vec(any::<u32>(), 0..200)) {
        let tree: RbTree<u32> = values.iter().copied().collect();
        let copy = tree.clone();

        copy.assert_invariants();
        prop_assert_eq!(&tree, &copy);
        prop_assert!(tree.iter().eq(copy.iter()));
    }
}
