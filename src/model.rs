use std::{collections::BTreeSet, ops::Bound, prelude::v1::*};

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::RbTree;

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    Get(ItemValue),
    Remove(ItemValue),
    First,
    PopFirst,
    Last,
    PopLast,
    LowerBound(ItemValue),
    UpperBound(ItemValue),
    EraseRange(ItemValue, ItemValue),
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        fn get_value(v: &[u32], i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) => {
                    if v.is_empty() {
                        idx as u32
                    } else {
                        v[idx % v.len()]
                    }
                }
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Insert(item) => FinalOp::Insert(get_value(sorted, item)),
            Op::Get(item) => FinalOp::Get(get_value(sorted, item)),
            Op::Remove(item) => FinalOp::Remove(get_value(sorted, item)),
            Op::First => FinalOp::First,
            Op::PopFirst => FinalOp::PopFirst,
            Op::Last => FinalOp::Last,
            Op::PopLast => FinalOp::PopLast,
            Op::LowerBound(item) => FinalOp::LowerBound(get_value(sorted, item)),
            Op::UpperBound(item) => FinalOp::UpperBound(get_value(sorted, item)),
            Op::EraseRange(start, end) => {
                FinalOp::EraseRange(get_value(sorted, start), get_value(sorted, end))
            }
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32),
    Get(u32),
    Remove(u32),
    First,
    PopFirst,
    Last,
    PopLast,
    LowerBound(u32),
    UpperBound(u32),
    EraseRange(u32, u32),
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        value_strategy().prop_map(Op::Insert),
        value_strategy().prop_map(Op::Get),
        value_strategy().prop_map(Op::Remove),
        Just(Op::First),
        Just(Op::PopFirst),
        Just(Op::Last),
        Just(Op::PopLast),
        value_strategy().prop_map(Op::LowerBound),
        value_strategy().prop_map(Op::UpperBound),
        (value_strategy(), value_strategy()).prop_map(|(start, end)| Op::EraseRange(start, end)),
    ]
}

pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut sorted_values = Vec::with_capacity(ops.len());
    let mut btree = BTreeSet::new();
    let mut tree: RbTree<u32> = RbTree::new();

    fn insert_sorted(v: &mut Vec<u32>, value: u32) {
        if let Err(idx) = v.binary_search(&value) {
            v.insert(idx, value);
        }
    }

    fn remove_sorted(v: &mut Vec<u32>, value: u32) {
        if let Ok(idx) = v.binary_search(&value) {
            v.remove(idx);
        }
    }

    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&sorted_values);

        match final_op {
            FinalOp::Insert(value) => {
                insert_sorted(&mut sorted_values, value);

                let from_btree = btree.insert(value);
                let (curs, from_tree) = tree.insert(value);

                assert_eq!(curs.get(), Some(&value), "FinalOp #{op_id}: {final_op:?}");
                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Get(value) => {
                let from_btree = btree.get(&value);
                let from_tree = tree.get(&value);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
                assert_eq!(
                    usize::from(from_btree.is_some()),
                    tree.count(&value),
                    "FinalOp #{op_id}: {final_op:?}"
                );
            }

            FinalOp::Remove(value) => {
                remove_sorted(&mut sorted_values, value);

                let from_btree = usize::from(btree.remove(&value));
                let from_tree = tree.erase(&value);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::First => {
                let from_btree = btree.first();
                let from_tree = tree.first();

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
                assert_eq!(from_btree, tree.begin().get());
            }

            FinalOp::PopFirst => {
                let from_btree = btree.pop_first();
                let from_tree = tree.pop_first();

                if let Some(value) = from_btree {
                    remove_sorted(&mut sorted_values, value);
                }
                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Last => {
                let from_btree = btree.last();
                let from_tree = tree.last();

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
                assert_eq!(from_btree, tree.end().peek_prev());
            }

            FinalOp::PopLast => {
                let from_btree = btree.pop_last();
                let from_tree = tree.pop_last();

                if let Some(value) = from_btree {
                    remove_sorted(&mut sorted_values, value);
                }
                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::LowerBound(value) => {
                let from_btree = btree.range(value..).next();
                let from_tree = tree.lower_bound(&value).get();

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::UpperBound(value) => {
                let from_btree = btree
                    .range((Bound::Excluded(value), Bound::Unbounded))
                    .next();
                let from_tree = tree.upper_bound(&value).get();

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");

                let (lo, hi) = tree.equal_range(&value);
                assert_eq!(lo.until(hi).count(), usize::from(btree.contains(&value)));
            }

            FinalOp::EraseRange(start, end) => {
                let before = btree.len();
                btree.retain(|v| !(start..end).contains(v));
                sorted_values.retain(|v| !(start..end).contains(v));

                let from_btree = before - btree.len();
                let from_tree = tree.erase_range(start..end);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }
        }

        tree.assert_invariants();
        assert_eq!(btree.len(), tree.len());
        assert!(btree.iter().eq(tree.iter()));
        assert!(btree.iter().rev().eq(tree.iter().rev()));
    }
}

#[derive(Clone, Debug, Arbitrary)]
pub enum CursorOp {
    // Get is not an operation as it's executed on every loop iteration to check equivalence.
    MovePrev,
    MoveNext,
    PeekNext,
    PeekPrev,
    RemoveCurrent,
    RemoveCurrentMovePrev,
    Insert(u32),
}

pub fn cursor_op_strategy() -> impl Strategy<Value = CursorOp> {
    proptest::prop_oneof![
        Just(CursorOp::MovePrev),
        Just(CursorOp::MoveNext),
        Just(CursorOp::PeekNext),
        Just(CursorOp::PeekPrev),
        Just(CursorOp::RemoveCurrent),
        Just(CursorOp::RemoveCurrentMovePrev),
        (0u32..200).prop_map(CursorOp::Insert),
    ]
}

#[derive(Clone, Debug)]
pub struct CursorEquivalenceInput {
    pub values: Vec<u32>,
    pub ops: Vec<CursorOp>,
}

impl<'a> arbitrary::Arbitrary<'a> for CursorEquivalenceInput {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        fn value(u: &mut arbitrary::Unstructured<'_>) -> u32 {
            u32::arbitrary(u).unwrap_or(0)
        }

        fn op(u: &mut arbitrary::Unstructured<'_>) -> CursorOp {
            CursorOp::arbitrary(u).unwrap_or(CursorOp::MoveNext)
        }

        let num_values = u8::arbitrary(u)? % 100;
        let num_ops = u16::arbitrary(u)? % 1000;

        let values = core::iter::repeat_with(|| value(u))
            .take(num_values.into())
            .collect();

        let ops = core::iter::repeat_with(|| op(u))
            .take(num_ops.into())
            .collect();

        Ok(CursorEquivalenceInput { values, ops })
    }
}

pub fn run_cursor_equivalence(mut values: Vec<u32>, ops: Vec<CursorOp>) {
    values.sort_unstable();
    values.dedup();

    // The end position of the vector cursor is `None`.
    let mut vec = Vec::new();
    let mut tree: RbTree<u32> = RbTree::new();

    for val in values {
        vec.push(val);
        tree.insert(val);
    }

    fn vec_curs_prev(v: &[u32], curs: Option<usize>) -> Option<usize> {
        match curs {
            Some(i) => i.checked_sub(1),
            None => v.len().checked_sub(1),
        }
    }

    fn vec_curs_next(v: &[u32], curs: Option<usize>) -> Option<usize> {
        match curs {
            Some(i) => i.checked_add(1).filter(|&i| i < v.len()),
            None => (!v.is_empty()).then_some(0),
        }
    }

    let mut vec_curs = vec_curs_next(&vec, None);
    let mut tree_curs = tree.cursor_first_mut();

    // Check that the initial states are equivalent.
    {
        let v = vec_curs.map(|i| &vec[i]);
        let t = tree_curs.get();

        assert_eq!(v, t);
    }

    for op in ops {
        match op {
            CursorOp::MoveNext => {
                vec_curs = vec_curs_next(&vec, vec_curs);
                tree_curs.move_next();
            }

            CursorOp::MovePrev => {
                vec_curs = vec_curs_prev(&vec, vec_curs);
                tree_curs.move_prev();
            }

            CursorOp::PeekNext => {
                let v = vec_curs_next(&vec, vec_curs).map(|i| &vec[i]);
                let t = tree_curs.peek_next();

                assert_eq!(v, t);
            }

            CursorOp::PeekPrev => {
                let v = vec_curs_prev(&vec, vec_curs).map(|i| &vec[i]);
                let t = tree_curs.peek_prev();

                assert_eq!(v, t);
            }

            CursorOp::RemoveCurrent => {
                let v = vec_curs.map(|i| vec.remove(i));

                if vec_curs == Some(vec.len()) {
                    vec_curs = None;
                }

                let t = tree_curs.remove_current();

                assert_eq!(v, t);
            }

            CursorOp::RemoveCurrentMovePrev => {
                let new_v_curs = vec_curs.is_some().then(|| vec_curs_prev(&vec, vec_curs));
                let v = vec_curs.map(|i| vec.remove(i));

                if let Some(vc) = new_v_curs {
                    vec_curs = vc;
                }

                let t = tree_curs.remove_current_and_move_prev();

                assert_eq!(v, t);
            }

            CursorOp::Insert(value) => {
                let (idx, inserted) = match vec.binary_search(&value) {
                    Ok(idx) => (idx, false),
                    Err(idx) => {
                        vec.insert(idx, value);
                        (idx, true)
                    }
                };
                vec_curs = Some(idx);

                assert_eq!(tree_curs.insert(value), inserted);
            }
        }

        let v = vec_curs.map(|i| &vec[i]);
        let t = tree_curs.get();

        assert_eq!(v, t);
    }

    drop(tree_curs);
    tree.assert_invariants();
    assert!(vec.iter().eq(tree.iter()));
}
