use cordyceps_rbtree::{RbMap, RbTree};

fn print_tree(label: &str, tree: &RbTree<u32>) {
    println!(
        "{label}: {:?} (len {})",
        tree.iter().collect::<Vec<_>>(),
        tree.len()
    );
}

fn main() {
    let mut tree: RbTree<u32> = RbTree::new();

    for v in [5, 3, 8, 1, 4, 7, 9] {
        tree.insert(v);
        tree.assert_invariants();
    }
    print_tree("inserted", &tree);
    println!(
        "reversed: {:?}",
        tree.iter().rev().collect::<Vec<_>>()
    );

    let mut graph = String::new();
    if tree.dotgraph("demo", &mut graph).is_ok() {
        println!("{graph}");
    }

    let (lo, hi) = tree.equal_range(&4);
    println!("equal_range(4): {:?}", lo.until(hi).collect::<Vec<_>>());
    println!("lower_bound(6): {:?}", tree.lower_bound(&6).get());
    println!("upper_bound(9): {:?}", tree.upper_bound(&9).get());

    tree.erase(&5);
    tree.assert_invariants();
    print_tree("erased 5", &tree);

    for v in [1, 3, 4, 7, 8, 9] {
        tree.erase(&v);
        tree.assert_invariants();
    }
    print_tree("erased all", &tree);
    assert!(tree.begin() == tree.end());

    let mut words: RbMap<&str, usize> = RbMap::new();
    for word in "the quick brown fox jumps over the lazy dog".split(' ') {
        *words.get_or_insert_default(word) += 1;
    }
    words.assert_invariants();
    println!("{words:?}");
}
