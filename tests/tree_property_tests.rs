//! Property-based testing for the ordered indexes
//!
//! Drives both balancing strategies with random key sets and operation
//! sequences, checking ordering, balance, idempotence and range properties
//! against a `BTreeSet` model.

use proptest::prelude::*;
use std::collections::BTreeSet;
use sylva::tree::{
    ColorBalancedIndex, HeightBalancedIndex, OrderedIndex, OrderedLookup, RangeIterator,
    TraverseOrder,
};

// =============================================================================
// PROPERTY TEST GENERATORS
// =============================================================================

/// Operations applied to an index and to the model side by side
#[derive(Debug, Clone)]
enum TreeOp {
    Insert(i32),
    Delete(i32),
}

fn tree_ops_strategy() -> impl Strategy<Value = Vec<TreeOp>> {
    prop::collection::vec(
        prop_oneof![
            3 => (0..500i32).prop_map(TreeOp::Insert),
            2 => (0..500i32).prop_map(TreeOp::Delete),
        ],
        0..400,
    )
}

fn order_strategy() -> impl Strategy<Value = TraverseOrder> {
    prop_oneof![
        Just(TraverseOrder::PreOrder),
        Just(TraverseOrder::InOrder),
        Just(TraverseOrder::PostOrder),
        Just(TraverseOrder::ReversedOrder),
    ]
}

fn avl_height_bound(n: usize) -> usize {
    (1.44 * ((n + 2) as f64).log2()).ceil() as usize
}

fn red_black_height_bound(n: usize) -> usize {
    (2.0 * ((n + 1) as f64).log2()).floor() as usize
}

/// Apply `ops` to `tree` and the model, checking `validate` after each step
fn run_ops<T: OrderedIndex<i32>>(
    tree: &mut T,
    ops: &[TreeOp],
) -> Result<BTreeSet<i32>, TestCaseError> {
    let mut model = BTreeSet::new();
    for op in ops {
        match *op {
            TreeOp::Insert(key) => {
                prop_assert_eq!(tree.insert(key).unwrap(), model.insert(key));
            }
            TreeOp::Delete(key) => {
                prop_assert_eq!(tree.delete(&key).unwrap(), model.remove(&key));
            }
        }
        prop_assert!(tree.validate(), "invalid after {:?}\n{}", op, tree.pretty_print());
        prop_assert_eq!(tree.size(), model.len());
    }
    Ok(model)
}

// =============================================================================
// ORDERING AND BALANCE PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn prop_avl_inorder_is_sorted(keys in prop::collection::btree_set(any::<i32>(), 0..500)) {
        let tree = HeightBalancedIndex::from_sequence(keys.iter().copied()).unwrap();
        prop_assert_eq!(tree.size(), keys.len());
        let expected: Vec<i32> = keys.iter().copied().collect();
        prop_assert_eq!(tree.to_vec(TraverseOrder::InOrder), expected);
        prop_assert!(tree.validate());
        prop_assert!(tree.height() <= avl_height_bound(keys.len()));
    }

    #[test]
    fn prop_red_black_inorder_is_sorted(keys in prop::collection::btree_set(any::<i32>(), 0..500)) {
        let tree = ColorBalancedIndex::from_sequence(keys.iter().copied()).unwrap();
        prop_assert_eq!(tree.size(), keys.len());
        let expected: Vec<i32> = keys.iter().copied().collect();
        prop_assert_eq!(tree.to_vec(TraverseOrder::InOrder), expected);
        prop_assert!(tree.validate());
        prop_assert!(tree.height() <= red_black_height_bound(keys.len()));
    }

    #[test]
    fn prop_avl_random_ops_match_model(ops in tree_ops_strategy()) {
        let mut tree = HeightBalancedIndex::new();
        let model = run_ops(&mut tree, &ops)?;
        let expected: Vec<i32> = model.iter().copied().collect();
        prop_assert_eq!(tree.to_vec(TraverseOrder::InOrder), expected);
        prop_assert!(tree.height() <= avl_height_bound(model.len()));
    }

    #[test]
    fn prop_red_black_random_ops_match_model(ops in tree_ops_strategy()) {
        let mut tree = ColorBalancedIndex::new();
        let model = run_ops(&mut tree, &ops)?;
        let expected: Vec<i32> = model.iter().copied().collect();
        prop_assert_eq!(tree.to_vec(TraverseOrder::InOrder), expected);
        prop_assert!(tree.height() <= red_black_height_bound(model.len()));
    }

    #[test]
    fn prop_duplicate_insert_is_idempotent(
        keys in prop::collection::vec(0..100i32, 1..200),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut avl = HeightBalancedIndex::from_sequence(keys.iter().copied()).unwrap();
        let mut rb = ColorBalancedIndex::from_sequence(keys.iter().copied()).unwrap();
        let again = keys[pick.index(keys.len())];

        let avl_before = avl.to_vec(TraverseOrder::InOrder);
        let rb_before = rb.to_vec(TraverseOrder::InOrder);
        prop_assert!(!avl.insert(again).unwrap());
        prop_assert!(!rb.insert(again).unwrap());
        prop_assert_eq!(avl.to_vec(TraverseOrder::InOrder), avl_before);
        prop_assert_eq!(rb.to_vec(TraverseOrder::InOrder), rb_before);
    }

    #[test]
    fn prop_delete_all_in_any_order(
        keys in prop::collection::btree_set(any::<i16>(), 1..300)
            .prop_map(|set| set.into_iter().collect::<Vec<_>>())
            .prop_shuffle(),
    ) {
        let mut avl = HeightBalancedIndex::from_sequence(keys.iter().rev().copied()).unwrap();
        let mut rb = ColorBalancedIndex::from_sequence(keys.iter().rev().copied()).unwrap();
        for key in &keys {
            prop_assert!(avl.delete(key).unwrap());
            prop_assert!(rb.delete(key).unwrap());
            prop_assert!(avl.validate());
            prop_assert!(rb.validate());
        }
        prop_assert_eq!(avl.size(), 0);
        prop_assert_eq!(rb.size(), 0);
    }
}

// =============================================================================
// RANGE ITERATOR PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn prop_range_matches_filtered_traversal(
        keys in prop::collection::btree_set(-200..200i32, 0..200),
        a in -250..250i32,
        b in -250..250i32,
        order in order_strategy(),
    ) {
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        let tree = ColorBalancedIndex::from_sequence(keys.iter().copied()).unwrap();

        let expected: Vec<i32> = tree
            .to_vec(order)
            .into_iter()
            .filter(|key| (from..=to).contains(key))
            .collect();
        let produced: Vec<i32> = RangeIterator::new(&tree, Some(from), Some(to), order)
            .unwrap()
            .copied()
            .collect();
        prop_assert_eq!(produced, expected);
    }

    #[test]
    fn prop_sorted_range_equals_model(
        keys in prop::collection::btree_set(any::<i32>(), 0..300),
        from in prop::option::of(any::<i32>()),
        to in prop::option::of(any::<i32>()),
    ) {
        prop_assume!(match (from, to) { (Some(f), Some(t)) => f <= t, _ => true });
        let tree = HeightBalancedIndex::from_sequence(keys.iter().copied()).unwrap();
        let in_range =
            |key: &i32| from.map_or(true, |f| *key >= f) && to.map_or(true, |t| *key <= t);

        let ascending: Vec<i32> = keys.iter().copied().filter(|k| in_range(k)).collect();
        let descending: Vec<i32> = ascending.iter().rev().copied().collect();

        let produced: Vec<i32> =
            tree.range(from, to, TraverseOrder::InOrder).unwrap().copied().collect();
        prop_assert_eq!(produced, ascending);
        let produced: Vec<i32> =
            tree.range(from, to, TraverseOrder::ReversedOrder).unwrap().copied().collect();
        prop_assert_eq!(produced, descending);
    }

    #[test]
    fn prop_close_stops_iteration(
        keys in prop::collection::btree_set(any::<i32>(), 1..100),
        take in 0usize..10,
    ) {
        let tree = ColorBalancedIndex::from_sequence(keys.iter().copied()).unwrap();
        let mut iter = RangeIterator::unbounded(&tree, TraverseOrder::InOrder);
        for _ in 0..take {
            iter.next();
        }
        iter.close();
        prop_assert!(!iter.has_next());
        prop_assert_eq!(iter.next(), None);
    }

    #[test]
    fn prop_pop_min_respects_bound(
        keys in prop::collection::btree_set(0..1000i32, 0..200),
        bound in 0..1000i32,
    ) {
        let mut tree = ColorBalancedIndex::from_sequence(keys.iter().copied()).unwrap();
        let expected_min = keys.range(bound..).next().copied();
        let expected_max = keys.range(..=bound).next_back().copied();

        prop_assert_eq!(tree.pop_max(Some(&bound), false).unwrap(), expected_max);
        prop_assert_eq!(tree.pop_min(Some(&bound), true).unwrap(), expected_min);
        if let Some(removed) = expected_min {
            prop_assert!(!tree.exist(&removed));
        }
        prop_assert!(tree.validate());
    }
}

// =============================================================================
// CONCRETE SCENARIOS
// =============================================================================

#[test]
fn test_red_black_scenario() {
    let tree = ColorBalancedIndex::from_sequence([5, 3, 8, 1, 4, 7, 9]).unwrap();
    assert_eq!(tree.to_vec(TraverseOrder::InOrder), vec![1, 3, 4, 5, 7, 8, 9]);
    assert!(tree.validate());
}

#[test]
fn test_avl_ascending_build_permuted_delete() {
    let mut tree = HeightBalancedIndex::from_sequence(1..1000u32).unwrap();
    assert_eq!(tree.size(), 999);

    // 1..1000 permuted by a fixed stride coprime with 999
    let order: Vec<u32> = (0..999u32).map(|i| (i * 409) % 999 + 1).collect();
    for key in &order {
        assert!(tree.delete(key).unwrap(), "missing {}", key);
        assert!(tree.validate());
    }
    assert_eq!(tree.size(), 0);
}

#[test]
fn test_range_scenarios() {
    let tree = HeightBalancedIndex::from_sequence(1..=10).unwrap();
    let keys: Vec<i32> =
        tree.range(Some(3), Some(7), TraverseOrder::InOrder).unwrap().copied().collect();
    assert_eq!(keys, vec![3, 4, 5, 6, 7]);
    assert!(tree.range(Some(8), Some(2), TraverseOrder::InOrder).is_err());
}
