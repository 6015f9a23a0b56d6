//! Property-based tests for tree comparison

use proptest::collection::btree_map;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use wood::compare::compare;
use wood::tree::{PathEntry, Tree};

fn arb_tree() -> impl Strategy<Value = BTreeMap<String, u8>> {
    btree_map("[a-c]{1,2}(/[a-c]{1,2}){0,2}", 0u8..4, 0..24)
}

fn to_tree(map: &BTreeMap<String, u8>) -> Tree {
    Tree::from_entries(
        map.iter()
            .map(|(path, hash)| PathEntry::new(path.clone(), [*hash; 32], 1)),
    )
    .unwrap()
}

proptest! {
    /// Every path lands in exactly one of the four sets
    #[test]
    fn prop_classification_partitions_union(a in arb_tree(), b in arb_tree()) {
        let comparison = compare(&to_tree(&a), &to_tree(&b));

        let union: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
        let sets = [
            comparison.added(),
            comparison.modified(),
            comparison.deleted(),
            comparison.unchanged(),
        ];
        let total: usize = sets.iter().map(|s| s.len()).sum();
        prop_assert_eq!(total, union.len());
        for path in union {
            prop_assert_eq!(sets.iter().filter(|s| s.contains(path)).count(), 1);
        }
    }

    /// A tree compared with itself has no changes
    #[test]
    fn prop_self_comparison_is_unchanged(a in arb_tree()) {
        let tree = to_tree(&a);
        let comparison = compare(&tree, &tree);
        prop_assert!(comparison.is_empty());
        prop_assert_eq!(comparison.unchanged().len(), tree.len());
    }

    /// Swapping the arguments swaps added and deleted
    #[test]
    fn prop_swap_mirrors_added_and_deleted(a in arb_tree(), b in arb_tree()) {
        let (ta, tb) = (to_tree(&a), to_tree(&b));
        let forward = compare(&ta, &tb);
        let backward = compare(&tb, &ta);
        prop_assert_eq!(forward.added(), backward.deleted());
        prop_assert_eq!(forward.deleted(), backward.added());
        prop_assert_eq!(forward.modified(), backward.modified());
        prop_assert_eq!(forward.unchanged(), backward.unchanged());
    }
}
