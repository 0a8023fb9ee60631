//! Move folding.
//!
//! A leaf that moves deeper because a sibling now shares its prefix shows up
//! in a raw diff twice: deleted at the old depth and added at the new one.
//! Folding replaces every such pair with one [`RadixAction::Movement`].

use tracing::debug;

use crate::operation::{RadixAction, RadixOperation, RadixOperations};

/// Collapse per-hash runs of mixed actions into movements.
///
/// Operations are grouped by hash. A group holding more than one distinct
/// action (or already holding a movement) becomes a single movement at the
/// depth of the group's last entry under [`by_hash_then_action`] order, which
/// is the target position when the group is a deletion plus an addition.
/// A group holding one action keeps one entry per distinct depth. The result
/// is ordered by [`by_action_then_depth`].
///
/// Folding is idempotent.
///
/// [`by_hash_then_action`]: crate::by_hash_then_action
/// [`by_action_then_depth`]: crate::by_action_then_depth
pub fn fold(ops: RadixOperations) -> RadixOperations {
    let input_len = ops.len();
    let mut sorted = ops.into_vec();
    sorted.sort_by(crate::by_hash_then_action);

    let mut out = RadixOperations::new();
    for run in sorted.chunk_by(|a, b| a.hash() == b.hash()) {
        fold_run(run, &mut out);
    }
    out.sort_by_action();

    let summary = out.summary();
    debug!(
        input = input_len,
        output = out.len(),
        movements = summary.movements,
        "folded radix operations"
    );
    out
}

fn fold_run(run: &[RadixOperation], out: &mut RadixOperations) {
    let Some(last) = run.last() else {
        return;
    };
    let first_action = run[0].action;
    let mixed = first_action == RadixAction::Movement
        || run.iter().any(|op| op.action != first_action);

    if mixed {
        let mut movement = last.clone();
        movement.action = RadixAction::Movement;
        out.push(movement);
        return;
    }

    // Sorted by depth within a single action, so duplicates are adjacent.
    let mut previous_depth = None;
    for op in run {
        if previous_depth != Some(op.depth()) {
            previous_depth = Some(op.depth());
            out.push(op.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use radix_store::Node;
    use radix_types::Hash256;
    use std::collections::BTreeMap;

    fn h(b: u8) -> Hash256 {
        Hash256::from_bytes([b; 32])
    }

    fn op(action: RadixAction, hash: u8, depth: u8) -> RadixOperation {
        RadixOperation::new(action, h(hash), Node::leaf(h(hash), vec![hash]), depth)
    }

    fn shape(ops: &RadixOperations) -> Vec<(char, u8, u8)> {
        ops.iter()
            .map(|o| (o.action.as_char(), o.hash().as_bytes()[0], o.depth()))
            .collect()
    }

    #[test]
    fn empty_input_folds_to_empty() {
        assert!(fold(RadixOperations::new()).is_empty());
    }

    #[test]
    fn deletion_and_addition_become_movement_at_target_depth() {
        let ops: RadixOperations = vec![
            op(RadixAction::Addition, 5, 4),
            op(RadixAction::Deletion, 5, 1),
        ]
        .into();
        assert_eq!(shape(&fold(ops)), vec![('M', 5, 4)]);
    }

    #[test]
    fn unrelated_operations_pass_through_in_action_order() {
        let ops: RadixOperations = vec![
            op(RadixAction::Addition, 1, 0),
            op(RadixAction::Deletion, 2, 0),
            op(RadixAction::Addition, 3, 1),
            op(RadixAction::Deletion, 4, 2),
        ]
        .into();
        assert_eq!(
            shape(&fold(ops)),
            vec![('D', 2, 0), ('D', 4, 2), ('A', 1, 0), ('A', 3, 1)]
        );
    }

    #[test]
    fn run_of_three_collapses_to_one_movement() {
        let ops: RadixOperations = vec![
            op(RadixAction::Deletion, 9, 1),
            op(RadixAction::Addition, 9, 3),
            op(RadixAction::Addition, 9, 5),
        ]
        .into();
        assert_eq!(shape(&fold(ops)), vec![('M', 9, 5)]);
    }

    #[test]
    fn single_action_run_keeps_distinct_depths() {
        let ops: RadixOperations = vec![
            op(RadixAction::Addition, 7, 2),
            op(RadixAction::Addition, 7, 2),
            op(RadixAction::Addition, 7, 3),
        ]
        .into();
        assert_eq!(shape(&fold(ops)), vec![('A', 7, 2), ('A', 7, 3)]);
    }

    #[test]
    fn movements_sort_first() {
        let ops: RadixOperations = vec![
            op(RadixAction::Addition, 1, 0),
            op(RadixAction::Deletion, 2, 1),
            op(RadixAction::Addition, 2, 3),
            op(RadixAction::Deletion, 3, 0),
        ]
        .into();
        assert_eq!(
            shape(&fold(ops)),
            vec![('M', 2, 3), ('D', 3, 0), ('A', 1, 0)]
        );
    }

    #[test]
    fn existing_movement_absorbs_its_run() {
        let ops: RadixOperations = vec![
            op(RadixAction::Movement, 4, 2),
            op(RadixAction::Addition, 4, 6),
        ]
        .into();
        assert_eq!(shape(&fold(ops)), vec![('M', 4, 6)]);
    }

    fn ops_strategy() -> impl Strategy<Value = Vec<RadixOperation>> {
        let action = prop_oneof![
            Just(RadixAction::Addition),
            Just(RadixAction::Deletion),
            Just(RadixAction::Movement),
        ];
        proptest::collection::vec((action, 0u8..6, 0u8..8), 0..30)
            .prop_map(|raw| raw.into_iter().map(|(a, hash, d)| op(a, hash, d)).collect())
    }

    proptest! {
        #[test]
        fn fold_is_idempotent(ops in ops_strategy()) {
            let once = fold(ops.into());
            let twice = fold(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn fold_never_grows(ops in ops_strategy()) {
            let len = ops.len();
            prop_assert!(fold(ops.into()).len() <= len);
        }

        #[test]
        fn fold_leaves_at_most_one_movement_per_hash(ops in ops_strategy()) {
            let folded = fold(ops.into());
            let mut per_hash: BTreeMap<Hash256, Vec<RadixAction>> = BTreeMap::new();
            for op in &folded {
                per_hash.entry(op.hash()).or_default().push(op.action);
            }
            for actions in per_hash.values() {
                if actions.contains(&RadixAction::Movement) {
                    prop_assert_eq!(actions.len(), 1);
                } else {
                    prop_assert!(actions.windows(2).all(|w| w[0] == w[1]));
                }
            }
        }

        #[test]
        fn fold_output_is_in_action_then_depth_order(ops in ops_strategy()) {
            let folded = fold(ops.into());
            prop_assert!(folded
                .as_slice()
                .windows(2)
                .all(|w| crate::by_action_then_depth(&w[0], &w[1]).is_le()));
        }
    }
}
