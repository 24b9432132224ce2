// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rebuilds a union-only tree from its leaves.
//!
//! Pure-union records carry no opcode stream, so the original shape is gone.
//! Union is associative and commutative, so any tree over the same leaves
//! describes the same solid; the balanced one keeps evaluation depth at
//! `O(log n)`.

use crate::tree::{CombTree, NodeId};

/// Joins `leaves` (already in `tree`'s arena) into a balanced union and
/// returns its root.
///
/// Adjacent pairs are joined level by level; an odd trailing node is carried
/// to the next level unpaired. No leaves gives `None`; one leaf is returned
/// as the root itself.
pub fn balance_union(tree: &mut CombTree, mut leaves: Vec<NodeId>) -> Option<NodeId> {
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity(leaves.len().div_ceil(2));
        for pair in leaves.chunks(2) {
            match pair {
                [left, right] => next.push(tree.union(*left, *right)),
                [single] => next.push(*single),
                _ => {}
            }
        }
        leaves = next;
    }
    leaves.pop()
}
