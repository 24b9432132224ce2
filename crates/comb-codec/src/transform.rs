// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Placement propagation: compose an outer matrix into every leaf.

use tracing::{debug, instrument};

use crate::math::{Mat4, Tolerance};
use crate::tree::{CombTree, Node, NodeId};

/// Composes `matrix` into every leaf using the default tolerance.
pub fn apply_transform(tree: &mut CombTree, matrix: &Mat4) {
    apply_transform_with(tree, matrix, &Tolerance::default());
}

/// Composes `matrix` into every reachable leaf, in place.
///
/// A leaf with transform `T` ends up with `matrix * T` (the outer placement
/// applies after the leaf's own); a leaf without one gets a copy of
/// `matrix`. A result within `tol` of the identity is dropped so the leaf
/// returns to "no matrix". An identity `matrix` leaves the tree untouched.
#[instrument(level = "debug", skip_all)]
pub fn apply_transform_with(tree: &mut CombTree, matrix: &Mat4, tol: &Tolerance) {
    if matrix.is_identity_within(tol) {
        debug!("identity placement, tree unchanged");
        return;
    }
    let mut leaves: Vec<NodeId> = tree
        .post_order()
        .filter(|(_, node)| matches!(node, Node::Leaf(_)))
        .map(|(id, _)| id)
        .collect();
    // A node reachable twice must still be placed once.
    leaves.sort_unstable();
    leaves.dedup();

    let mut cleared = 0usize;
    for id in &leaves {
        if let Node::Leaf(leaf) = tree.node_mut(*id) {
            let composed = match &leaf.matrix {
                Some(old) => matrix.multiply(old),
                None => *matrix,
            };
            if composed.is_identity_within(tol) {
                leaf.matrix = None;
                cleared += 1;
            } else {
                leaf.matrix = Some(composed);
            }
        }
    }
    debug!(leaves = leaves.len(), cleared, "placement applied");
}
