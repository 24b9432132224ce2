// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! First pass over a tree: the exact counts the writer needs to size the
//! record and pick its integer width.

use crate::tree::{BinaryOp, CombTree, Node, TRAVERSAL_STACK_INITIAL};
use crate::width::WidthCode;

/// Bytes reserved per leaf for its matrix index before the width is known.
pub const INDEX_UPPER_BOUND: usize = 8;

/// Tree statistics gathered by [`count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Counts {
    /// Leaf nodes.
    pub n_leaf: usize,
    /// Leaves whose matrix is not exactly the identity.
    pub n_mat: usize,
    /// Operator nodes (unary and binary).
    pub n_oper: usize,
    /// Leaf-region size assuming 8-byte matrix indices. See
    /// [`Counts::leaf_region_len`] for the size at a chosen width.
    pub leaf_bytes: usize,
    /// True when any operator other than union is present.
    pub non_union_seen: bool,
    /// Stack slots a postfix decoder needs to rebuild the tree.
    pub max_stack_depth: usize,
}

impl Counts {
    /// Opcode-region length: one byte per node, or zero for pure-union trees.
    pub fn rpn_len(&self) -> usize {
        if self.non_union_seen {
            self.n_leaf + self.n_oper
        } else {
            0
        }
    }

    /// Exact leaf-region size once matrix indices use `width`.
    pub fn leaf_region_len(&self, width: WidthCode) -> usize {
        self.leaf_bytes - self.n_leaf * (INDEX_UPPER_BOUND - width.byte_len())
    }

    /// Width for every integer in the record.
    ///
    /// Chosen from the largest header value. Because every leaf reserves at
    /// least ten bytes in `leaf_bytes`, the chosen width always holds
    /// `n_mat - 1` in its signed range too.
    pub fn width(&self) -> WidthCode {
        let max = [
            self.n_mat,
            self.n_leaf,
            self.leaf_bytes,
            self.rpn_len(),
            self.max_stack_depth,
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        WidthCode::select(max as u64)
    }
}

/// Counts leaves, matrices and operators and computes the decode stack depth.
///
/// Depth rules: a leaf needs one slot; a complement needs one more than its
/// operand; a binary node keeps its left result live while the right operand
/// is built, so it needs `max(left, right + 1)`.
pub fn count(tree: &CombTree) -> Counts {
    let mut counts = Counts::default();
    let mut depths: Vec<usize> = Vec::with_capacity(TRAVERSAL_STACK_INITIAL);
    for (_, node) in tree.post_order() {
        let depth = match node {
            Node::Leaf(leaf) => {
                counts.n_leaf += 1;
                if leaf.stored_matrix().is_some() {
                    counts.n_mat += 1;
                }
                counts.leaf_bytes += leaf.name.len() + 1 + INDEX_UPPER_BOUND;
                1
            }
            Node::Not(_) => {
                counts.non_union_seen = true;
                counts.n_oper += 1;
                1 + depths.pop().unwrap_or(0)
            }
            Node::Binary { op, .. } => {
                counts.n_oper += 1;
                if *op != BinaryOp::Union {
                    counts.non_union_seen = true;
                }
                let right = depths.pop().unwrap_or(0);
                let left = depths.pop().unwrap_or(0);
                left.max(right + 1)
            }
        };
        depths.push(depth);
    }
    counts.max_stack_depth = depths.pop().unwrap_or(0);
    counts
}
