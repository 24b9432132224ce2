// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Record writer.
//!
//! Encoding is two passes over the same immutable tree: [`count`] sizes the
//! record and picks the width, then the writer fills one pre-sized buffer
//! region by region in a single post-order walk.

use bytes::Bytes;
use tracing::{debug, instrument};

use crate::count::{count, Counts};
use crate::error::EncodeError;
use crate::format::{Opcode, RecordHeader, NO_MATRIX};
use crate::tree::{CombTree, Node};
use crate::wire::{SliceWriter, MAT4_WIRE_LEN};
use crate::width::WidthCode;

/// Region sizes for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Header to be written first.
    pub header: RecordHeader,
    /// Header size in bytes.
    pub header_len: usize,
    /// Matrix region size in bytes.
    pub matrix_len: usize,
    /// Leaf region size in bytes.
    pub leaf_len: usize,
    /// Opcode region size in bytes.
    pub rpn_len: usize,
    /// Whole record.
    pub total: usize,
}

impl Layout {
    /// Computes the layout implied by `counts`.
    pub fn for_counts(counts: &Counts) -> Result<Self, EncodeError> {
        let width = counts.width();
        let header_len = RecordHeader::encoded_len(width);
        let matrix_len = counts
            .n_mat
            .checked_mul(MAT4_WIRE_LEN)
            .ok_or(EncodeError::TooLarge {
                what: "matrix region",
            })?;
        let leaf_len = counts.leaf_region_len(width);
        let rpn_len = counts.rpn_len();
        let total = header_len
            .checked_add(matrix_len)
            .and_then(|n| n.checked_add(leaf_len))
            .and_then(|n| n.checked_add(rpn_len))
            .ok_or(EncodeError::TooLarge { what: "record" })?;
        let header = RecordHeader {
            width,
            n_matrices: counts.n_mat as u64,
            n_leaves: counts.n_leaf as u64,
            leaf_bytes: leaf_len as u64,
            rpn_len: rpn_len as u64,
            max_stack_depth: counts.max_stack_depth as u64,
        };
        Ok(Self {
            header,
            header_len,
            matrix_len,
            leaf_len,
            rpn_len,
            total,
        })
    }
}

/// Encodes `tree` as a combination record.
///
/// # Errors
///
/// [`EncodeError::InvalidName`] for a leaf name containing NUL,
/// [`EncodeError::TooLarge`] when the record size overflows `usize`, and
/// [`EncodeError::OutOfMemory`] when the output buffer cannot be allocated.
///
/// # Panics
///
/// Panics if the writing pass disagrees with the counting pass. Both read
/// the same borrowed tree, so this indicates a bug, not bad input.
#[instrument(level = "debug", skip_all)]
pub fn encode(tree: &CombTree) -> Result<Bytes, EncodeError> {
    if let Some(leaf) = tree.leaves().find(|leaf| leaf.name.contains('\0')) {
        return Err(EncodeError::InvalidName {
            name: leaf.name.clone(),
        });
    }
    let counts = count(tree);
    let layout = Layout::for_counts(&counts)?;
    debug!(
        n_leaf = counts.n_leaf,
        n_mat = counts.n_mat,
        rpn_len = layout.rpn_len,
        max_stack_depth = counts.max_stack_depth,
        width = %layout.header.width,
        total = layout.total,
        "encoding combination record"
    );

    let mut buf = Vec::new();
    buf.try_reserve_exact(layout.total)
        .map_err(|_| EncodeError::OutOfMemory {
            requested: layout.total,
        })?;
    buf.resize(layout.total, 0);
    write_record(tree, &counts, &layout, &mut buf);
    Ok(Bytes::from(buf))
}

/// Size in bytes of the record [`encode`] would produce.
pub fn encoded_len(tree: &CombTree) -> Result<usize, EncodeError> {
    Layout::for_counts(&count(tree)).map(|layout| layout.total)
}

fn write_record(tree: &CombTree, counts: &Counts, layout: &Layout, buf: &mut [u8]) {
    let width: WidthCode = layout.header.width;
    let (head, rest) = buf.split_at_mut(layout.header_len);
    let (mats, rest) = rest.split_at_mut(layout.matrix_len);
    let (leaves, ops) = rest.split_at_mut(layout.leaf_len);

    let mut head = SliceWriter::new(head, "header");
    let mut mats = SliceWriter::new(mats, "matrix");
    let mut leaves = SliceWriter::new(leaves, "leaf");
    let mut ops = SliceWriter::new(ops, "opcode");
    let emit_ops = counts.non_union_seen;

    layout.header.write(&mut head);

    let mut n_leaf = 0usize;
    let mut n_mat = 0usize;
    for (_, node) in tree.post_order() {
        let opcode = match node {
            Node::Leaf(leaf) => {
                leaves.put(leaf.name.as_bytes());
                leaves.put_u8(0);
                match leaf.stored_matrix() {
                    Some(matrix) => {
                        mats.put_mat4(matrix);
                        leaves.put_signed(i64::try_from(n_mat).unwrap_or(i64::MAX), width);
                        n_mat += 1;
                    }
                    None => leaves.put_signed(NO_MATRIX, width),
                }
                n_leaf += 1;
                Opcode::Leaf
            }
            Node::Not(_) => Opcode::Not,
            Node::Binary { op, .. } => Opcode::from(*op),
        };
        if emit_ops {
            ops.put_u8(opcode as u8);
        }
    }

    assert_eq!(n_leaf, counts.n_leaf, "leaf count disagrees with counting pass");
    assert_eq!(n_mat, counts.n_mat, "matrix count disagrees with counting pass");
    assert!(head.is_full(), "header region not filled");
    assert!(mats.is_full(), "matrix region not filled");
    assert!(
        leaves.is_full(),
        "leaf region filled to {} of {}",
        leaves.position(),
        leaves.capacity()
    );
    assert!(
        ops.is_full(),
        "opcode region filled to {} of {}",
        ops.position(),
        ops.capacity()
    );
}
