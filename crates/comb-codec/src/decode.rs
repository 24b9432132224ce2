// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Record reader.
//!
//! Records with an opcode stream are rebuilt exactly by a bounded postfix
//! stack machine. Pure-union records are rebuilt from their leaf list by
//! [`balance_union`](crate::balance::balance_union). Input is untrusted:
//! every count is checked against the bytes actually present before it
//! sizes an allocation or drives a loop.

use tracing::{debug, instrument, trace};

use crate::balance::balance_union;
use crate::error::DecodeError;
use crate::format::{Opcode, RecordHeader, NO_MATRIX};
use crate::math::Mat4;
use crate::tree::{CombTree, Leaf, NodeId};
use crate::wire::{Reader, MAT4_WIRE_LEN};
use crate::width::WidthCode;

/// Hard cap on decoder stack slots, independent of the record's own figure.
pub const DEFAULT_STACK_CEILING: usize = 8000;

/// Caller-supplied decoding limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Upper bound on stack slots regardless of `max_stack_depth`.
    pub stack_ceiling: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            stack_ceiling: DEFAULT_STACK_CEILING,
        }
    }
}

/// A record split into its regions, validated for size but not content.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    /// Parsed header.
    pub header: RecordHeader,
    /// Matrix region bytes.
    pub matrices: &'a [u8],
    /// Offset of the matrix region.
    pub matrix_offset: usize,
    /// Leaf region bytes.
    pub leaves: &'a [u8],
    /// Offset of the leaf region.
    pub leaf_offset: usize,
    /// Opcode region bytes (empty for pure-union records).
    pub opcodes: &'a [u8],
    /// Offset of the opcode region.
    pub opcode_offset: usize,
}

impl RecordView<'_> {
    /// Number of matrices.
    pub fn n_matrices(&self) -> usize {
        self.matrices.len() / MAT4_WIRE_LEN
    }

    /// True when the tree must be rebuilt from the opcode stream.
    pub fn is_postfix(&self) -> bool {
        !self.opcodes.is_empty()
    }
}

/// Parses the header and splits the record into regions.
///
/// Rejects records whose regions do not fit, and records with bytes past
/// the opcode region.
pub fn read_header(bytes: &[u8]) -> Result<RecordView<'_>, DecodeError> {
    let mut reader = Reader::new(bytes);
    let header = RecordHeader::read(&mut reader)?;

    let matrix_offset = reader.position();
    let matrices = take_region(&mut reader, "matrix region", header.matrix_region_len())?;
    let leaf_offset = reader.position();
    let leaves = take_region(&mut reader, "leaf region", header.leaf_bytes)?;
    let opcode_offset = reader.position();
    let opcodes = take_region(&mut reader, "opcode region", header.rpn_len)?;

    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes {
            remaining: reader.remaining(),
        });
    }

    // Every leaf is at least a NUL and an index.
    let min_leaf = 1 + header.width.byte_len() as u64;
    if header.n_leaves.saturating_mul(min_leaf) > leaves.len() as u64 {
        return Err(DecodeError::RegionTooLarge {
            what: "leaf entries",
            offset: leaf_offset,
            length: header.n_leaves.saturating_mul(min_leaf),
            available: leaves.len(),
        });
    }

    Ok(RecordView {
        header,
        matrices,
        matrix_offset,
        leaves,
        leaf_offset,
        opcodes,
        opcode_offset,
    })
}

fn take_region<'a>(
    reader: &mut Reader<'a>,
    what: &'static str,
    length: u64,
) -> Result<&'a [u8], DecodeError> {
    let too_large = DecodeError::RegionTooLarge {
        what,
        offset: reader.position(),
        length,
        available: reader.remaining(),
    };
    match usize::try_from(length) {
        Ok(len) if len <= reader.remaining() => reader.take(len, what),
        _ => Err(too_large),
    }
}

/// Decodes a record with the default limits.
pub fn decode(bytes: &[u8]) -> Result<CombTree, DecodeError> {
    decode_with(bytes, &DecodeOptions::default())
}

/// Decodes a record.
///
/// # Errors
///
/// Any [`DecodeError`]; on error nothing is returned and the partially
/// built tree is dropped.
#[instrument(level = "debug", skip_all, fields(len = bytes.len()))]
pub fn decode_with(bytes: &[u8], options: &DecodeOptions) -> Result<CombTree, DecodeError> {
    let view = read_header(bytes)?;
    let header = &view.header;
    let n_leaves = to_usize(header.n_leaves);
    let matrices = read_matrices(&view)?;

    let arena = if view.is_postfix() {
        view.opcodes.len()
    } else {
        n_leaves.saturating_mul(2)
    };
    let mut tree = CombTree::try_with_capacity(arena)
        .map_err(|_| DecodeError::OutOfMemory { requested: arena })?;
    let mut source = LeafSource {
        reader: Reader::with_base(view.leaves, view.leaf_offset),
        matrices: &matrices,
        width: header.width,
        expected: n_leaves,
        read: 0,
    };

    let root = if view.is_postfix() {
        let limit = to_usize(header.max_stack_depth).min(options.stack_ceiling);
        debug!(
            n_leaves,
            rpn_len = view.opcodes.len(),
            limit,
            "rebuilding from opcode stream"
        );
        let root = run_postfix(&mut tree, &mut source, view.opcodes, limit)?;
        source.finish()?;
        Some(root)
    } else {
        debug!(n_leaves, "rebuilding balanced union");
        let mut ids = Vec::new();
        ids.try_reserve_exact(n_leaves)
            .map_err(|_| DecodeError::OutOfMemory {
                requested: n_leaves,
            })?;
        for _ in 0..n_leaves {
            let leaf = source.next_leaf()?;
            ids.push(tree.push_leaf(leaf));
        }
        source.finish()?;
        balance_union(&mut tree, ids)
    };
    tree.set_root(root);
    Ok(tree)
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

fn read_matrices(view: &RecordView<'_>) -> Result<Vec<Mat4>, DecodeError> {
    let count = view.n_matrices();
    let mut out = Vec::new();
    out.try_reserve_exact(count)
        .map_err(|_| DecodeError::OutOfMemory { requested: count })?;
    let mut reader = Reader::with_base(view.matrices, view.matrix_offset);
    for _ in 0..count {
        out.push(reader.read_mat4()?);
    }
    Ok(out)
}

/// Sequential consumer of the leaf region.
struct LeafSource<'a> {
    reader: Reader<'a>,
    matrices: &'a [Mat4],
    width: WidthCode,
    expected: usize,
    read: usize,
}

impl LeafSource<'_> {
    fn next_leaf(&mut self) -> Result<Leaf, DecodeError> {
        if self.read == self.expected {
            return Err(DecodeError::LeafCountMismatch {
                expected: self.expected,
                actual: self.read + 1,
            });
        }
        let name = self.reader.read_cstr()?;
        let offset = self.reader.position();
        let index = self.reader.read_signed(self.width, "matrix index")?;
        let matrix = if index == NO_MATRIX {
            None
        } else {
            let slot = usize::try_from(index)
                .ok()
                .and_then(|i| self.matrices.get(i))
                .ok_or(DecodeError::MatrixIndexOutOfRange {
                    index,
                    n_matrices: self.matrices.len(),
                    offset,
                })?;
            Some(*slot)
        };
        self.read += 1;
        trace!(name, index, "leaf");
        Ok(Leaf::new(name, matrix))
    }

    fn finish(&self) -> Result<(), DecodeError> {
        if self.read != self.expected {
            return Err(DecodeError::LeafCountMismatch {
                expected: self.expected,
                actual: self.read,
            });
        }
        if !self.reader.is_empty() {
            return Err(DecodeError::LeafBytesRemaining {
                remaining: self.reader.remaining(),
            });
        }
        Ok(())
    }
}

fn run_postfix(
    tree: &mut CombTree,
    source: &mut LeafSource<'_>,
    opcodes: &[u8],
    limit: usize,
) -> Result<NodeId, DecodeError> {
    let mut stack: Vec<NodeId> = Vec::new();
    let reserve = limit.min(opcodes.len());
    stack
        .try_reserve_exact(reserve)
        .map_err(|_| DecodeError::OutOfMemory { requested: reserve })?;

    for (index, &byte) in opcodes.iter().enumerate() {
        let opcode = Opcode::from_byte(byte).ok_or(DecodeError::UnknownOpcode {
            opcode: byte,
            index,
        })?;
        let underflow = DecodeError::StackUnderflow {
            index,
            opcode: opcode.name(),
        };
        let node = if let Some(op) = opcode.binary_op() {
            let right = stack.pop().ok_or_else(|| underflow.clone())?;
            let left = stack.pop().ok_or(underflow)?;
            tree.binary(op, left, right)
        } else if opcode == Opcode::Not {
            let child = stack.pop().ok_or(underflow)?;
            tree.not(child)
        } else {
            let leaf = source.next_leaf()?;
            tree.push_leaf(leaf)
        };
        if stack.len() >= limit {
            return Err(DecodeError::StackOverflow { index, limit });
        }
        stack.push(node);
    }

    match stack.as_slice() {
        [root] => Ok(*root),
        _ => Err(DecodeError::StackNotSingleton {
            remaining: stack.len(),
        }),
    }
}
