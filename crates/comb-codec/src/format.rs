// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Record layout shared by the writer and the reader.
//!
//! ```text
//! u8              width code
//! varint(w) x 5   n_matrices, n_leaves, leaf_bytes, rpn_len, max_stack_depth
//! matrices        n_matrices x 16 big-endian f64, row-major
//! leaves          n_leaves x (name NUL, signed varint(w) matrix index, -1 = none)
//! opcodes         rpn_len bytes, post-order; absent for pure-union trees
//! ```

use crate::error::DecodeError;
use crate::tree::BinaryOp;
use crate::wire::{Reader, SliceWriter, MAT4_WIRE_LEN};
use crate::width::WidthCode;

/// Matrix index meaning "no stored matrix".
pub const NO_MATRIX: i64 = -1;

/// Number of width-coded integers in the header.
pub const HEADER_FIELDS: usize = 5;

/// One byte per node in the opcode region.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Pull the next leaf from the leaf region.
    Leaf = 1,
    /// Pop right, pop left, push union.
    Union = 2,
    /// Pop right, pop left, push intersection.
    Intersect = 3,
    /// Pop right, pop left, push difference.
    Subtract = 4,
    /// Pop right, pop left, push symmetric difference.
    Xor = 5,
    /// Pop one, push complement.
    Not = 6,
}

impl Opcode {
    /// Parses an opcode byte.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Leaf),
            2 => Some(Self::Union),
            3 => Some(Self::Intersect),
            4 => Some(Self::Subtract),
            5 => Some(Self::Xor),
            6 => Some(Self::Not),
            _ => None,
        }
    }

    /// The operator a binary token builds; `None` for `LEAF` and `NOT`.
    pub const fn binary_op(self) -> Option<BinaryOp> {
        match self {
            Self::Union => Some(BinaryOp::Union),
            Self::Intersect => Some(BinaryOp::Intersect),
            Self::Subtract => Some(BinaryOp::Subtract),
            Self::Xor => Some(BinaryOp::Xor),
            Self::Leaf | Self::Not => None,
        }
    }

    /// Token name for diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Leaf => "LEAF",
            Self::Union => "UNION",
            Self::Intersect => "INTERSECT",
            Self::Subtract => "SUBTRACT",
            Self::Xor => "XOR",
            Self::Not => "NOT",
        }
    }
}

impl From<BinaryOp> for Opcode {
    fn from(op: BinaryOp) -> Self {
        match op {
            BinaryOp::Union => Self::Union,
            BinaryOp::Intersect => Self::Intersect,
            BinaryOp::Subtract => Self::Subtract,
            BinaryOp::Xor => Self::Xor,
        }
    }
}

/// Fixed-position fields at the start of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RecordHeader {
    /// Width of every varint in the record.
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_width"))]
    pub width: WidthCode,
    /// Matrices in the matrix region.
    pub n_matrices: u64,
    /// Leaves in the leaf region.
    pub n_leaves: u64,
    /// Exact size of the leaf region.
    pub leaf_bytes: u64,
    /// Size of the opcode region; zero for pure-union trees.
    pub rpn_len: u64,
    /// Stack slots the opcode stream needs.
    pub max_stack_depth: u64,
}

#[cfg(feature = "serde")]
fn serialize_width<S: serde::Serializer>(width: &WidthCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u8(width.code())
}

impl RecordHeader {
    /// Encoded header size.
    pub const fn encoded_len(width: WidthCode) -> usize {
        1 + HEADER_FIELDS * width.byte_len()
    }

    /// Writes the header into its region.
    pub fn write(&self, out: &mut SliceWriter<'_>) {
        out.put_u8(self.width.code());
        for value in [
            self.n_matrices,
            self.n_leaves,
            self.leaf_bytes,
            self.rpn_len,
            self.max_stack_depth,
        ] {
            out.put_unsigned(value, self.width);
        }
    }

    /// Reads the header from the front of a record.
    pub fn read(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let code = reader.read_u8("width code")?;
        let width = WidthCode::from_byte(code).ok_or(DecodeError::UnknownWidthCode { code })?;
        Ok(Self {
            width,
            n_matrices: reader.read_unsigned(width, "n_matrices")?,
            n_leaves: reader.read_unsigned(width, "n_leaves")?,
            leaf_bytes: reader.read_unsigned(width, "leaf_bytes")?,
            rpn_len: reader.read_unsigned(width, "rpn_len")?,
            max_stack_depth: reader.read_unsigned(width, "max_stack_depth")?,
        })
    }

    /// Size of the matrix region, saturating on overflow.
    pub fn matrix_region_len(&self) -> u64 {
        self.n_matrices.saturating_mul(MAT4_WIRE_LEN as u64)
    }

    /// Total record size this header implies, saturating on overflow.
    pub fn record_len(&self) -> u64 {
        (Self::encoded_len(self.width) as u64)
            .saturating_add(self.matrix_region_len())
            .saturating_add(self.leaf_bytes)
            .saturating_add(self.rpn_len)
    }
}
