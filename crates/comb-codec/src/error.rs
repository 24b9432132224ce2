// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types for record encoding and decoding.

use thiserror::Error;

/// Errors that can occur when decoding a combination record.
///
/// Every variant is produced by an explicit bounds or range check performed
/// before the offending bytes are used; none of them indicates a bug in the
/// decoder. Offsets are byte offsets from the start of the record and
/// `index` fields count opcodes from the start of the opcode region.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A read would run past the end of the record.
    #[error("truncated {what}: need {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        /// What was being read.
        what: &'static str,
        /// Byte offset of the read.
        offset: usize,
        /// Bytes the read needed.
        needed: usize,
        /// Bytes left in the record.
        available: usize,
    },

    /// The width-code byte is not one of the four known codes.
    #[error("unknown width code {code}")]
    UnknownWidthCode {
        /// The byte found at offset 0.
        code: u8,
    },

    /// A header count or region does not fit the bytes present.
    #[error("{what} at offset {offset} claims {length} bytes, only {available} available")]
    RegionTooLarge {
        /// Region name.
        what: &'static str,
        /// Byte offset where the region starts.
        offset: usize,
        /// Length the header implies (saturated on overflow).
        length: u64,
        /// Bytes left in the record.
        available: usize,
    },

    /// An opcode byte is not a known token.
    #[error("unknown opcode {opcode:#04x} at opcode index {index}")]
    UnknownOpcode {
        /// The offending byte.
        opcode: u8,
        /// Position in the opcode region.
        index: usize,
    },

    /// A push would exceed the stack bound.
    #[error("stack overflow at opcode index {index}: limit {limit}")]
    StackOverflow {
        /// Position in the opcode region.
        index: usize,
        /// `min(max_stack_depth, stack_ceiling)`.
        limit: usize,
    },

    /// An operator found fewer operands than it needs.
    #[error("stack underflow at opcode index {index} ({opcode})")]
    StackUnderflow {
        /// Position in the opcode region.
        index: usize,
        /// Name of the operator token.
        opcode: &'static str,
    },

    /// The opcode stream did not reduce to a single root.
    #[error("opcode stream left {remaining} nodes on the stack, expected 1")]
    StackNotSingleton {
        /// Stack size after the last opcode.
        remaining: usize,
    },

    /// A leaf references a matrix slot that does not exist.
    #[error("matrix index {index} at offset {offset} out of range for {n_matrices} matrices")]
    MatrixIndexOutOfRange {
        /// The decoded signed index.
        index: i64,
        /// Number of matrices in the record.
        n_matrices: usize,
        /// Byte offset of the index.
        offset: usize,
    },

    /// A leaf name has no NUL terminator inside the leaf region.
    #[error("unterminated leaf name at offset {offset}")]
    UnterminatedName {
        /// Byte offset where the name starts.
        offset: usize,
    },

    /// A leaf name is not valid UTF-8.
    #[error("leaf name at offset {offset} is not valid utf-8")]
    InvalidName {
        /// Byte offset where the name starts.
        offset: usize,
    },

    /// The number of leaves read differs from the header count.
    #[error("header declares {expected} leaves, record holds {actual}")]
    LeafCountMismatch {
        /// `n_leaves` from the header.
        expected: usize,
        /// Leaves actually consumed (or demanded by the opcode stream).
        actual: usize,
    },

    /// Bytes remain in the leaf region after every leaf was read.
    #[error("{remaining} unread bytes left in the leaf region")]
    LeafBytesRemaining {
        /// Unconsumed leaf-region bytes.
        remaining: usize,
    },

    /// Bytes follow the last region.
    #[error("{remaining} trailing bytes after the record")]
    TrailingBytes {
        /// Bytes past the end of the opcode region.
        remaining: usize,
    },

    /// Reserving space for the decoded tree failed.
    #[error("out of memory reserving {requested} elements")]
    OutOfMemory {
        /// Elements requested.
        requested: usize,
    },
}

/// Errors that can occur when encoding a combination record.
///
/// Disagreement between the counting and writing passes is not represented
/// here: that indicates a bug and panics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The output buffer could not be allocated.
    #[error("out of memory allocating {requested} bytes")]
    OutOfMemory {
        /// Bytes requested.
        requested: usize,
    },

    /// A size computation overflowed `usize`.
    #[error("record too large: {what} overflows")]
    TooLarge {
        /// The quantity that overflowed.
        what: &'static str,
    },

    /// A leaf name cannot be stored NUL-terminated.
    #[error("leaf name {name:?} contains a NUL byte")]
    InvalidName {
        /// The rejected name.
        name: String,
    },
}
