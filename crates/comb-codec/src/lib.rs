// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! comb-codec: compact on-disk form for Boolean combination trees.
//!
//! A combination is a named tree of Boolean operators (`union`, `intersect`,
//! `subtract`, `xor`, `not`) over references to other objects, each
//! reference optionally placed by a 4×4 matrix. This crate counts,
//! serializes and rebuilds those trees, and composes placements into them.
//!
//! # Record strategies
//!
//! - **Pure-union trees** store only their leaves. Decoding rebuilds a
//!   balanced union over the same leaves; shape is not preserved, meaning is.
//! - **Everything else** also stores a post-order opcode stream, and
//!   decoding reproduces the tree exactly with a bounded stack machine.
//!
//! # Example
//! ```
//! use comb_codec::{decode, encode, math::Mat4, BinaryOp, CombTree};
//!
//! let mut tree = CombTree::new();
//! let a = tree.leaf("a", Some(Mat4::translation(0.0, 0.0, 5.0)));
//! let b = tree.leaf("b", None);
//! let root = tree.binary(BinaryOp::Subtract, a, b);
//! tree.set_root(root);
//!
//! let bytes = encode(&tree).unwrap();
//! let back = decode(&bytes).unwrap();
//! assert!(back.shape_eq(&tree));
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::redundant_pub_crate,
    clippy::many_single_char_names,
    clippy::module_name_repetitions,
    clippy::use_self
)]

/// Row-major `f64` matrices and comparison tolerances.
pub mod math;

mod balance;
mod count;
mod decode;
mod encode;
mod error;
mod format;
#[cfg(feature = "serde")]
mod postfix;
mod transform;
mod tree;
/// Network-order doubles and bounds-checked region readers/writers.
pub mod wire;
/// Width-coded integers.
pub mod width;

pub use balance::balance_union;
pub use count::{count, Counts, INDEX_UPPER_BOUND};
pub use decode::{
    decode, decode_with, read_header, DecodeOptions, RecordView, DEFAULT_STACK_CEILING,
};
pub use encode::{encode, encoded_len, Layout};
pub use error::{DecodeError, EncodeError};
pub use format::{Opcode, RecordHeader, HEADER_FIELDS, NO_MATRIX};
#[cfg(feature = "serde")]
pub use postfix::{Token, TreeSpec, TreeSpecError};
pub use transform::{apply_transform, apply_transform_with};
pub use tree::{BinaryOp, CombTree, Leaf, Node, NodeId, PostOrder};
