// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use comb_codec::math::Mat4;
use comb_codec::wire::{f64_to_wire, MAT4_WIRE_LEN};
use comb_codec::{
    count, decode, decode_with, encode, read_header, BinaryOp, CombTree, DecodeError,
    DecodeOptions, Node, DEFAULT_STACK_CEILING,
};

fn placed() -> Mat4 {
    Mat4::translation(10.0, -4.0, 2.5).multiply(&Mat4::rotation_z(0.25))
}

#[test]
fn pure_union_pair_drops_opcode_stream() {
    let mut t = CombTree::new();
    let a = t.leaf("a", None);
    let b = t.leaf("b", None);
    let root = t.union(a, b);
    t.set_root(root);

    let bytes = encode(&t).unwrap();
    let view = read_header(&bytes).unwrap();
    assert_eq!(view.header.n_matrices, 0);
    assert_eq!(view.header.n_leaves, 2);
    assert_eq!(view.header.rpn_len, 0);
    assert_eq!(
        bytes.as_ref(),
        &[0, 0, 2, 6, 0, 2, b'a', 0, 0xff, b'b', 0, 0xff]
    );

    let back = decode(&bytes).unwrap();
    let root = back.root().unwrap();
    assert!(matches!(
        back.node(root),
        Node::Binary {
            op: BinaryOp::Union,
            ..
        }
    ));
    let mut names: Vec<_> = back.leaves().map(|l| l.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["a", "b"]);
    assert!(back.leaves().all(|l| l.matrix.is_none()));
}

#[test]
fn subtract_with_matrix_is_exact() {
    let m = placed();
    let mut t = CombTree::new();
    let a = t.leaf("a", Some(m));
    let b = t.leaf("b", None);
    let root = t.binary(BinaryOp::Subtract, a, b);
    t.set_root(root);

    let bytes = encode(&t).unwrap();
    let view = read_header(&bytes).unwrap();
    assert_eq!(view.header.n_matrices, 1);
    assert_eq!(view.header.rpn_len, 3);
    // LEAF, LEAF, SUBTRACT
    assert_eq!(view.opcodes, &[1, 1, 4]);
    assert_eq!(view.leaves, &[b'a', 0, 0, b'b', 0, 0xff]);
    assert_eq!(bytes.len(), 6 + MAT4_WIRE_LEN + 6 + 3);
    // Row-major: element 3 is the x translation.
    assert_eq!(&view.matrices[24..32], &f64_to_wire(10.0));

    let back = decode(&bytes).unwrap();
    assert!(back.shape_eq(&t));
    assert_eq!(back.to_string(), "a[M] - b");
    assert_eq!(back.leaves().next().and_then(|l| l.matrix), Some(m));
}

#[test]
fn empty_and_single_leaf_trees() {
    let empty = decode(&encode(&CombTree::new()).unwrap()).unwrap();
    assert!(empty.is_empty());

    let mut t = CombTree::new();
    let only = t.leaf("solo.s", Some(Mat4::scale(1.0, 2.0, 3.0)));
    t.set_root(only);
    let back = decode(&encode(&t).unwrap()).unwrap();
    assert!(back.shape_eq(&t));
}

#[test]
fn stored_identity_is_written_as_no_matrix() {
    let mut t = CombTree::new();
    let a = t.leaf("a", Some(Mat4::identity()));
    let b = t.leaf("b", None);
    let root = t.binary(BinaryOp::Intersect, a, b);
    t.set_root(root);
    assert_eq!(count(&t).n_mat, 0);
    let back = decode(&encode(&t).unwrap()).unwrap();
    assert!(back.leaves().all(|l| l.matrix.is_none()));
}

#[test]
fn mixed_tree_keeps_operand_order() {
    // ((a + b) - !c) ^ (d u e)
    let mut t = CombTree::new();
    let a = t.leaf("a", None);
    let b = t.leaf("b", Some(Mat4::translation(1.0, 0.0, 0.0)));
    let c = t.leaf("c", None);
    let d = t.leaf("d", Some(Mat4::scale(2.0, 2.0, 2.0)));
    let e = t.leaf("e", None);
    let ab = t.binary(BinaryOp::Intersect, a, b);
    let nc = t.not(c);
    let left = t.binary(BinaryOp::Subtract, ab, nc);
    let de = t.union(d, e);
    let root = t.binary(BinaryOp::Xor, left, de);
    t.set_root(root);

    let back = decode(&encode(&t).unwrap()).unwrap();
    assert!(back.shape_eq(&t));
    assert_eq!(back.to_string(), "((a + b[M]) - !c) ^ (d[M] u e)");
}

#[test]
fn large_union_rebuilds_balanced() {
    let mut t = CombTree::new();
    let mut acc = t.leaf("s0", None);
    for i in 1..300 {
        let next = t.leaf(format!("s{i}"), None);
        acc = t.union(acc, next);
    }
    t.set_root(acc);
    assert_eq!(t.height(), 300);

    let bytes = encode(&t).unwrap();
    // 300 leaves and 300 * 6 leaf bytes force 16-bit integers.
    assert_eq!(bytes[0], 1);
    let back = decode(&bytes).unwrap();
    assert!(back.same_leaves(&t));
    assert_eq!(back.height(), 10);
}

#[test]
fn deep_complement_chain_round_trips() {
    let mut t = CombTree::new();
    let mut acc = t.leaf("core", None);
    for _ in 0..100_000 {
        acc = t.not(acc);
    }
    t.set_root(acc);
    let back = decode(&encode(&t).unwrap()).unwrap();
    assert!(back.shape_eq(&t));
}

#[test]
fn deep_left_chain_round_trips() {
    let mut t = CombTree::new();
    let mut acc = t.leaf("base", None);
    for i in 0..50_000 {
        let cut = t.leaf(format!("cut{i}"), None);
        acc = t.binary(BinaryOp::Subtract, acc, cut);
    }
    t.set_root(acc);
    assert_eq!(count(&t).max_stack_depth, 2);
    let back = decode(&encode(&t).unwrap()).unwrap();
    assert!(back.shape_eq(&t));
}

#[test]
fn right_chain_past_ceiling_needs_a_larger_ceiling() {
    let depth = DEFAULT_STACK_CEILING + 10;
    let mut t = CombTree::new();
    let mut acc = t.leaf("r", None);
    for i in 0..depth {
        let next = t.leaf(format!("l{i}"), None);
        acc = t.binary(BinaryOp::Intersect, next, acc);
    }
    t.set_root(acc);
    let bytes = encode(&t).unwrap();

    let err = decode(&bytes).unwrap_err();
    assert_eq!(
        err,
        DecodeError::StackOverflow {
            index: DEFAULT_STACK_CEILING,
            limit: DEFAULT_STACK_CEILING
        }
    );

    let wide = DecodeOptions {
        stack_ceiling: depth + 1,
    };
    let back = decode_with(&bytes, &wide).unwrap();
    assert!(back.shape_eq(&t));
}
