// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use comb_codec::math::Mat4;
use comb_codec::{decode, encode, read_header, BinaryOp, CombTree, DecodeError};

/// `a[M] - b` with one matrix, W8 integers.
fn subtract_record() -> Vec<u8> {
    let mut t = CombTree::new();
    let a = t.leaf("a", Some(Mat4::translation(1.0, 2.0, 3.0)));
    let b = t.leaf("b", None);
    let root = t.binary(BinaryOp::Subtract, a, b);
    t.set_root(root);
    encode(&t).unwrap().to_vec()
}

const LEAF_REGION: usize = 6 + 128;
const OPCODE_REGION: usize = LEAF_REGION + 6;

fn with_opcodes(ops: [u8; 3]) -> Vec<u8> {
    let mut bytes = subtract_record();
    bytes[OPCODE_REGION..].copy_from_slice(&ops);
    bytes
}

#[test]
fn fixture_layout_is_as_expected() {
    let bytes = subtract_record();
    let view = read_header(&bytes).unwrap();
    assert_eq!(view.leaf_offset, LEAF_REGION);
    assert_eq!(view.opcode_offset, OPCODE_REGION);
    assert_eq!(bytes.len(), OPCODE_REGION + 3);
    assert!(decode(&bytes).is_ok());
}

#[test]
fn every_strict_prefix_is_rejected() {
    let bytes = subtract_record();
    for len in 0..bytes.len() {
        assert!(
            decode(&bytes[..len]).is_err(),
            "prefix of {len} bytes decoded"
        );
    }
}

#[test]
fn trailing_byte_is_rejected() {
    let mut bytes = subtract_record();
    bytes.push(0);
    assert_eq!(
        decode(&bytes).unwrap_err(),
        DecodeError::TrailingBytes { remaining: 1 }
    );
}

#[test]
fn unknown_width_code() {
    assert_eq!(
        decode(&[4, 0, 0, 0, 0, 0]).unwrap_err(),
        DecodeError::UnknownWidthCode { code: 4 }
    );
}

#[test]
fn leaf_region_cut_short_inside_an_entry() {
    // Second leaf's index byte missing; the header agrees with the short region.
    let bytes = [0, 0, 2, 5, 0, 2, b'a', 0, 0xff, b'b', 0];
    assert_eq!(
        decode(&bytes).unwrap_err(),
        DecodeError::Truncated {
            what: "matrix index",
            offset: 11,
            needed: 1,
            available: 0,
        }
    );
}

#[test]
fn matrix_index_past_the_table() {
    let mut bytes = subtract_record();
    bytes[LEAF_REGION + 2] = 1;
    assert_eq!(
        decode(&bytes).unwrap_err(),
        DecodeError::MatrixIndexOutOfRange {
            index: 1,
            n_matrices: 1,
            offset: LEAF_REGION + 2,
        }
    );
}

#[test]
fn negative_index_other_than_sentinel() {
    let mut bytes = subtract_record();
    bytes[LEAF_REGION + 5] = 0xfe;
    assert_eq!(
        decode(&bytes).unwrap_err(),
        DecodeError::MatrixIndexOutOfRange {
            index: -2,
            n_matrices: 1,
            offset: LEAF_REGION + 5,
        }
    );
}

#[test]
fn unknown_opcodes() {
    for bad in [0u8, 7, 0x80, 0xff] {
        assert_eq!(
            decode(&with_opcodes([1, 1, bad])).unwrap_err(),
            DecodeError::UnknownOpcode {
                opcode: bad,
                index: 2
            }
        );
    }
}

#[test]
fn stack_depth_field_below_actual_need() {
    let mut bytes = subtract_record();
    // max_stack_depth is the fifth header integer.
    bytes[5] = 1;
    assert_eq!(
        decode(&bytes).unwrap_err(),
        DecodeError::StackOverflow { index: 1, limit: 1 }
    );
}

#[test]
fn operator_without_operands() {
    assert_eq!(
        decode(&with_opcodes([1, 4, 1])).unwrap_err(),
        DecodeError::StackUnderflow {
            index: 1,
            opcode: "SUBTRACT"
        }
    );
    assert_eq!(
        decode(&with_opcodes([6, 1, 1])).unwrap_err(),
        DecodeError::StackUnderflow {
            index: 0,
            opcode: "NOT"
        }
    );
}

#[test]
fn stream_must_reduce_to_one_root() {
    assert_eq!(
        decode(&with_opcodes([1, 1, 6])).unwrap_err(),
        DecodeError::StackNotSingleton { remaining: 2 }
    );
}

#[test]
fn more_leaf_tokens_than_leaves() {
    assert_eq!(
        decode(&with_opcodes([1, 1, 1])).unwrap_err(),
        DecodeError::LeafCountMismatch {
            expected: 2,
            actual: 3
        }
    );
}

#[test]
fn fewer_leaf_tokens_than_leaves() {
    assert_eq!(
        decode(&with_opcodes([1, 6, 6])).unwrap_err(),
        DecodeError::LeafCountMismatch {
            expected: 2,
            actual: 1
        }
    );
}

#[test]
fn leaf_region_longer_than_its_entries() {
    let bytes = [0, 0, 1, 6, 0, 1, b'a', 0, 0xff, b'b', 0, 0xff];
    assert_eq!(
        decode(&bytes).unwrap_err(),
        DecodeError::LeafBytesRemaining { remaining: 3 }
    );
}

#[test]
fn names_must_be_terminated_utf8() {
    assert_eq!(
        decode(&[0, 0, 1, 3, 0, 1, b'a', b'b', b'c']).unwrap_err(),
        DecodeError::UnterminatedName { offset: 6 }
    );
    assert_eq!(
        decode(&[0, 0, 1, 3, 0, 1, 0xff, 0, 0xff]).unwrap_err(),
        DecodeError::InvalidName { offset: 6 }
    );
}

#[test]
fn header_counts_beyond_the_buffer() {
    assert_eq!(
        decode(&[0, 200, 0, 0, 0, 0]).unwrap_err(),
        DecodeError::RegionTooLarge {
            what: "matrix region",
            offset: 6,
            length: 200 * 128,
            available: 0,
        }
    );
    assert_eq!(
        decode(&[0, 0, 50, 3, 0, 1, b'a', 0, 0xff]).unwrap_err(),
        DecodeError::RegionTooLarge {
            what: "leaf entries",
            offset: 6,
            length: 100,
            available: 3,
        }
    );
}

#[test]
fn saturating_region_length_on_wide_header() {
    let mut bytes = vec![3u8];
    bytes.extend_from_slice(&u64::MAX.to_be_bytes());
    bytes.extend_from_slice(&[0u8; 32]);
    assert_eq!(
        decode(&bytes).unwrap_err(),
        DecodeError::RegionTooLarge {
            what: "matrix region",
            offset: 41,
            length: u64::MAX,
            available: 0,
        }
    );
}
