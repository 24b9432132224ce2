// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Flat, serde-friendly form of a combination tree for tools and fixtures.
//!
//! A tree is its post-order token list, the same order the record's opcode
//! stream uses:
//!
//! ```json
//! [ { "leaf": { "name": "a", "matrix": [1.0, 0.0, "..."] } },
//!   { "leaf": { "name": "b" } },
//!   "subtract" ]
//! ```
//!
//! The list never nests, so serializing, parsing and dropping it take the
//! same stack at any tree depth. The empty tree is `[]`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::Mat4;
use crate::tree::{BinaryOp, CombTree, Leaf, Node, TRAVERSAL_STACK_INITIAL};

/// One post-order token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Token {
    /// Object reference with an optional row-major matrix.
    Leaf {
        /// Referenced object name.
        name: String,
        /// Row-major 4×4 transform; absent means identity.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        matrix: Option<[f64; 16]>,
    },
    /// Complement of the previous result.
    Not,
    /// `left ∪ right`.
    Union,
    /// `left ∩ right`.
    Intersect,
    /// `left − right`.
    Subtract,
    /// Symmetric difference.
    Xor,
}

impl Token {
    /// Shorthand for a leaf without a matrix.
    pub fn leaf(name: impl Into<String>) -> Self {
        Self::Leaf {
            name: name.into(),
            matrix: None,
        }
    }

    fn binary_op(&self) -> Option<BinaryOp> {
        match self {
            Self::Union => Some(BinaryOp::Union),
            Self::Intersect => Some(BinaryOp::Intersect),
            Self::Subtract => Some(BinaryOp::Subtract),
            Self::Xor => Some(BinaryOp::Xor),
            Self::Leaf { .. } | Self::Not => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Leaf { .. } => "leaf",
            Self::Not => "not",
            Self::Union => "union",
            Self::Intersect => "intersect",
            Self::Subtract => "subtract",
            Self::Xor => "xor",
        }
    }
}

impl From<BinaryOp> for Token {
    fn from(op: BinaryOp) -> Self {
        match op {
            BinaryOp::Union => Self::Union,
            BinaryOp::Intersect => Self::Intersect,
            BinaryOp::Subtract => Self::Subtract,
            BinaryOp::Xor => Self::Xor,
        }
    }
}

/// A token list that does not describe exactly one tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeSpecError {
    /// An operator found fewer operands than it needs.
    #[error("token {index} ({token}) is missing an operand")]
    MissingOperand {
        /// Position in the list.
        index: usize,
        /// Token name.
        token: &'static str,
    },
    /// The list left more than one result.
    #[error("token list leaves {remaining} results, expected 1")]
    NotSingleton {
        /// Results left after the last token.
        remaining: usize,
    },
}

/// Post-order token list for one tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeSpec {
    /// Tokens, children before parents.
    pub tokens: Vec<Token>,
}

impl TreeSpec {
    /// Builds the list for the reachable part of `tree`.
    pub fn from_tree(tree: &CombTree) -> Self {
        let tokens = tree
            .post_order()
            .map(|(_, node)| match node {
                Node::Leaf(leaf) => Token::Leaf {
                    name: leaf.name.clone(),
                    matrix: leaf.matrix.map(Mat4::to_array),
                },
                Node::Not(_) => Token::Not,
                Node::Binary { op, .. } => Token::from(*op),
            })
            .collect();
        Self { tokens }
    }

    /// Builds the arena form. An empty list is the empty tree.
    pub fn to_tree(&self) -> Result<CombTree, TreeSpecError> {
        let mut tree = CombTree::new();
        let mut stack = Vec::with_capacity(TRAVERSAL_STACK_INITIAL);
        for (index, token) in self.tokens.iter().enumerate() {
            let missing = TreeSpecError::MissingOperand {
                index,
                token: token.name(),
            };
            let id = match token {
                Token::Leaf { name, matrix } => {
                    tree.push_leaf(Leaf::new(name.clone(), matrix.map(Mat4::new)))
                }
                Token::Not => {
                    let child = stack.pop().ok_or(missing)?;
                    tree.not(child)
                }
                _ => {
                    let right = stack.pop().ok_or_else(|| missing.clone())?;
                    let left = stack.pop().ok_or_else(|| missing.clone())?;
                    let op = token.binary_op().ok_or(missing)?;
                    tree.binary(op, left, right)
                }
            };
            stack.push(id);
        }
        if stack.len() > 1 {
            return Err(TreeSpecError::NotSingleton {
                remaining: stack.len(),
            });
        }
        tree.set_root(stack.pop());
        Ok(tree)
    }
}

impl From<&CombTree> for TreeSpec {
    fn from(tree: &CombTree) -> Self {
        Self::from_tree(tree)
    }
}
