// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Arena-backed combination trees.
//!
//! A [`CombTree`] owns its nodes in a flat `Vec`; children are referenced by
//! [`NodeId`]. Every walk over a tree is iterative, driven by an explicit
//! stack, so depth is bounded by memory rather than by the native call stack.

use std::collections::TryReserveError;
use std::fmt;

use crate::math::Mat4;

/// Initial capacity of auxiliary traversal stacks. They grow by doubling.
pub(crate) const TRAVERSAL_STACK_INITIAL: usize = 128;

/// Index of a node inside its owning [`CombTree`].
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Binary Boolean operators.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `a ∪ b`.
    Union,
    /// `a ∩ b`.
    Intersect,
    /// `a − b`.
    Subtract,
    /// Symmetric difference.
    Xor,
}

impl BinaryOp {
    /// Single-character operator used in infix renderings.
    pub const fn symbol(self) -> char {
        match self {
            Self::Union => 'u',
            Self::Intersect => '+',
            Self::Subtract => '-',
            Self::Xor => '^',
        }
    }

    /// Lower-case name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::Intersect => "intersect",
            Self::Subtract => "subtract",
            Self::Xor => "xor",
        }
    }
}

/// Reference to another database object, optionally placed by a matrix.
///
/// `matrix == None` means the identity placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    /// Referenced object name.
    pub name: String,
    /// Local transform; `None` is the identity.
    pub matrix: Option<Mat4>,
}

impl Leaf {
    /// Creates a leaf.
    pub fn new(name: impl Into<String>, matrix: Option<Mat4>) -> Self {
        Self {
            name: name.into(),
            matrix,
        }
    }

    /// The matrix the record writer would store for this leaf.
    ///
    /// A stored matrix that is exactly the identity is treated as absent.
    pub fn stored_matrix(&self) -> Option<&Mat4> {
        self.matrix.as_ref().filter(|m| !m.is_identity())
    }
}

/// One arena slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Terminal reference.
    Leaf(Leaf),
    /// Complement of the child.
    Not(NodeId),
    /// Binary Boolean operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: NodeId,
        /// Right operand.
        right: NodeId,
    },
}

/// A Boolean combination tree.
///
/// Build one bottom-up with [`leaf`](Self::leaf), [`not`](Self::not) and
/// [`binary`](Self::binary), then call [`set_root`](Self::set_root). Each
/// node is expected to appear as a child at most once; the walks treat the
/// structure as a tree, not a DAG.
///
/// ```
/// use comb_codec::{BinaryOp, CombTree};
/// let mut tree = CombTree::new();
/// let a = tree.leaf("a", None);
/// let b = tree.leaf("b", None);
/// let root = tree.binary(BinaryOp::Subtract, a, b);
/// tree.set_root(root);
/// assert_eq!(tree.to_string(), "a - b");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CombTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl CombTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty tree with arena room for `capacity` nodes.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        let mut nodes = Vec::new();
        nodes.try_reserve_exact(capacity)?;
        Ok(Self { nodes, root: None })
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Adds a leaf node.
    pub fn leaf(&mut self, name: impl Into<String>, matrix: Option<Mat4>) -> NodeId {
        self.push_leaf(Leaf::new(name, matrix))
    }

    /// Adds an already-built leaf.
    pub fn push_leaf(&mut self, leaf: Leaf) -> NodeId {
        self.push(Node::Leaf(leaf))
    }

    /// Adds a complement node.
    pub fn not(&mut self, child: NodeId) -> NodeId {
        self.push(Node::Not(child))
    }

    /// Adds a binary operator node.
    pub fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        self.push(Node::Binary { op, left, right })
    }

    /// Adds `left ∪ right`.
    pub fn union(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.binary(BinaryOp::Union, left, right)
    }

    /// Sets (or clears) the root.
    pub fn set_root(&mut self, root: impl Into<Option<NodeId>>) {
        self.root = root.into();
    }

    /// Root node, `None` for the empty tree.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// True when the tree has no root.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of arena slots, reachable or not.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Borrows a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Mutably borrows a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this tree.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn is_binary(&self, id: NodeId) -> bool {
        matches!(self.node(id), Node::Binary { .. })
    }

    /// Post-order walk over the nodes reachable from the root.
    pub fn post_order(&self) -> PostOrder<'_> {
        PostOrder::new(self)
    }

    /// Reachable leaves in post-order.
    pub fn leaves(&self) -> impl Iterator<Item = &Leaf> + '_ {
        self.post_order().filter_map(|(_, node)| match node {
            Node::Leaf(leaf) => Some(leaf),
            _ => None,
        })
    }

    /// Number of reachable leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    /// Longest root-to-leaf path, counted in nodes. Zero for the empty tree.
    pub fn height(&self) -> usize {
        let mut heights: Vec<usize> = Vec::with_capacity(TRAVERSAL_STACK_INITIAL);
        for (_, node) in self.post_order() {
            let h = match node {
                Node::Leaf(_) => 1,
                Node::Not(_) => heights.pop().unwrap_or(0) + 1,
                Node::Binary { .. } => {
                    let r = heights.pop().unwrap_or(0);
                    let l = heights.pop().unwrap_or(0);
                    l.max(r) + 1
                }
            };
            heights.push(h);
        }
        heights.pop().unwrap_or(0)
    }

    /// True when every reachable operator is a union.
    pub fn is_pure_union(&self) -> bool {
        self.post_order().all(|(_, node)| {
            matches!(
                node,
                Node::Leaf(_)
                    | Node::Binary {
                        op: BinaryOp::Union,
                        ..
                    }
            )
        })
    }

    /// Structural equality: same operators in the same left/right order over
    /// equal leaves. Arena layout is irrelevant.
    ///
    /// A post-order token sequence with known arities determines the tree, so
    /// comparing the two walks element by element is sufficient.
    pub fn shape_eq(&self, other: &Self) -> bool {
        let mut a = self.post_order();
        let mut b = other.post_order();
        loop {
            match (a.next(), b.next()) {
                (None, None) => return true,
                (Some((_, x)), Some((_, y))) => {
                    let same = match (x, y) {
                        (Node::Leaf(l), Node::Leaf(r)) => l == r,
                        (Node::Not(_), Node::Not(_)) => true,
                        (Node::Binary { op: l, .. }, Node::Binary { op: r, .. }) => l == r,
                        _ => false,
                    };
                    if !same {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }

    /// Multiset equality of `(name, matrix)` leaves, ignoring shape.
    ///
    /// Matrices compare bit-exactly, with an exact identity equal to `None`.
    pub fn same_leaves(&self, other: &Self) -> bool {
        fn keyed(tree: &CombTree) -> Vec<(&str, Option<[u64; 16]>)> {
            let mut keys: Vec<_> = tree
                .leaves()
                .map(|leaf| {
                    let bits = leaf
                        .stored_matrix()
                        .map(|m| m.to_array().map(f64::to_bits));
                    (leaf.name.as_str(), bits)
                })
                .collect();
            keys.sort_unstable();
            keys
        }
        keyed(self) == keyed(other)
    }
}

/// Iterative post-order walk; see [`CombTree::post_order`].
#[derive(Debug)]
pub struct PostOrder<'a> {
    tree: &'a CombTree,
    stack: Vec<(NodeId, bool)>,
}

impl<'a> PostOrder<'a> {
    fn new(tree: &'a CombTree) -> Self {
        let mut stack = Vec::with_capacity(TRAVERSAL_STACK_INITIAL);
        if let Some(root) = tree.root {
            stack.push((root, false));
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for PostOrder<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (id, expanded) = self.stack.pop()?;
            let node = self.tree.node(id);
            if expanded {
                return Some((id, node));
            }
            self.stack.push((id, true));
            match node {
                Node::Leaf(_) => {}
                Node::Not(child) => self.stack.push((*child, false)),
                Node::Binary { left, right, .. } => {
                    self.stack.push((*right, false));
                    self.stack.push((*left, false));
                }
            }
        }
    }
}

/// Infix rendering, e.g. `(a u b) - !c`. Placed leaves are marked `name[M]`.
impl fmt::Display for CombTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(root) = self.root else {
            return f.write_str("<empty>");
        };
        // Written straight to `f` in one pass; binary operands get parentheses.
        let mut steps = Vec::with_capacity(TRAVERSAL_STACK_INITIAL);
        steps.push(Render::Node(root, false));
        while let Some(step) = steps.pop() {
            match step {
                Render::Text(text) => f.write_str(text)?,
                Render::Op(op) => write!(f, " {} ", op.symbol())?,
                Render::Node(id, wrapped) => {
                    if wrapped {
                        f.write_str("(")?;
                        steps.push(Render::Text(")"));
                    }
                    match self.node(id) {
                        Node::Leaf(leaf) => {
                            f.write_str(&leaf.name)?;
                            if leaf.stored_matrix().is_some() {
                                f.write_str("[M]")?;
                            }
                        }
                        Node::Not(child) => {
                            f.write_str("!")?;
                            steps.push(Render::Node(*child, self.is_binary(*child)));
                        }
                        Node::Binary { op, left, right } => {
                            steps.push(Render::Node(*right, self.is_binary(*right)));
                            steps.push(Render::Op(*op));
                            steps.push(Render::Node(*left, self.is_binary(*left)));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

enum Render {
    Node(NodeId, bool),
    Op(BinaryOp),
    Text(&'static str),
}
