//! Arena-backed token tree.
//!
//! ## Ownership
//!
//! The tree owns every node in a flat `Vec`. Parents and children refer
//! to each other through `NodeId` indices, so there are no reference
//! cycles and handing a `NodeId` to another component never extends the
//! lifetime of anything. A `NodeId` is only meaningful for the tree that
//! produced it.
//!
//! Traversals use explicit stacks; synthesized expressions can nest far
//! deeper than is comfortable for recursion.

use std::fmt;

use crate::{Token, TreeError, TreeResult};

/// Handle to a node inside a [`TokenTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Group,
    Token(Token),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// A tree of token groups with tokens at the leaves.
///
/// The root is always a group.
#[derive(Debug, Clone)]
pub struct TokenTree {
    nodes: Vec<Node>,
}

impl TokenTree {
    /// Creates a tree holding only an empty root group.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Group,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, groups included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the root group has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Appends an empty group under `parent`.
    pub fn add_group(&mut self, parent: NodeId) -> TreeResult<NodeId> {
        self.push(parent, NodeKind::Group)
    }

    /// Appends a token under `parent`.
    pub fn add_token(&mut self, parent: NodeId, token: Token) -> TreeResult<NodeId> {
        self.push(parent, NodeKind::Token(token))
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> TreeResult<NodeId> {
        match self.nodes.get(parent.index()) {
            None => return Err(TreeError::UnknownNode(parent)),
            Some(node) if !matches!(node.kind, NodeKind::Group) => {
                return Err(TreeError::NotAGroup(parent));
            }
            Some(_) => {}
        }

        let id = u32::try_from(self.nodes.len())
            .map(NodeId)
            .map_err(|_| TreeError::TooManyNodes)?;
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent.index()].children.push(id);
        Ok(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index()).and_then(|n| n.parent)
    }

    /// Ordered children of a group; empty for tokens and unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.index())
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_group(&self, id: NodeId) -> bool {
        matches!(
            self.nodes.get(id.index()).map(|n| &n.kind),
            Some(NodeKind::Group)
        )
    }

    pub fn token(&self, id: NodeId) -> Option<&Token> {
        match &self.nodes.get(id.index())?.kind {
            NodeKind::Token(token) => Some(token),
            NodeKind::Group => None,
        }
    }

    pub fn token_mut(&mut self, id: NodeId) -> Option<&mut Token> {
        match &mut self.nodes.get_mut(id.index())?.kind {
            NodeKind::Token(token) => Some(token),
            NodeKind::Group => None,
        }
    }

    /// Iterates the tokens under `id` in document order.
    ///
    /// A token id yields just itself.
    pub fn tokens(&self, id: NodeId) -> Tokens<'_> {
        let stack = if self.contains(id) { vec![id] } else { Vec::new() };
        Tokens { tree: self, stack }
    }

    /// Collects the tokens under `id` in document order.
    pub fn flatten(&self, id: NodeId) -> Vec<NodeId> {
        self.tokens(id).collect()
    }

    /// Iterates the strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Concatenated text of every token in the tree.
    pub fn text(&self) -> String {
        self.tokens(self.root())
            .filter_map(|id| self.token(id))
            .map(Token::text)
            .collect()
    }
}

impl Default for TokenTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Document-order token iterator. See [`TokenTree::tokens`].
pub struct Tokens<'a> {
    tree: &'a TokenTree,
    stack: Vec<NodeId>,
}

impl Iterator for Tokens<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            let node = &self.tree.nodes[id.index()];
            match node.kind {
                NodeKind::Token(_) => return Some(id),
                // Reverse so the leftmost child is popped first
                NodeKind::Group => self.stack.extend(node.children.iter().rev()),
            }
        }
        None
    }
}

/// Parent-chain iterator. See [`TokenTree::ancestors`].
pub struct Ancestors<'a> {
    tree: &'a TokenTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
