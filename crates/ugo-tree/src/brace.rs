//! Code-block brace detection and partner lookup.
//!
//! Hosts decide what counts as a brace; the highlight controller only
//! consumes the [`BraceLookup`] trait.

use crate::{NodeId, TokenTree};

/// Host-provided brace predicate and partner lookup.
pub trait BraceLookup {
    /// True if `token` delimits a code block.
    fn is_brace(&self, tree: &TokenTree, token: NodeId) -> bool;

    /// Finds the brace pairing with `token`, if the nesting allows one.
    fn matching_brace(&self, tree: &TokenTree, token: NodeId) -> Option<NodeId>;
}

/// Matches `{` and `}` tokens by nesting depth in document order.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextBraceLookup;

impl TextBraceLookup {
    fn delta(tree: &TokenTree, id: NodeId) -> i32 {
        match tree.token(id).map(|t| t.text()) {
            Some("{") => 1,
            Some("}") => -1,
            _ => 0,
        }
    }
}

impl BraceLookup for TextBraceLookup {
    fn is_brace(&self, tree: &TokenTree, token: NodeId) -> bool {
        Self::delta(tree, token) != 0
    }

    fn matching_brace(&self, tree: &TokenTree, token: NodeId) -> Option<NodeId> {
        let direction = Self::delta(tree, token);
        if direction == 0 {
            return None;
        }

        let tokens = tree.flatten(tree.root());
        let start = tokens.iter().position(|&id| id == token)?;
        let mut depth = 0;
        let mut scan = |id: NodeId| {
            // Count in the scan direction so the partner lands on zero
            depth += Self::delta(tree, id) * direction;
            depth == 0
        };

        if direction > 0 {
            tokens[start..].iter().copied().find(|&id| scan(id))
        } else {
            tokens[..=start].iter().rev().copied().find(|&id| scan(id))
        }
    }
}
