//! Bracket range and brace partner highlighting.
//!
//! Both rely on well-formed bracket nesting in the tree. When the nesting
//! is broken they find nothing instead of guessing.

use std::collections::HashSet;

use ugo_tree::{BraceLookup, Bracket, Color, NodeId, Token, TokenTree};

use crate::HighlightController;

impl HighlightController {
    /// Highlights `token` (an open or close bracket), its partner and
    /// everything between them.
    ///
    /// Each ancestor group is flattened and scanned for spans delimited
    /// by the bracket's id. Returns the newly highlighted tokens in scan
    /// order, each once; empty if `token` is not a bracket.
    pub fn add_highlight_paren(
        &mut self,
        tree: &mut TokenTree,
        token: NodeId,
        color: Color,
    ) -> Vec<NodeId> {
        if tree.token(token).and_then(Token::bracket).is_none() {
            return Vec::new();
        }
        let highlighted = self.paren_range(tree, token, color);
        self.notify();
        highlighted
    }

    pub(crate) fn paren_range(
        &mut self,
        tree: &mut TokenTree,
        token: NodeId,
        color: Color,
    ) -> Vec<NodeId> {
        let Some(paren) = tree.token(token).and_then(Token::bracket).map(|b| b.id()) else {
            return Vec::new();
        };

        let mut spans = Vec::new();
        for group in tree.ancestors(token) {
            // Tokens of a span are only committed once its close is seen
            let mut open_span: Option<Vec<NodeId>> = None;
            for id in tree.tokens(group) {
                match tree.token(id).and_then(Token::bracket) {
                    Some(Bracket::Open(p)) if p == paren => open_span = Some(vec![id]),
                    Some(Bracket::Close(p)) if p == paren => {
                        if let Some(mut span) = open_span.take() {
                            span.push(id);
                            spans.push(span);
                        }
                    }
                    _ => {
                        if let Some(span) = open_span.as_mut() {
                            span.push(id);
                        }
                    }
                }
            }
            if open_span.is_some() {
                tracing::debug!("Bracket {} left open in group {}", paren, group);
            }
        }

        let mut seen = HashSet::new();
        let mut highlighted = Vec::new();
        for id in spans.into_iter().flatten() {
            if seen.insert(id) {
                self.mark(tree, id, color);
                highlighted.push(id);
            }
        }
        tracing::debug!("Bracket {} range covers {} token(s)", paren, highlighted.len());
        highlighted
    }

    /// Marks and highlights the partner of a code-block brace.
    ///
    /// Returns the partner. Does nothing, and does not notify, when
    /// `token` is not a brace or has no partner.
    pub fn add_highlight_brace(
        &mut self,
        tree: &mut TokenTree,
        token: NodeId,
        lookup: &dyn BraceLookup,
        color: Color,
    ) -> Option<NodeId> {
        let partner = self.brace_partner(tree, token, lookup, color)?;
        self.notify();
        Some(partner)
    }

    pub(crate) fn brace_partner(
        &mut self,
        tree: &mut TokenTree,
        token: NodeId,
        lookup: &dyn BraceLookup,
        color: Color,
    ) -> Option<NodeId> {
        if !lookup.is_brace(tree, token) {
            return None;
        }
        let partner = lookup.matching_brace(tree, token)?;

        // Painted distinctly by the renderer
        tree.token_mut(partner)?.set_matching(true);
        self.mark(tree, partner, color);
        Some(partner)
    }
}
