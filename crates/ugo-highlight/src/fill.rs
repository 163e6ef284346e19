//! Bridging address-less gaps between highlighted tokens.
//!
//! Punctuation and synthesized keywords carry no address, so a run of
//! highlighted variables reads as broken up. Within each group holding a
//! highlight, unhighlighted address-less tokens sitting between two
//! highlighted siblings take the color of the earlier one. A token with
//! its own address, or a nested group, ends the run.

use std::collections::BTreeSet;

use ugo_tree::{Color, NodeId, TokenTree};

use crate::HighlightController;

impl HighlightController {
    /// Fills gaps between highlighted siblings; returns how many tokens
    /// were newly highlighted. Notifies once.
    pub fn add_highlight_fill(&mut self, tree: &mut TokenTree) -> usize {
        let groups: BTreeSet<NodeId> = self
            .highlighted_tokens()
            .filter_map(|id| tree.parent(id))
            .collect();

        let mut queued: Vec<(NodeId, Color)> = Vec::new();
        for group in groups {
            let children = tree.children(group);
            // Index and color of the last highlighted child in the current run
            let mut run: Option<(usize, Color)> = None;

            for (index, &child) in children.iter().enumerate() {
                let Some(token) = tree.token(child) else {
                    run = None;
                    continue;
                };
                match token.highlight() {
                    Some(color) => {
                        if let Some((start, first_color)) = run {
                            queued.extend(
                                children[start + 1..index]
                                    .iter()
                                    .map(|&gap| (gap, first_color)),
                            );
                        }
                        run = Some((index, color));
                    }
                    None if token.address().is_some() => run = None,
                    None => {}
                }
            }
        }

        let mut filled = 0;
        for (id, color) in queued {
            let already = tree.token(id).is_some_and(|t| t.highlight().is_some());
            if !already && self.mark(tree, id, color) {
                filled += 1;
            }
        }
        tracing::debug!("Filled {} gap token(s)", filled);
        self.notify();
        filled
    }
}
