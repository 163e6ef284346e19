//! Plain-text rendering of a highlighted token tree.
//!
//! Stands in for the painter of a decompiler view: it subscribes to the
//! controller, repaints only after a notification, and reads per-token
//! attributes back from the tree.

use std::fmt::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ugo_highlight::{HighlightController, HighlightListener};
use ugo_tree::TokenTree;

/// Dirty flag raised by highlight notifications.
#[derive(Debug, Default)]
pub struct RepaintFlag(AtomicBool);

impl RepaintFlag {
    /// Returns whether a repaint is pending and resets the flag.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

impl HighlightListener for RepaintFlag {
    fn token_highlights_changed(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Subscribes a fresh repaint flag to `controller`.
pub fn attach(controller: &mut HighlightController) -> Arc<RepaintFlag> {
    let flag = Arc::new(RepaintFlag::default());
    controller.subscribe(flag.clone());
    flag
}

/// Renders the tree text, bracketing highlighted tokens as `[tok]` and
/// marking structural partners with a trailing `*`.
pub fn annotate(tree: &TokenTree) -> String {
    let mut out = String::new();
    for id in tree.tokens(tree.root()) {
        let Some(token) = tree.token(id) else {
            continue;
        };
        match token.highlight() {
            Some(_) => {
                let _ = write!(out, "[{}]", token.text());
            }
            None => out.push_str(token.text()),
        }
        if token.is_matching() {
            out.push('*');
        }
    }
    out
}

/// One line per highlighted token: document index, text and color.
pub fn legend(tree: &TokenTree) -> Vec<String> {
    tree.tokens(tree.root())
        .enumerate()
        .filter_map(|(index, id)| {
            let token = tree.token(id)?;
            let color = token.highlight()?;
            Some(format!("{:>4}  {:<12} {}", index, token.text(), color))
        })
        .collect()
}
