//! Highlight state for one decompiled view.
//!
//! ## Invariant
//!
//! A token is in the controller's highlight set exactly when its
//! `highlight()` color is `Some`. Every mutation below updates both sides
//! together, and every public mutation ends with exactly one listener
//! notification no matter how many tokens it touched.
//!
//! The controller stores `NodeId`s only. The tree stays owned by the
//! view; pass it in for each call and call [`HighlightController::clear_all`]
//! before replacing it.

use std::collections::HashSet;
use std::sync::Arc;

use ugo_tree::{BraceLookup, Color, NodeId, OpRef, Token, TokenTree, VarnodeRef};

use crate::config::HighlightConfig;
use crate::listener::{HighlightListener, ListenerId, ListenerList};
use crate::palette::Palette;

/// A varnode/op pair that gets the special color in
/// [`HighlightController::add_varnodes_to_highlight`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTarget {
    pub varnode: VarnodeRef,
    pub op: OpRef,
}

/// Highlight store, structural matcher and gap filler for one view.
#[derive(Debug, Default)]
pub struct HighlightController {
    palette: Palette,
    highlighted: HashSet<NodeId>,
    listeners: ListenerList,
}

impl HighlightController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_palette(palette: Palette) -> Self {
        Self {
            palette,
            ..Self::default()
        }
    }

    // ---- Notification -------------------------------------------------

    pub fn subscribe(&mut self, listener: Arc<dyn HighlightListener>) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub(crate) fn notify(&self) {
        self.listeners.notify();
    }

    // ---- Palette ------------------------------------------------------

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn default_background_color(&self) -> Color {
        self.palette.background
    }

    pub fn default_highlight_color(&self) -> Color {
        self.palette.highlight
    }

    pub fn default_special_color(&self) -> Color {
        self.palette.special
    }

    pub fn default_paren_color(&self) -> Color {
        self.palette.paren
    }

    pub fn set_default_background_color(&mut self, color: Color) {
        self.palette.background = color;
        self.notify();
    }

    pub fn set_default_highlight_color(&mut self, color: Color) {
        self.palette.highlight = color;
        self.notify();
    }

    pub fn set_default_special_color(&mut self, color: Color) {
        self.palette.special = color;
        self.notify();
    }

    pub fn set_default_paren_color(&mut self, color: Color) {
        self.palette.paren = color;
        self.notify();
    }

    /// Applies every color the config sets; notifies once.
    pub fn load_config(&mut self, config: &HighlightConfig) {
        let overrides = &config.palette;
        if let Some(color) = overrides.background {
            self.palette.background = color;
        }
        if let Some(color) = overrides.highlight {
            self.palette.highlight = color;
        }
        if let Some(color) = overrides.special {
            self.palette.special = color;
        }
        if let Some(color) = overrides.paren {
            self.palette.paren = color;
        }
        tracing::debug!(palette = ?self.palette, "Loaded highlight palette");
        self.notify();
    }

    // ---- Queries ------------------------------------------------------

    pub fn is_highlighted(&self, token: NodeId) -> bool {
        self.highlighted.contains(&token)
    }

    /// Returns the highlighted token only if it is the only one.
    ///
    /// Zero or several highlights both mean "no clear selection".
    pub fn unique_highlighted_token(&self) -> Option<NodeId> {
        if self.highlighted.len() == 1 {
            self.highlighted.iter().next().copied()
        } else {
            None
        }
    }

    /// Text of the unique highlighted token, for seeding a search.
    pub fn highlighted_text<'t>(&self, tree: &'t TokenTree) -> Option<&'t str> {
        let token = self.unique_highlighted_token()?;
        tree.token(token).map(Token::text)
    }

    pub fn highlighted_count(&self) -> usize {
        self.highlighted.len()
    }

    /// Highlighted tokens in no particular order.
    pub fn highlighted_tokens(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.highlighted.iter().copied()
    }

    // ---- Single-token mutations ---------------------------------------

    /// Highlights `token` with `color`, replacing any previous color.
    pub fn set_highlight(&mut self, tree: &mut TokenTree, token: NodeId, color: Color) {
        self.mark(tree, token, color);
        self.notify();
    }

    pub fn clear_highlight(&mut self, tree: &mut TokenTree, token: NodeId) {
        self.unmark(tree, token);
        self.notify();
    }

    /// Clears every highlight and matching-partner flag.
    pub fn clear_all(&mut self, tree: &mut TokenTree) {
        self.unmark_all(tree);
        self.notify();
    }

    // ---- Bulk mutations -----------------------------------------------

    /// Highlights every token under `parent` whose varnode is in `varnodes`.
    ///
    /// When `special` is given, tokens referring to exactly that varnode
    /// and op get `special_color` instead.
    pub fn add_varnodes_to_highlight(
        &mut self,
        tree: &mut TokenTree,
        parent: NodeId,
        varnodes: &HashSet<VarnodeRef>,
        color: Color,
        special: Option<SpecialTarget>,
        special_color: Color,
    ) {
        let mut count = 0;
        for id in tree.flatten(parent) {
            let Some(token) = tree.token(id) else {
                continue;
            };
            let varnode = token.varnode();
            let op = token.op();

            if varnode.is_some_and(|vn| varnodes.contains(&vn)) {
                self.mark(tree, id, color);
                count += 1;
            }
            let is_special =
                special.is_some_and(|t| varnode == Some(t.varnode) && op == Some(t.op));
            if is_special {
                self.mark(tree, id, special_color);
            }
        }
        tracing::debug!("Highlighted {} varnode token(s)", count);
        self.notify();
    }

    /// Highlights every token under `parent` whose op is in `ops`.
    pub fn add_ops_to_highlight(
        &mut self,
        tree: &mut TokenTree,
        parent: NodeId,
        ops: &HashSet<OpRef>,
        color: Color,
    ) {
        let matches: Vec<NodeId> = tree
            .tokens(parent)
            .filter(|&id| {
                tree.token(id)
                    .and_then(Token::op)
                    .is_some_and(|op| ops.contains(&op))
            })
            .collect();
        tracing::debug!("Highlighted {} op token(s)", matches.len());
        for id in matches {
            self.mark(tree, id, color);
        }
        self.notify();
    }

    pub fn add_tokens_to_highlight(
        &mut self,
        tree: &mut TokenTree,
        tokens: impl IntoIterator<Item = NodeId>,
        color: Color,
    ) {
        for id in tokens {
            self.mark(tree, id, color);
        }
        self.notify();
    }

    /// Reacts to the cursor landing on `token`.
    ///
    /// Replaces all highlights with the token itself in the default
    /// color; brackets additionally get their range and braces their
    /// partner in the paren color.
    pub fn select_token(
        &mut self,
        tree: &mut TokenTree,
        token: NodeId,
        lookup: &dyn BraceLookup,
    ) {
        let Palette { highlight, paren, .. } = self.palette;

        self.unmark_all(tree);
        self.mark(tree, token, highlight);

        if tree.token(token).and_then(Token::bracket).is_some() {
            self.paren_range(tree, token, paren);
        }
        if lookup.is_brace(tree, token) {
            self.brace_partner(tree, token, lookup, paren);
        }
        self.notify();
    }

    // ---- Set/color bookkeeping ----------------------------------------
    //
    // These never notify. Public operations call them and notify once.

    /// Colors a token and records it. Groups and foreign ids are ignored.
    pub(crate) fn mark(&mut self, tree: &mut TokenTree, id: NodeId, color: Color) -> bool {
        match tree.token_mut(id) {
            Some(token) => {
                token.set_highlight(Some(color));
                self.highlighted.insert(id);
                true
            }
            None => false,
        }
    }

    fn unmark(&mut self, tree: &mut TokenTree, id: NodeId) {
        if let Some(token) = tree.token_mut(id) {
            token.set_highlight(None);
            token.set_matching(false);
        }
        self.highlighted.remove(&id);
    }

    fn unmark_all(&mut self, tree: &mut TokenTree) {
        tracing::debug!("Clearing {} highlight(s)", self.highlighted.len());
        for id in self.highlighted.drain() {
            if let Some(token) = tree.token_mut(id) {
                token.set_highlight(None);
                token.set_matching(false);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use ugo_tree::{TextBraceLookup, TreeBuilder};

    pub(crate) const RED: Color = Color::rgb(255, 0, 0);
    pub(crate) const BLUE: Color = Color::rgb(0, 0, 255);

    /// Subscribes a counting listener and returns its counter.
    pub(crate) fn counter(controller: &mut HighlightController) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        controller.subscribe(Arc::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        }));
        count
    }

    /// Every token's color agrees with set membership.
    pub(crate) fn assert_consistent(controller: &HighlightController, tree: &TokenTree) {
        for id in tree.flatten(tree.root()) {
            let colored = tree.token(id).unwrap().highlight().is_some();
            assert_eq!(controller.is_highlighted(id), colored, "token {id}");
        }
        let colored = tree
            .flatten(tree.root())
            .into_iter()
            .filter(|&id| tree.token(id).unwrap().highlight().is_some())
            .count();
        assert_eq!(controller.highlighted_count(), colored);
    }

    fn flat(texts: &[&str]) -> (TokenTree, Vec<NodeId>) {
        let mut builder = TreeBuilder::new();
        let ids = texts
            .iter()
            .map(|text| builder.token(Token::new(*text)))
            .collect();
        (builder.finish().unwrap(), ids)
    }

    #[test]
    fn test_set_and_clear_highlight() {
        let (mut tree, ids) = flat(&["a", "b"]);
        let mut controller = HighlightController::new();

        controller.set_highlight(&mut tree, ids[0], RED);
        assert!(controller.is_highlighted(ids[0]));
        assert_eq!(tree.token(ids[0]).unwrap().highlight(), Some(RED));

        controller.set_highlight(&mut tree, ids[0], BLUE);
        assert_eq!(tree.token(ids[0]).unwrap().highlight(), Some(BLUE));
        assert_eq!(controller.highlighted_count(), 1);

        controller.clear_highlight(&mut tree, ids[0]);
        assert!(!controller.is_highlighted(ids[0]));
        assert!(tree.token(ids[0]).unwrap().highlight().is_none());

        // Not highlighted: no-op
        controller.clear_highlight(&mut tree, ids[1]);
        assert_consistent(&controller, &tree);
    }

    #[test]
    fn test_groups_are_never_highlighted() {
        let mut builder = TreeBuilder::new();
        let group = builder.open_group();
        builder.token(Token::new("x"));
        builder.close_group().unwrap();
        let mut tree = builder.finish().unwrap();

        let mut controller = HighlightController::new();
        controller.set_highlight(&mut tree, group, RED);
        assert!(!controller.is_highlighted(group));
        assert_consistent(&controller, &tree);
    }

    #[test]
    fn test_unique_highlighted_token_requires_exactly_one() {
        let (mut tree, ids) = flat(&["a", "b", "c"]);
        let mut controller = HighlightController::new();
        assert_eq!(controller.unique_highlighted_token(), None);

        controller.set_highlight(&mut tree, ids[1], RED);
        assert_eq!(controller.unique_highlighted_token(), Some(ids[1]));
        assert_eq!(controller.highlighted_text(&tree), Some("b"));

        // Two highlights are ambiguous, not "first" or "any"
        controller.set_highlight(&mut tree, ids[2], RED);
        assert_eq!(controller.unique_highlighted_token(), None);
        assert_eq!(controller.highlighted_text(&tree), None);

        controller.clear_highlight(&mut tree, ids[1]);
        assert_eq!(controller.unique_highlighted_token(), Some(ids[2]));
    }

    #[test]
    fn test_clear_all() {
        let (mut tree, ids) = flat(&["a", "b", "c"]);
        let mut controller = HighlightController::new();
        controller.add_tokens_to_highlight(&mut tree, ids.clone(), RED);
        tree.token_mut(ids[2]).unwrap().set_matching(true);

        let count = counter(&mut controller);
        controller.clear_all(&mut tree);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(controller.highlighted_count(), 0);
        assert_eq!(controller.unique_highlighted_token(), None);
        assert!(!tree.token(ids[2]).unwrap().is_matching());
        assert_consistent(&controller, &tree);
    }

    #[test]
    fn test_one_notification_per_call() {
        let (mut tree, ids) = flat(&["a", "b", "c", "d"]);
        let mut controller = HighlightController::new();
        let count = counter(&mut controller);

        controller.add_tokens_to_highlight(&mut tree, ids.clone(), RED);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        controller.set_highlight(&mut tree, ids[0], BLUE);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        controller.clear_highlight(&mut tree, ids[0]);
        assert_eq!(count.load(Ordering::SeqCst), 3);

        controller.set_default_paren_color(BLUE);
        assert_eq!(count.load(Ordering::SeqCst), 4);

        controller.load_config(&HighlightConfig::default());
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let (mut tree, ids) = flat(&["a"]);
        let mut controller = HighlightController::new();
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let id = controller.subscribe(Arc::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        }));

        controller.set_highlight(&mut tree, ids[0], RED);
        assert!(controller.unsubscribe(id));
        controller.set_highlight(&mut tree, ids[0], BLUE);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_varnode_highlight_with_special() {
        let mut builder = TreeBuilder::new();
        let a = builder.token(Token::new("a").with_varnode(VarnodeRef(1)).with_op(OpRef(10)));
        let b = builder.token(Token::new("b").with_varnode(VarnodeRef(2)));
        let a2 = builder.token(Token::new("a").with_varnode(VarnodeRef(1)).with_op(OpRef(11)));
        let mut tree = builder.finish().unwrap();

        let mut controller = HighlightController::new();
        let count = counter(&mut controller);
        let root = tree.root();
        controller.add_varnodes_to_highlight(
            &mut tree,
            root,
            &HashSet::from([VarnodeRef(1)]),
            RED,
            Some(SpecialTarget {
                varnode: VarnodeRef(1),
                op: OpRef(11),
            }),
            BLUE,
        );

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(tree.token(a).unwrap().highlight(), Some(RED));
        assert_eq!(tree.token(a2).unwrap().highlight(), Some(BLUE));
        assert!(!controller.is_highlighted(b));
        assert_consistent(&controller, &tree);
    }

    #[test]
    fn test_op_highlight() {
        let mut builder = TreeBuilder::new();
        builder.open_group();
        let call = builder.token(Token::new("f").with_op(OpRef(5)));
        let other = builder.token(Token::new("g").with_op(OpRef(6)));
        builder.close_group().unwrap();
        let mut tree = builder.finish().unwrap();

        let mut controller = HighlightController::new();
        let root = tree.root();
        controller.add_ops_to_highlight(&mut tree, root, &HashSet::from([OpRef(5)]), RED);

        assert!(controller.is_highlighted(call));
        assert!(!controller.is_highlighted(other));
    }

    #[test]
    fn test_load_config_applies_only_set_colors() {
        let mut controller = HighlightController::new();
        let mut config = HighlightConfig::default();
        config.palette.special = Some(BLUE);

        controller.load_config(&config);
        assert_eq!(controller.default_special_color(), BLUE);
        assert_eq!(controller.default_highlight_color(), Palette::DEFAULT_HIGHLIGHT);
        assert_eq!(controller.default_background_color(), Palette::DEFAULT_BACKGROUND);
    }

    #[test]
    fn test_select_plain_token() {
        let (mut tree, ids) = flat(&["a", "b"]);
        let mut controller = HighlightController::new();
        controller.set_highlight(&mut tree, ids[1], RED);

        let count = counter(&mut controller);
        controller.select_token(&mut tree, ids[0], &TextBraceLookup);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(controller.unique_highlighted_token(), Some(ids[0]));
        assert_eq!(
            tree.token(ids[0]).unwrap().highlight(),
            Some(Palette::DEFAULT_HIGHLIGHT)
        );
        assert_consistent(&controller, &tree);
    }

    #[test]
    fn test_select_brace_marks_partner() {
        let (mut tree, ids) = flat(&["{", "x", "}"]);
        let mut controller = HighlightController::new();
        controller.set_default_paren_color(BLUE);

        let count = counter(&mut controller);
        controller.select_token(&mut tree, ids[2], &TextBraceLookup);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(tree.token(ids[0]).unwrap().is_matching());
        assert!(!tree.token(ids[2]).unwrap().is_matching());
        assert_eq!(tree.token(ids[0]).unwrap().highlight(), Some(BLUE));
        assert_consistent(&controller, &tree);
    }

    mod invariant {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Set(usize, bool),
            Clear(usize),
            ClearAll,
            Fill,
            Paren(usize),
            Brace(usize),
            Select(usize),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0..12usize, any::<bool>()).prop_map(|(i, red)| Op::Set(i, red)),
                (0..12usize).prop_map(Op::Clear),
                Just(Op::ClearAll),
                Just(Op::Fill),
                (0..12usize).prop_map(Op::Paren),
                (0..12usize).prop_map(Op::Brace),
                (0..12usize).prop_map(Op::Select),
            ]
        }

        /// `f ( x , { y } ) ; z` with two nested groups and a few addresses.
        fn sample() -> (TokenTree, Vec<NodeId>) {
            use ugo_tree::Bracket;
            let mut builder = TreeBuilder::new();
            let mut ids = Vec::new();
            ids.push(builder.token(Token::new("f").with_address(0x10)));
            builder.open_group();
            ids.push(builder.token(Token::new("(").with_bracket(Bracket::Open(1))));
            ids.push(builder.token(Token::new("x").with_address(0x14)));
            ids.push(builder.token(Token::new(",")));
            builder.open_group();
            ids.push(builder.token(Token::new("{")));
            ids.push(builder.token(Token::new("y").with_address(0x18)));
            ids.push(builder.token(Token::new("}")));
            builder.close_group().unwrap();
            ids.push(builder.token(Token::new(")").with_bracket(Bracket::Close(1))));
            builder.close_group().unwrap();
            ids.push(builder.token(Token::new(";")));
            ids.push(builder.token(Token::new(" ")));
            ids.push(builder.token(Token::new("z").with_address(0x20)));
            ids.push(builder.token(Token::new(";")));
            (builder.finish().unwrap(), ids)
        }

        proptest! {
            #[test]
            fn test_set_membership_tracks_color(ops in prop::collection::vec(op(), 0..40)) {
                let (mut tree, ids) = sample();
                let mut controller = HighlightController::new();
                let count = counter(&mut controller);

                for op in ops {
                    let before = count.load(Ordering::SeqCst);
                    let notified = match op {
                        Op::Set(i, red) => {
                            controller.set_highlight(&mut tree, ids[i], if red { RED } else { BLUE });
                            true
                        }
                        Op::Clear(i) => {
                            controller.clear_highlight(&mut tree, ids[i]);
                            true
                        }
                        Op::ClearAll => {
                            controller.clear_all(&mut tree);
                            true
                        }
                        Op::Fill => {
                            controller.add_highlight_fill(&mut tree);
                            true
                        }
                        Op::Paren(i) => {
                            controller.add_highlight_paren(&mut tree, ids[i], RED);
                            tree.token(ids[i]).unwrap().bracket().is_some()
                        }
                        Op::Brace(i) => {
                            controller
                                .add_highlight_brace(&mut tree, ids[i], &TextBraceLookup, BLUE)
                                .is_some()
                        }
                        Op::Select(i) => {
                            controller.select_token(&mut tree, ids[i], &TextBraceLookup);
                            true
                        }
                    };
                    let expected = before + usize::from(notified);
                    prop_assert_eq!(count.load(Ordering::SeqCst), expected);
                    assert_consistent(&controller, &tree);
                }
            }
        }
    }
}
