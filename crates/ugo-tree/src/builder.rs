//! Building token trees.
//!
//! Two entry points:
//! - [`TreeBuilder`] for emitting tokens in order, the way a decompiler
//!   printer walks its output
//! - [`NodeSpec`] for loading a nested, serde-friendly snapshot

use serde::{Deserialize, Serialize};

use crate::{Bracket, NodeId, OpRef, Token, TokenTree, TreeError, TreeResult, VarnodeRef};

/// Incremental tree builder with an open-group stack.
///
/// ```
/// use ugo_tree::{Bracket, Token, TreeBuilder};
///
/// let mut builder = TreeBuilder::new();
/// builder.open_group();
/// builder.token(Token::new("(").with_bracket(Bracket::Open(1)));
/// builder.token(Token::new("x"));
/// builder.token(Token::new(")").with_bracket(Bracket::Close(1)));
/// builder.close_group().unwrap();
/// let tree = builder.finish().unwrap();
/// assert_eq!(tree.text(), "(x)");
/// ```
#[derive(Debug)]
pub struct TreeBuilder {
    tree: TokenTree,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        let tree = TokenTree::new();
        let root = tree.root();
        Self {
            tree,
            stack: vec![root],
        }
    }

    fn current(&self) -> NodeId {
        // The root is never popped
        self.stack[self.stack.len() - 1]
    }

    /// Opens a nested group; subsequent tokens go inside it.
    pub fn open_group(&mut self) -> NodeId {
        let id = self
            .tree
            .add_group(self.current())
            .expect("builder stack only holds groups");
        self.stack.push(id);
        id
    }

    /// Closes the innermost open group.
    pub fn close_group(&mut self) -> TreeResult<()> {
        if self.stack.len() == 1 {
            return Err(TreeError::UnbalancedGroup);
        }
        self.stack.pop();
        Ok(())
    }

    /// Appends a token to the innermost open group.
    pub fn token(&mut self, token: Token) -> NodeId {
        self.tree
            .add_token(self.current(), token)
            .expect("builder stack only holds groups")
    }

    /// Returns the tree; every opened group must have been closed.
    pub fn finish(self) -> TreeResult<TokenTree> {
        match self.stack.len() - 1 {
            0 => Ok(self.tree),
            open => Err(TreeError::UnclosedGroups(open)),
        }
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Nested description of a tree, e.g. as loaded from JSON.
///
/// ```json
/// { "kind": "group", "children": [
///     { "kind": "token", "text": "x", "address": 4198400, "varnode": 3 },
///     { "kind": "token", "text": "(", "bracket": { "open": 1 } }
/// ] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeSpec {
    Group {
        #[serde(default)]
        children: Vec<NodeSpec>,
    },
    Token {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bracket: Option<Bracket>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        varnode: Option<VarnodeRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        op: Option<OpRef>,
    },
}

impl NodeSpec {
    fn to_token(&self) -> Option<Token> {
        let NodeSpec::Token {
            text,
            address,
            bracket,
            varnode,
            op,
        } = self
        else {
            return None;
        };

        let mut token = Token::new(text.as_str());
        if let Some(address) = address {
            token = token.with_address(*address);
        }
        if let Some(bracket) = bracket {
            token = token.with_bracket(*bracket);
        }
        if let Some(varnode) = varnode {
            token = token.with_varnode(*varnode);
        }
        if let Some(op) = op {
            token = token.with_op(*op);
        }
        Some(token)
    }
}

impl TokenTree {
    /// Builds a tree from a nested spec whose top level must be a group.
    pub fn from_spec(spec: &NodeSpec) -> TreeResult<Self> {
        let NodeSpec::Group { children } = spec else {
            return Err(TreeError::RootNotGroup);
        };

        let mut tree = TokenTree::new();
        let mut stack = vec![(tree.root(), children.iter())];
        while let Some((parent, iter)) = stack.last_mut() {
            let parent = *parent;
            let Some(child) = iter.next() else {
                stack.pop();
                continue;
            };
            match child {
                NodeSpec::Group { children } => {
                    let id = tree.add_group(parent)?;
                    stack.push((id, children.iter()));
                }
                token => {
                    if let Some(token) = token.to_token() {
                        tree.add_token(parent, token)?;
                    }
                }
            }
        }
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_nesting() {
        let mut builder = TreeBuilder::new();
        builder.token(Token::new("a"));
        let group = builder.open_group();
        let b = builder.token(Token::new("b"));
        builder.close_group().unwrap();
        let tree = builder.finish().unwrap();

        assert_eq!(tree.parent(b), Some(group));
        assert_eq!(tree.parent(group), Some(tree.root()));
        assert_eq!(tree.text(), "ab");
    }

    #[test]
    fn test_builder_unbalanced_close() {
        let mut builder = TreeBuilder::new();
        assert!(matches!(
            builder.close_group(),
            Err(TreeError::UnbalancedGroup)
        ));
    }

    #[test]
    fn test_builder_unclosed_groups() {
        let mut builder = TreeBuilder::new();
        builder.open_group();
        builder.open_group();
        assert!(matches!(
            builder.finish(),
            Err(TreeError::UnclosedGroups(2))
        ));
    }

    #[test]
    fn test_from_json_spec() {
        let json = r#"{
            "kind": "group",
            "children": [
                { "kind": "token", "text": "f", "address": 4096, "op": 2 },
                { "kind": "group", "children": [
                    { "kind": "token", "text": "(", "bracket": { "open": 1 } },
                    { "kind": "token", "text": "x", "varnode": 7 },
                    { "kind": "token", "text": ")", "bracket": { "close": 1 } }
                ] }
            ]
        }"#;
        let spec: NodeSpec = serde_json::from_str(json).unwrap();
        let tree = TokenTree::from_spec(&spec).unwrap();

        assert_eq!(tree.text(), "f(x)");
        let tokens = tree.flatten(tree.root());
        let f = tree.token(tokens[0]).unwrap();
        assert_eq!(f.address(), Some(4096));
        assert_eq!(f.op(), Some(OpRef(2)));
        assert_eq!(tree.token(tokens[1]).unwrap().bracket(), Some(Bracket::Open(1)));
        assert_eq!(tree.token(tokens[2]).unwrap().varnode(), Some(VarnodeRef(7)));
        assert_eq!(tree.token(tokens[3]).unwrap().bracket(), Some(Bracket::Close(1)));
        assert_ne!(tree.parent(tokens[1]), Some(tree.root()));
    }

    #[test]
    fn test_from_spec_requires_group_root() {
        let spec = NodeSpec::Token {
            text: "x".into(),
            address: None,
            bracket: None,
            varnode: None,
            op: None,
        };
        assert!(matches!(
            TokenTree::from_spec(&spec),
            Err(TreeError::RootNotGroup)
        ));
    }
}
