//! # Ugo Tree
//!
//! Token tree produced by decompiling a function into pseudo-source.
//!
//! ## Structure
//!
//! ```text
//! root (group)
//! ├── group: statement
//! │   ├── token "x"        address, varnode
//! │   ├── token "="
//! │   ├── token "("        bracket open 1
//! │   ├── ...
//! │   └── token ")"        bracket close 1
//! └── group: block
//!     └── ...
//! ```
//!
//! Groups exist for structure and iteration only. Tokens are the leaves
//! and carry the highlight attributes painted by a renderer.

mod brace;
mod builder;
mod color;
mod token;
mod tree;

pub use brace::{BraceLookup, TextBraceLookup};
pub use builder::{NodeSpec, TreeBuilder};
pub use color::{Color, ParseColorError};
pub use token::{Bracket, OpRef, Token, VarnodeRef};
pub use tree::{Ancestors, NodeId, TokenTree, Tokens};

/// Result type for tree construction
pub type TreeResult<T> = Result<T, TreeError>;

/// Errors that can occur while building a tree
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("Node {0} does not exist in this tree")]
    UnknownNode(NodeId),

    #[error("Node {0} is a token and cannot have children")]
    NotAGroup(NodeId),

    #[error("Root of a tree spec must be a group")]
    RootNotGroup,

    #[error("Closed a group that was never opened")]
    UnbalancedGroup,

    #[error("{0} group(s) left open")]
    UnclosedGroups(usize),

    #[error("Tree exceeds the maximum node count")]
    TooManyNodes,
}
