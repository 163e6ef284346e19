//! Leaf tokens of the decompiled text.
//!
//! A token carries what the decompiler knew when it emitted the text
//! (address, bracket pairing, low-level references) plus two mutable
//! display attributes owned by whoever drives highlighting.

use serde::{Deserialize, Serialize};

use crate::Color;

/// Pairing key shared by an open and a close bracket token.
///
/// A token is either an opening or a closing bracket, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bracket {
    Open(u32),
    Close(u32),
}

impl Bracket {
    /// Returns the pairing id regardless of direction.
    pub fn id(&self) -> u32 {
        match self {
            Bracket::Open(id) | Bracket::Close(id) => *id,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Bracket::Open(_))
    }
}

/// Opaque handle to a low-level variable the token represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarnodeRef(pub u64);

/// Opaque handle to a low-level operation the token represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpRef(pub u64);

/// A leaf unit of rendered pseudo-source text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Token {
    text: String,
    address: Option<u64>,
    bracket: Option<Bracket>,
    varnode: Option<VarnodeRef>,
    op: Option<OpRef>,

    highlight: Option<Color>,
    matching: bool,
}

impl Token {
    /// Creates a plain token with no associations.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_address(mut self, address: u64) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_bracket(mut self, bracket: Bracket) -> Self {
        self.bracket = Some(bracket);
        self
    }

    pub fn with_varnode(mut self, varnode: VarnodeRef) -> Self {
        self.varnode = Some(varnode);
        self
    }

    pub fn with_op(mut self, op: OpRef) -> Self {
        self.op = Some(op);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Minimum program address this token was produced from, if any.
    pub fn address(&self) -> Option<u64> {
        self.address
    }

    pub fn bracket(&self) -> Option<Bracket> {
        self.bracket
    }

    pub fn varnode(&self) -> Option<VarnodeRef> {
        self.varnode
    }

    pub fn op(&self) -> Option<OpRef> {
        self.op
    }

    /// Current highlight color, `None` when not highlighted.
    pub fn highlight(&self) -> Option<Color> {
        self.highlight
    }

    /// True when this token was found as the structural partner of another.
    pub fn is_matching(&self) -> bool {
        self.matching
    }

    /// Sets the highlight color.
    ///
    /// Highlight bookkeeping lives in the controller; callers going
    /// through here directly bypass its highlight set.
    pub fn set_highlight(&mut self, color: Option<Color>) {
        self.highlight = color;
    }

    pub fn set_matching(&mut self, matching: bool) {
        self.matching = matching;
    }
}
