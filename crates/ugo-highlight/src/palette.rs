//! Default highlight colors.

use serde::{Deserialize, Serialize};
use ugo_tree::Color;

/// The four process-wide default colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    /// Background behind code that is not part of the function body
    pub background: Color,
    /// Current-variable highlight
    pub highlight: Color,
    /// Special highlight, e.g. the defining use of a variable
    pub special: Color,
    /// Bracket range highlight
    pub paren: Color,
}

impl Palette {
    pub const DEFAULT_BACKGROUND: Color = Color::rgb(220, 220, 220);
    pub const DEFAULT_HIGHLIGHT: Color = Color::rgba(255, 255, 0, 128);
    pub const DEFAULT_SPECIAL: Color = Color::rgba(255, 100, 0, 128);
    pub const DEFAULT_PAREN: Color = Color::rgba(255, 255, 0, 128);
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Self::DEFAULT_BACKGROUND,
            highlight: Self::DEFAULT_HIGHLIGHT,
            special: Self::DEFAULT_SPECIAL,
            paren: Self::DEFAULT_PAREN,
        }
    }
}
