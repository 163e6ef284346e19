//! # Ugo Highlight
//!
//! Highlight state for a decompiled function view.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 HighlightController                  │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐  │
//! │  │  Highlight   │ │  Structural  │ │  Gap filler  │  │
//! │  │  set+palette │ │  matcher     │ │              │  │
//! │  └──────────────┘ └──────────────┘ └──────────────┘  │
//! │            │ one notification per mutation           │
//! │  ┌─────────┴────────────────────────────────────┐    │
//! │  │  ListenerList  ──►  renderer / broadcast     │    │
//! │  └──────────────────────────────────────────────┘    │
//! └──────────────────────────────────────────────────────┘
//!            ▲ NodeId handles
//!   TokenTree (owned by the view)
//! ```
//!
//! ## Learning: Handles Instead of Back-References
//!
//! A token knows its color and the controller knows which tokens are
//! colored. Rather than two owning pointers, the controller keeps
//! `NodeId` indices and borrows the tree mutably for each call. The
//! borrow checker then guarantees no renderer reads a token mid-update.
//!
//! The controller is `Send` but has no internal locking. A multi-threaded
//! host wraps the whole controller (and its tree) in one `Mutex`.

mod config;
mod controller;
mod fill;
mod listener;
mod palette;
mod structural;

pub use config::{ConfigError, HighlightConfig, PaletteConfig};
pub use controller::{HighlightController, SpecialTarget};
pub use listener::{
    BroadcastListener, HighlightEvents, HighlightListener, HighlightsChanged, ListenerId,
    ListenerList,
};
pub use palette::Palette;

pub use ugo_tree::{BraceLookup, Color, NodeId, TextBraceLookup, TokenTree};
