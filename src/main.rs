//! # Ugo - Decompiler Token Highlighting
//!
//! Loads a decompiled token tree and applies highlight operations to it,
//! printing the annotated pseudo-source.
//!
//! ## Quick Start
//!
//! ```bash
//! # Select the 3rd token (cursor click) and bridge gaps
//! cargo run -- demos/loop.json --select 3 --fill
//!
//! # Highlight every use of varnode 2
//! cargo run -- demos/loop.json --varnode 2
//! ```

mod render;

use anyhow::{Context, bail};
use clap::Parser;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ugo_highlight::{HighlightConfig, HighlightController, TextBraceLookup};
use ugo_tree::{NodeSpec, OpRef, TokenTree, VarnodeRef};

/// Ugo - highlight tokens of decompiled pseudo-source
#[derive(Parser, Debug)]
#[command(name = "ugo")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Token tree as JSON
    #[arg(value_name = "TREE")]
    tree: PathBuf,

    /// Highlight config (defaults to the user config file)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Select the token at this document-order index
    #[arg(short, long, value_name = "INDEX")]
    select: Option<usize>,

    /// Highlight tokens referring to these varnodes
    #[arg(long, value_name = "ID")]
    varnode: Vec<u64>,

    /// Highlight tokens referring to these ops
    #[arg(long, value_name = "ID")]
    op: Vec<u64>,

    /// Bridge address-less gaps between highlights
    #[arg(short, long)]
    fill: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting ugo v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => HighlightConfig::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => HighlightConfig::load(),
    };

    let mut tree = load_tree(&args.tree)?;
    let mut controller = HighlightController::new();
    let repaint = render::attach(&mut controller);
    controller.load_config(&config);

    if let Some(index) = args.select {
        let tokens = tree.flatten(tree.root());
        let Some(&token) = tokens.get(index) else {
            bail!("token index {} out of range (tree has {} tokens)", index, tokens.len());
        };
        controller.select_token(&mut tree, token, &TextBraceLookup);
    }

    let root = tree.root();
    if !args.varnode.is_empty() {
        let varnodes: HashSet<_> = args.varnode.iter().copied().map(VarnodeRef).collect();
        let color = controller.default_highlight_color();
        let special = controller.default_special_color();
        controller.add_varnodes_to_highlight(&mut tree, root, &varnodes, color, None, special);
    }
    if !args.op.is_empty() {
        let ops: HashSet<_> = args.op.iter().copied().map(OpRef).collect();
        let color = controller.default_highlight_color();
        controller.add_ops_to_highlight(&mut tree, root, &ops, color);
    }
    if args.fill || config.fill_gaps {
        controller.add_highlight_fill(&mut tree);
    }

    if repaint.take() {
        println!("{}", render::annotate(&tree));
        for line in render::legend(&tree) {
            println!("{}", line);
        }
    }
    if let Some(text) = controller.highlighted_text(&tree) {
        println!("search seed: {:?}", text);
    }

    Ok(())
}

fn load_tree(path: &Path) -> anyhow::Result<TokenTree> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading token tree {}", path.display()))?;
    let spec: NodeSpec = serde_json::from_str(&content)
        .with_context(|| format!("parsing token tree {}", path.display()))?;
    Ok(TokenTree::from_spec(&spec)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["ugo", "tree.json"]);
        assert_eq!(args.tree, PathBuf::from("tree.json"));
        assert!(args.select.is_none());
        assert!(!args.fill);
    }

    #[test]
    fn test_args_with_references() {
        let args = Args::parse_from(["ugo", "t.json", "--varnode", "2", "--varnode", "5", "-f"]);
        assert_eq!(args.varnode, vec![2, 5]);
        assert!(args.fill);
    }

    #[test]
    fn test_load_demo_tree() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/loop.json");
        let tree = load_tree(&path).unwrap();
        assert!(tree.text().contains("while"));
    }
}
