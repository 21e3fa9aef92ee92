//! Pagecraft Inspect CLI
//!
//! Loads a saved page document into an editing session and reports on it.

use clap::{Parser, Subcommand};
use pagecraft_editor::{schema, Document, EditorConfig, EditorStore, MaterialRegistry, Node};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "pagecraft-inspect")]
#[command(about = "Inspect Pagecraft page documents", long_about = None)]
struct Cli {
    /// Directory holding pagecraft.config.json
    #[arg(short, long, default_value = ".")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the node tree
    Outline {
        /// Document JSON file
        input: PathBuf,
    },

    /// Validate tree structure and material types
    Check {
        /// Document JSON file
        input: PathBuf,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Outline { input } => run_outline(&cli.config, input),
        Commands::Check { input } => run_check(&cli.config, input),
    };

    if let Err(e) = result {
        error!("Inspect failed: {:#}", e);
        std::process::exit(1);
    }
}

fn open(config_dir: &Path, input: &Path) -> anyhow::Result<EditorStore> {
    let config = EditorConfig::load(config_dir)?;
    let content = std::fs::read_to_string(input)?;
    let document = Document::from_json(&content)?;

    let mut store = EditorStore::new(&config);
    store.load_document(document)?;
    info!("Loaded {} ({} nodes)", input.display(), store.node_map().len());
    Ok(store)
}

fn run_outline(config_dir: &Path, input: &Path) -> anyhow::Result<()> {
    let store = open(config_dir, input)?;
    let mut out = String::new();
    write_outline(store.root(), 0, &mut out);
    print!("{}", out);
    Ok(())
}

fn write_outline(node: &Node, depth: usize, out: &mut String) {
    let mut flags = Vec::new();
    if node.hidden {
        flags.push("hidden");
    }
    if node.locked {
        flags.push("locked");
    }

    out.push_str(&"  ".repeat(depth));
    out.push_str(&format!("{} <{}>", node.id, node.kind));
    if !flags.is_empty() {
        out.push_str(&format!(" [{}]", flags.join(", ")));
    }
    out.push('\n');

    for child in &node.children {
        write_outline(child, depth + 1, out);
    }
}

fn run_check(config_dir: &Path, input: &Path) -> anyhow::Result<()> {
    let store = open(config_dir, input)?;
    let problems = unknown_materials(store.root(), store.materials());

    for node in &problems {
        warn!(node_id = %node.id, kind = %node.kind, "Unregistered material");
    }
    for node in schema::preorder(store.root()) {
        if !node.children.is_empty() && !store.materials().accepts_children(&node.kind) {
            warn!(node_id = %node.id, kind = %node.kind, "Children under a non-container");
        }
    }

    if problems.is_empty() {
        info!("Document OK");
        Ok(())
    } else {
        anyhow::bail!("{} node(s) use unregistered materials", problems.len())
    }
}

fn unknown_materials<'a>(
    root: &'a std::rc::Rc<Node>,
    materials: &MaterialRegistry,
) -> Vec<&'a std::rc::Rc<Node>> {
    schema::preorder(root)
        .filter(|node| !materials.contains(&node.kind))
        .collect()
}
