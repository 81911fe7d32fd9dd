//! genkou — diagnostic CLI for the reconciliation engine.
//!
//! Drives the full load/save pipeline against a local vault directory:
//! `open` reconciles a document and prints its block structure with
//! provenance, `touch` writes text through the save path, `stats` shows
//! durable-cache usage.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use genkou_engine::{
    DocumentModel, EditorSession, EngineConfig, FsDurableCache, LocalFsStore, MarkdownModel,
    SaveOutcome,
};
use genkou_types::{BlockKind, DocumentId};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "genkou", about = "Markdown vault reconciliation diagnostics")]
struct Cli {
    /// Vault directory holding the documents.
    #[arg(long, default_value = ".")]
    vault: PathBuf,

    /// Durable cache directory (defaults to `.genkou-cache` inside the vault).
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Optional TOML config file for engine tuning.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a document through the engine and print its blocks.
    Open {
        /// Document path within the vault, e.g. /notes/a.md
        path: String,
    },
    /// Write text to a document through the save path.
    Touch {
        /// Document path within the vault.
        path: String,
        /// Text to save.
        text: String,
    },
    /// Print durable-cache statistics.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            EngineConfig::from_toml_str(&raw)?
        }
        None => EngineConfig::default(),
    };

    let cache_dir = cli
        .cache_dir
        .clone()
        .unwrap_or_else(|| cli.vault.join(".genkou-cache"));
    let durable = Arc::new(
        FsDurableCache::open(&cache_dir, config.durable_capacity_bytes)
            .with_context(|| format!("opening cache dir {}", cache_dir.display()))?,
    );
    let remote = Arc::new(LocalFsStore::new(&cli.vault));
    let model = Arc::new(MarkdownModel::new());
    let session = Arc::new(EditorSession::new(config, durable, remote, model.clone()));

    match cli.command {
        Command::Open { path } => {
            let id = DocumentId::new(path);
            let result = session.load_content(&id).await;
            let source = result
                .source
                .map(|s| s.to_string())
                .unwrap_or_else(|| "none".into());
            println!("{id}  (source: {source}, updated: {})", result.updated);
            for block in &result.snapshot.blocks {
                let label = match &block.kind {
                    BlockKind::Heading { level } => format!("h{level}"),
                    BlockKind::Paragraph => "para".into(),
                    BlockKind::CodeFence { lang } => {
                        format!("code[{}]", lang.as_deref().unwrap_or("-"))
                    }
                    BlockKind::ListItem => "item".into(),
                    BlockKind::Quote => "quote".into(),
                    BlockKind::Rule => "rule".into(),
                };
                let preview: String = block.text.chars().take(60).collect();
                println!("  {label:<10} {preview}");
            }
        }
        Command::Touch { path, text } => {
            let id = DocumentId::new(path);
            let snapshot = model
                .parse(&text)
                .with_context(|| format!("parsing content for {id}"))?;
            match session.save_content(&id, snapshot).await? {
                SaveOutcome::Written => println!("{id}: saved"),
                SaveOutcome::Unchanged => println!("{id}: unchanged, nothing written"),
            }
        }
        Command::Stats => {
            let stats = session.cache_stats();
            println!("durable cache: {} entries, {} bytes", stats.entries, stats.total_bytes);
        }
    }

    session.shutdown().await;
    Ok(())
}
