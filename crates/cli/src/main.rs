use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::{AppConfig, EmbeddingMode};
use mrag_llama::{LlamaClient, ServerPool};
use mrag_vector_store::{
    document_name_from_path, Embedder, GroupStore, StubEmbedder, StubSummarizer, Summarizer,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

mod config;

#[derive(Parser)]
#[command(name = "mrag")]
#[command(about = "File-backed embedding store for retrieval-augmented generation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the group files (overrides the config file)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Config file (default: ./mrag.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the provider backend in this process
    #[arg(long, global = true, value_enum)]
    embed_mode: Option<EmbeddingMode>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for results)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize, chunk and embed a text file into a group
    Add(AddArgs),

    /// Remove a document from a group
    Remove(RemoveArgs),

    /// Find the chunks most similar to a query
    Search(SearchArgs),

    /// List groups under the root directory
    Groups(GroupsArgs),

    /// Print document summaries of a group
    Summary(SummaryArgs),
}

#[derive(Args)]
struct AddArgs {
    group: String,

    /// Text file to add
    file: PathBuf,

    /// Document name (defaults to the file name without extension)
    #[arg(long)]
    name: Option<String>,
}

#[derive(Args)]
struct RemoveArgs {
    group: String,
    document: String,
}

#[derive(Args)]
struct SearchArgs {
    group: String,

    /// Search query
    query: String,

    /// Maximum number of results
    #[arg(long, short = 'k', default_value_t = 5)]
    top_k: usize,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct GroupsArgs {
    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SummaryArgs {
    group: String,

    /// Only this document
    document: Option<String>,
}

#[derive(Serialize)]
struct SearchHit<'a> {
    rank: usize,
    document_name: &'a str,
    index: usize,
    total: usize,
    score: f32,
    text: &'a str,
}

#[derive(Serialize)]
struct GroupEntry<'a> {
    group_name: &'a str,
    file_name: &'a str,
    modified_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // reqwest/hyper are noisy at debug level
    if !cli.verbose {
        builder.filter_module("hyper", log::LevelFilter::Warn);
        builder.filter_module("reqwest", log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        config.root = root;
    }
    if let Some(mode) = cli.embed_mode {
        config.embedding_mode = mode;
        config.validate()?;
    }

    let store = build_store(&config)?;
    match cli.command {
        Commands::Add(args) => run_add(&store, args).await,
        Commands::Remove(args) => run_remove(&store, args).await,
        Commands::Search(args) => run_search(&store, args).await,
        Commands::Groups(args) => run_groups(&store, args).await,
        Commands::Summary(args) => run_summary(&store, args).await,
    }
}

fn build_store(config: &AppConfig) -> Result<GroupStore> {
    let (embedder, summarizer) = build_providers(config)?;
    GroupStore::new(&config.root, config.chunking, embedder, summarizer)
        .context("Invalid store configuration")
}

fn build_providers(config: &AppConfig) -> Result<(Arc<dyn Embedder>, Arc<dyn Summarizer>)> {
    if config.embedding_mode == EmbeddingMode::Stub {
        log::debug!("Using stub providers");
        let embedder: Arc<dyn Embedder> = Arc::new(StubEmbedder::default());
        let summarizer: Arc<dyn Summarizer> = Arc::new(StubSummarizer::default());
        return Ok((embedder, summarizer));
    }

    let interval = Duration::from_secs(config.health_check_interval_secs);
    let embedding_clients = config
        .embedding_servers
        .iter()
        .map(|url| Ok(LlamaClient::new(url)?.embedding_model(config.embedding_model.as_str())))
        .collect::<Result<Vec<_>>>()?;
    let chat_clients = config
        .chat_servers
        .iter()
        .map(|url| {
            Ok(LlamaClient::new(url)?
                .temperature(config.temperature)
                .max_tokens(config.max_tokens))
        })
        .collect::<Result<Vec<_>>>()?;

    let embedder: Arc<dyn Embedder> =
        Arc::new(ServerPool::new("embedding", embedding_clients, interval));
    let summarizer: Arc<dyn Summarizer> =
        Arc::new(ServerPool::new("chat", chat_clients, interval));
    Ok((embedder, summarizer))
}

async fn run_add(store: &GroupStore, args: AddArgs) -> Result<()> {
    let text = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let name = match args.name {
        Some(name) => name,
        None => document_name_from_path(&args.file).with_context(|| {
            format!("Cannot derive a document name from {}", args.file.display())
        })?,
    };

    let stats = store
        .add_document(&args.group, &name, &text)
        .await
        .with_context(|| format!("Failed to add '{name}' to group '{}'", args.group))?;
    let verb = if stats.replaced { "Replaced" } else { "Added" };
    println!(
        "{verb} '{name}' in group '{}' ({} chunks)",
        args.group.trim(),
        stats.chunks
    );
    Ok(())
}

async fn run_remove(store: &GroupStore, args: RemoveArgs) -> Result<()> {
    let removed = store
        .remove_document(&args.group, &args.document)
        .await
        .with_context(|| format!("Failed to remove '{}'", args.document))?;
    if removed {
        println!("Removed '{}' from group '{}'", args.document, args.group.trim());
    } else {
        println!("'{}' not found in group '{}'", args.document, args.group.trim());
    }
    Ok(())
}

async fn run_search(store: &GroupStore, args: SearchArgs) -> Result<()> {
    let results = store
        .search_text(&args.group, &args.query, args.top_k)
        .await
        .with_context(|| format!("Search in group '{}' failed", args.group))?;

    let hits: Vec<SearchHit<'_>> = results
        .iter()
        .enumerate()
        .map(|(i, chunk)| SearchHit {
            rank: i + 1,
            document_name: &chunk.document_name,
            index: chunk.index,
            total: chunk.total,
            score: chunk.score.unwrap_or_default(),
            text: &chunk.text,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }
    for hit in &hits {
        println!(
            "{}. {} [{}/{}] (score: {:.3})",
            hit.rank,
            hit.document_name,
            hit.index + 1,
            hit.total,
            hit.score
        );
        println!("   {}", hit.text.replace('\n', "\n   "));
        println!();
    }
    Ok(())
}

async fn run_groups(store: &GroupStore, args: GroupsArgs) -> Result<()> {
    let groups = store
        .list_groups()
        .await
        .with_context(|| format!("Failed to list {}", store.root().display()))?;

    let entries: Vec<GroupEntry<'_>> = groups
        .iter()
        .map(|info| GroupEntry {
            group_name: &info.group_name,
            file_name: &info.file_name,
            modified_secs: info
                .file_mtime
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            println!("{}\t{}", entry.group_name, entry.file_name);
        }
    }
    Ok(())
}

async fn run_summary(store: &GroupStore, args: SummaryArgs) -> Result<()> {
    let summary = store
        .summary(&args.group)
        .await
        .with_context(|| format!("Failed to load group '{}'", args.group))?;

    if let Some(document) = args.document {
        let text = summary
            .get(&document)
            .with_context(|| format!("'{document}' not found in group '{}'", args.group))?;
        println!("{text}");
        return Ok(());
    }
    for (name, text) in summary.iter() {
        println!("## {name}");
        println!("{text}");
        println!();
    }
    Ok(())
}
