mod chat;
mod loader;
mod server;
mod state;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use sbyec_core::config::{Config, Settings};
use sbyec_crawl::SiteCrawler;
use sbyec_hybrid::{ingest, open_store, open_text_index, IndexStatus};

use crate::loader::{IndexLoader, RouterLoader};
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "sbyec", about = "Question answering over the SBYEC website", version)]
struct Cli {
    /// Log debug output (routing decisions, retrieval)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk the corpus and rebuild the indexes
    Ingest {
        /// Corpus directory (defaults to data.raw_txt_dir)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Answer one question
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Interactive chat
    Chat,
    /// Show the passages retrieved for a query
    Search {
        query: Vec<String>,
        #[arg(short)]
        k: Option<usize>,
        /// BM25 only, with highlighted snippets
        #[arg(long)]
        snippets: bool,
    },
    /// Report index freshness
    Status,
    /// Fetch the website into the corpus directory
    Crawl {
        /// Only refresh the events page
        #[arg(long)]
        events_only: bool,
    },
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let mut settings = config.settings()?;

    match cli.command {
        Commands::Ingest { data_dir } => {
            if let Some(dir) = data_dir {
                settings.data.raw_txt_dir = dir.to_string_lossy().to_string();
            }
            let manifest = ingest(&settings)?;
            println!("Indexed {} files into {} passages", manifest.file_count, manifest.chunk_count);
            println!("Manifest: {}", settings.data.manifest_path().display());
        }
        Commands::Ask { question } => {
            let router = IndexLoader::new(settings).load()?;
            println!("{}", router.ask(&question.join(" ")));
        }
        Commands::Chat => {
            let state = load_state(&settings)?;
            chat::run(&state, &settings.organization, std::io::stdin().lock(), std::io::stdout())?;
        }
        Commands::Search { query, k, snippets } => {
            let k = k.unwrap_or(settings.retrieval.top_k);
            if snippets {
                search_snippets(&settings, &query.join(" "), k)?;
            } else {
                search(&settings, &query.join(" "), k)?;
            }
        }
        Commands::Status => status(&settings)?,
        Commands::Crawl { events_only } => {
            let mut crawler = SiteCrawler::new(&settings.crawler, &settings.organization, &settings.data.raw_txt_path())?;
            if events_only {
                match crawler.crawl_events_only()? {
                    Some(path) => println!("Events updated: {}", path.display()),
                    None => println!("Failed to fetch events"),
                }
            } else {
                println!("Saved to: {}", crawler.crawl_all()?.display());
            }
        }
        Commands::Serve { host, port } => {
            let state = load_state(&settings)?;
            let host = host.unwrap_or_else(|| settings.server.host.clone());
            let port = port.unwrap_or(settings.server.port);
            // The state outlives the runtime so routers are never dropped on a worker.
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(state.clone(), &host, port))?;
            drop(runtime);
            drop(state);
        }
    }
    Ok(())
}

fn load_state(settings: &Settings) -> Result<AppState> {
    let loader = IndexLoader::new(settings.clone());
    let router = loader.load()?;
    let loader: Arc<dyn RouterLoader> = Arc::new(loader);
    Ok(AppState::new(loader, router, format!("{} Chatbot API", settings.organization.short_name)))
}

fn search(settings: &Settings, query: &str, k: usize) -> Result<()> {
    let store = open_store(settings)?;
    let hits = store.query(query, k)?;
    if hits.is_empty() {
        println!("No passages found");
    }
    for (rank, hit) in hits.iter().enumerate() {
        println!("{}. [{:.3} {:?}] {}", rank + 1, hit.score, hit.source, hit.id);
        println!("   {}\n", hit.content.replace('\n', "\n   "));
    }
    Ok(())
}

fn search_snippets(settings: &Settings, query: &str, k: usize) -> Result<()> {
    let index = open_text_index(settings)?;
    for (rank, r) in index.search_with_snippets(query, k)?.iter().enumerate() {
        println!("{}. [{:.3}] {} ({})", rank + 1, r.score, r.id, r.path);
        println!("   {}\n", r.snippet);
    }
    Ok(())
}

fn status(settings: &Settings) -> Result<()> {
    let status = IndexStatus::check(settings)?;
    println!("Corpus: {} files in {}", status.corpus.file_count, settings.data.raw_txt_path().display());
    if let Some(modified) = status.corpus.latest_modified {
        println!("Newest file: {}", modified.to_rfc3339());
    }
    match &status.manifest {
        Some(m) => {
            println!("Index built: {} ({} passages, {})", m.built_at.to_rfc3339(), m.chunk_count, m.generation);
            println!("Embedder: {}", m.embedder_id.as_deref().unwrap_or("none (text only)"));
        }
        None => println!("Index: not built"),
    }
    println!("Updates available: {}", status.needs_refresh());
    Ok(())
}
