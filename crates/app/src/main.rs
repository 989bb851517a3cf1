mod server;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use pdf_bm25_core::{
    ingest_folder, validate_limit, Bm25Params, EngineConfig, IngestionOptions, SearchEngine,
    SearchService, DEFAULT_SNIPPET_WINDOW,
};
use server::{router, AppState, ServerConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-bm25", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    ranking: RankingArgs,
}

#[derive(Args)]
struct RankingArgs {
    /// BM25 term-frequency saturation
    #[arg(long, env = "BM25_K1", default_value_t = 1.5, global = true)]
    k1: f64,

    /// BM25 length normalization strength
    #[arg(long, env = "BM25_B", default_value_t = 0.75, global = true)]
    b: f64,

    /// Snippet window in characters
    #[arg(long, env = "SNIPPET_WINDOW", default_value_t = DEFAULT_SNIPPET_WINDOW, global = true)]
    snippet_window: usize,
}

impl RankingArgs {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            params: Bm25Params {
                k1: self.k1,
                b: self.b,
            },
            snippet_window: self.snippet_window,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Serve the upload and search API over HTTP.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
        /// Folder where uploaded PDFs are stored.
        #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
        upload_dir: PathBuf,
        /// Folder loaded by `POST /load_demo`.
        #[arg(long, env = "DEMO_DIR")]
        demo_dir: Option<PathBuf>,
        /// Largest accepted request body in bytes.
        #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 25 * 1024 * 1024)]
        max_upload_bytes: usize,
        /// Page cap used when a request does not send `max_pages`.
        #[arg(long, env = "MAX_PAGES")]
        default_max_pages: Option<usize>,
    },
    /// Load a folder of PDFs and print the best matches for a query.
    Search {
        /// Folder that contains PDFs recursively.
        #[arg(long)]
        folder: PathBuf,
        /// Search query
        #[arg(long)]
        query: String,
        /// Number of results to return.
        #[arg(long, default_value = "10")]
        top_k: usize,
        /// Only read the first N pages of every PDF.
        #[arg(long)]
        max_pages: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.ranking.engine_config();
    config
        .params
        .validate()
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        k1 = config.params.k1,
        b = config.params.b,
        "pdf-bm25 boot"
    );

    match cli.command {
        Command::Serve {
            bind,
            upload_dir,
            demo_dir,
            max_upload_bytes,
            default_max_pages,
        } => {
            let service = SearchService::new(config)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            let state = AppState {
                service,
                config: Arc::new(ServerConfig {
                    upload_dir,
                    demo_dir,
                    max_upload_bytes,
                    default_max_pages,
                }),
            };

            let listener = tokio::net::TcpListener::bind(bind).await?;
            info!(%bind, "listening");
            axum::serve(listener, router(state)).await?;
        }
        Command::Search {
            folder,
            query,
            top_k,
            max_pages,
        } => {
            run_search(config, &folder, &query, top_k, max_pages)?;
        }
    }

    Ok(())
}

fn run_search(
    config: EngineConfig,
    folder: &Path,
    query: &str,
    top_k: usize,
    max_pages: Option<usize>,
) -> anyhow::Result<()> {
    let top_k = validate_limit(top_k).map_err(|error| anyhow::anyhow!(error.to_string()))?;
    let mut engine = SearchEngine::new(config);
    let options = IngestionOptions {
        max_pages,
        ..IngestionOptions::default()
    };

    let report = tokio::task::block_in_place(|| ingest_folder(&mut engine, folder, &options))
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    if !report.skipped.is_empty() {
        warn!(
            "skipped_files={} for folder={}",
            report.skipped.len(),
            folder.display()
        );
    }
    info!(folder = %folder.display(), added = report.added.len(), "documents loaded");

    let status = engine.rebuild();
    let hits = engine.search(query, top_k);

    println!("query: {query}");
    println!("documents: {} indexed: {}", status.num_docs, status.indexed);
    if hits.is_empty() {
        println!("no results");
    }
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "[{}] score={:.4} file={} doc_id={}",
            rank + 1,
            hit.score,
            hit.filename,
            hit.doc_id
        );
        println!("  {}", hit.snippet);
    }

    Ok(())
}
