//! phpsig - Main Entry Point
//!
//! Scans PHP sources into structural signature reports, or serves the
//! signature engine over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use phpsig::api::{self, AppState};
use phpsig::ast_engine::{AstSource, CommandSource, JsonDumpSource};
use phpsig::batch::{BatchConfig, BatchProcessor};
use phpsig::processing::FileDiscovery;
use phpsig::types::{render_report, LogFormat, SignatureConfig};

/// Extension of pre-dumped syntax tree files.
const JSON_DUMP_EXTENSION: &str = "json";

#[derive(Parser, Debug)]
#[command(name = "phpsig", version, about = "Structural signatures for PHP sources")]
struct Cli {
    /// Configuration file (defaults to ./phpsig.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_parser = ["text", "json"])]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the signature report for a file or directory
    Scan {
        /// File or directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Inputs are pre-dumped JSON syntax trees rather than PHP sources
        #[arg(long)]
        json_ast: bool,

        /// Number of files processed concurrently
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Serve the signature API over HTTP
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("phpsig=info,tower_http=debug"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = SignatureConfig::load(cli.config.as_deref())?;
    match cli.log_format.as_deref() {
        Some("json") => config.log_format = LogFormat::Json,
        Some("text") => config.log_format = LogFormat::Text,
        _ => {}
    }
    init_tracing(config.log_format);

    info!("Starting phpsig v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Scan {
            path,
            json_ast,
            workers,
        } => {
            if let Some(workers) = workers {
                config = config.with_workers(workers);
            }
            scan(config, path, json_ast).await
        }
        Command::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            serve(config).await
        }
    }
}

async fn scan(mut config: SignatureConfig, target: PathBuf, json_ast: bool) -> Result<()> {
    if json_ast {
        config.file_extension = JSON_DUMP_EXTENSION.to_string();
    }
    let discovery = FileDiscovery::from_config(&config)?;
    let discovered = discovery
        .discover(&target)
        .with_context(|| format!("Cannot scan {}", target.display()))?;

    let source: Arc<dyn AstSource> = if json_ast {
        Arc::new(JsonDumpSource)
    } else {
        Arc::new(CommandSource::from_config(&config))
    };

    let batch = BatchProcessor::new(source, BatchConfig::from(&config));
    let (reports, result) = batch
        .process_batch(&discovered.root, discovered.files)
        .await;

    print!("{}", render_report(&reports));
    info!(
        processed = result.processed_files,
        failed = result.failed_files,
        "Scan complete"
    );
    Ok(())
}

async fn serve(config: SignatureConfig) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = api::router(Arc::new(AppState { config }));

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
