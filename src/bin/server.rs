//! Pagelens server
//!
//! Serves two rendering endpoints backed by per-request headless Chrome
//! sessions: `GET /screenshot?url=...` (full-page capture forwarded to the
//! media-upload endpoint) and `GET /scrape?url=...` (structured content).

use anyhow::Result;
use clap::Parser;
use pagelens::browser::{BrowserConfig, DirectLaunch};
use pagelens::nav::NavigationOptions;
use pagelens::server::{AppState, DEFAULT_MAX_SESSIONS, router};
use pagelens::upload::{DEFAULT_UPLOAD_ENDPOINT, Uploader};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "pagelens-server")]
#[command(version)]
#[command(about = "Page rendering service: full-page screenshots and content scraping", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "3000")]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    executable_path: Option<String>,

    /// Maximum number of concurrently live browser sessions
    #[arg(long, default_value_t = DEFAULT_MAX_SESSIONS)]
    max_sessions: usize,

    /// Media-upload endpoint that receives screenshot bytes
    #[arg(long, value_name = "URL", default_value = DEFAULT_UPLOAD_ENDPOINT)]
    upload_endpoint: String,

    /// Base delay in milliseconds for the linear launch backoff
    #[arg(long, default_value = "500")]
    backoff_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = BrowserConfig::new().backoff_base(Duration::from_millis(cli.backoff_ms));
    if let Some(path) = &cli.executable_path {
        config = config.chrome_path(path);
    }

    let state = AppState::new(
        Arc::new(DirectLaunch::new(config)),
        NavigationOptions::default(),
        Uploader::new(cli.upload_endpoint.clone()),
        cli.max_sessions,
    );

    let bind_addr = format!("{}:{}", cli.bind, cli.port);
    log::info!(
        "pagelens v{} listening on {}",
        env!("CARGO_PKG_VERSION"),
        bind_addr
    );
    log::info!("screenshot uploads go to {}", cli.upload_endpoint);
    log::info!("session limit: {}", cli.max_sessions);
    if let Some(path) = &cli.executable_path {
        log::info!("browser executable: {}", path);
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
