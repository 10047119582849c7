//! Crawler guard server
//!
//! Serves a minimal application behind the crawler guard.

use anyhow::Result;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use crawler_guard::middleware::guard_layer;
use crawler_guard::{CrawlerGuard, CrawlerGuardConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "crawler-guard")]
#[command(author, version, about = "Crawler verification and bot filtering in front of an HTTP application")]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Path to configuration file (JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log classification diagnostics regardless of the config file
    #[arg(short, long)]
    verbose: bool,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(json: bool, level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.json_logs, &args.log_level);

    let mut config = match &args.config {
        Some(path) => CrawlerGuardConfig::from_file(path)?,
        None => CrawlerGuardConfig::default(),
    };
    if args.verbose {
        config.verbose = true;
    }

    info!(
        verbose = config.verbose,
        dns_timeout_ms = config.dns.timeout_ms,
        "Crawler guard configured"
    );

    let guard = Arc::new(CrawlerGuard::new(config));

    let app = Router::new()
        .route("/api/health", get(|| async { "ok" }))
        .fallback(|| async { "ok" })
        .layer(from_fn_with_state(guard, guard_layer));

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!(address = %args.listen, "Crawler guard listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
