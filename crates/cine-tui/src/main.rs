mod action;
mod app;
mod controller;
mod dropdown;
mod focus;
mod gateway;
mod history;
mod pointer;
mod suggest;
mod theme;
mod ui;
mod view_state;
mod widgets;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use cine_proto::config::{Config, API_BASE_ENV};
use cine_proto::nav::Location;

/// Terminal client for the CineMatch recommendation service.
#[derive(Debug, Parser)]
#[command(name = "cinematch", version, about)]
struct Args {
    /// Base URL of the recommendation service.
    #[arg(long, env = API_BASE_ENV)]
    api_base: Option<String>,

    /// Config file to use instead of the per-user one.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start at a location, e.g. "/?q=Dune&type=movie".
    #[arg(long, default_value = "/")]
    location: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_path = cine_proto::platform::log_path();
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but keep HTTP
    // client internals quiet.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("cinematch log: {}", log_path.display());

    tracing::info!("cinematch starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let loaded = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        tracing::warn!("config unreadable, using defaults: {:#}", e);
        Config::default()
    });
    config.apply_env();
    if let Some(base) = &args.api_base {
        config.override_api_base(base);
    }

    // ── Gateway + controller ─────────────────────────────────────────────────
    let gateway = gateway::HttpGateway::new(&config.api)?;
    tracing::info!("recommendation service at {}", gateway.base_url());
    let (controller, controller_rx) = controller::Controller::new(
        Arc::new(gateway),
        &config.search,
        Location::parse(&args.location),
    );

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(controller, config.images.base_url.clone());
    app.run(controller_rx).await?;

    Ok(())
}
