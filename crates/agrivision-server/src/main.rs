//! AgriVision360 chat proxy.
//!
//! Loads settings, builds the completion client and the session-aware chat
//! service, then serves `POST /chat` until interrupted.

use agrivision_core::llm::providers::create_llm_client;
use agrivision_core::{ChatService, ConfigLoader};
use agrivision_server::{shutdown_signal, ChatServer, ServerConfig};
use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[clap(author, version, about = "AgriVision Server - Run the AgriVision360 chat proxy")]
struct Cli {
    #[clap(long, short, help = "Path to a YAML configuration file (defaults are used when omitted)")]
    config: Option<PathBuf>,

    #[clap(long, default_value = "0.0.0.0:8000")]
    bind_addr: String,

    #[clap(long, short, default_value = "info")]
    log_level: String,

    #[clap(long, value_delimiter = ',', help = "Comma separated list of allowed CORS origins (any origin when omitted)")]
    cors_origins: Vec<String>,

    #[clap(long, help = "Disable CORS headers entirely")]
    no_cors: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    match &cli.config {
        Some(path) => log::info!("Loading configuration from: {}", path.display()),
        None => log::info!("No configuration file given, using defaults"),
    }
    let app_config = ConfigLoader::load(cli.config.as_deref()).await?;
    log::info!(
        "Using model {} at {} with {:?} retention",
        app_config.llm.model,
        app_config.llm.api_base,
        app_config.memory.strategy
    );

    let llm = create_llm_client(&app_config.llm)?;
    let chat = Arc::new(ChatService::from_config(&app_config, llm));

    let server_config = ServerConfig::new()
        .with_bind_addr_str(&cli.bind_addr)?
        .with_cors(!cli.no_cors)
        .with_cors_origins(cli.cors_origins)
        .with_logging(true)
        .with_sweep_interval(app_config.sessions.sweep_interval());

    let server = ChatServer::with_config(chat, server_config);

    if let Err(e) = server.serve_with_shutdown(shutdown_signal()).await {
        log::error!("Server failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}
