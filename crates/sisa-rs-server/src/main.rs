//! Sisa HTTP server binary.

use anyhow::Context;
use clap::Parser;
use log::info;
use sisa_rs_config::SisaConfig;
use sisa_rs_core::Engine;
use sisa_rs_server::{app, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "sisa-server", about = "Travel-assistance agent routing server")]
struct Cli {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Extra configuration file applied on top of the layered defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("resolving working directory")?;
    let mut options = sisa_rs_config::LayeredConfigOptions::new(&cwd);
    if let Some(path) = &cli.config {
        options = options.with_runtime_path(path);
    }
    let layered = SisaConfig::load_layered_with_options(options).context("loading configuration")?;
    for layer in &layered.layers {
        info!("applied config layer (source={:?}, path={})", layer.source, layer.path.display());
    }
    let config = layered.config;

    let engine = Engine::bootstrap(config).context("building turn engine")?;
    let state = AppState::new(Arc::new(engine));

    let listener = tokio::net::TcpListener::bind(cli.addr)
        .await
        .with_context(|| format!("binding {}", cli.addr))?;
    info!("listening (addr={})", cli.addr);
    axum::serve(listener, app(state))
        .await
        .context("serving requests")?;
    Ok(())
}
