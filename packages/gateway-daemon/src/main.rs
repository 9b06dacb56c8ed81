use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use voxgate_core::{Config, FactoryRegistry, PoolManager, WorkerPool, WorkerPoolConfig};

mod http;

#[derive(Parser, Debug)]
#[command(name = "voxgate-gatewayd", about = "Voice-assistant gateway resource and task orchestration daemon")]
struct Cli {
    /// Path to the gateway's TOML configuration file.
    #[arg(short, long, default_value = "voxgate.toml")]
    config: PathBuf,

    /// Address the status HTTP surface binds to.
    #[arg(long, default_value = "127.0.0.1:8088")]
    listen: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    voxgate_core::logging::init(cli.log_level.as_deref());

    let config = Config::load(&cli.config).with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Concrete provider factories are registered by whatever embeds this
    // binary against real backends; this daemon only wires the core
    // orchestration layer around whatever registry it is handed.
    let registry = FactoryRegistry::new();

    log::info!("running pre-flight health checks and building provider pools");
    let pool_manager = Arc::new(
        PoolManager::build(&registry, config.health_check_config())
            .await
            .context("pool manager construction failed")?,
    );

    let worker_pool = WorkerPool::new(WorkerPoolConfig::default());

    let listen_addr = cli.listen.clone();
    log::info!("voxgate-gatewayd listening on {}", listen_addr);

    let app = http::build_router(Arc::clone(&pool_manager));
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("binding status listener on {}", listen_addr))?;

    tokio::select! {
        result = axum::serve(listener, app) => {
            result.context("status http server failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("shutdown signal received");
        }
    }

    worker_pool.close().await;
    pool_manager.close().await;
    Ok(())
}
