use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use mcpstore::config::StoreConfig;
use mcpstore::gateway::StdioGateway;
use mcpstore::AppContext;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "mcpstored",
    about = "MCP app store — registry and installation-state engine",
    version
)]
struct Args {
    /// Data directory for settings and config.toml
    #[arg(long, env = "MCPSTORE_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "MCPSTORE_LOG")]
    log: Option<String>,

    /// Executable for the native gateway helper
    #[arg(long, env = "MCPSTORE_GATEWAY")]
    gateway: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Arc::new(StoreConfig::new(args.data_dir, args.log, args.gateway));

    init_tracing(&config);

    let gateway = StdioGateway::spawn(&config.gateway_command, &config.gateway_args)
        .await
        .with_context(|| format!("failed to start gateway '{}'", config.gateway_command))?;

    let ctx = AppContext::new(config.clone(), Arc::new(gateway));

    // Mirror notifications to the log until a UI shell attaches.
    let mut notifications = ctx.broadcaster.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = notifications.recv().await {
            info!(event = %event, "notification");
        }
    });

    ctx.bootstrap().await;

    let state = ctx.store.snapshot();
    info!(
        apps = state.apps.len(),
        client = %state.current_client,
        "store ready"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}

fn init_tracing(config: &StoreConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.log)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if config.log_format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).compact().init();
    }
}
