//! `pubsvcd` - the publication service binary.
//!
//! Usage:
//!   pubsvcd -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/pubsvc/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use pubsvc_core::Module;
use tracing::info;

use config::ServerConfig;

/// Publication service.
#[derive(Parser, Debug)]
#[command(name = "pubsvcd", about = "Publication service")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8000")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    // Verify configuration is valid.
    bootstrap::verify_config(&server_config)?;

    // Initialize storage.
    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = pubsvc_core::ServiceConfig {
        data_dir: Some(data_dir),
        listen: cli.listen.clone(),
        ..Default::default()
    };

    let kv: Arc<dyn pubsvc_kv::KVStore> = Arc::new(
        pubsvc_kv::RedbStore::open(&core_config.resolve_db_path())
            .map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );
    let blob: Arc<dyn pubsvc_blob::BlobStore> = Arc::new(
        pubsvc_blob::FileStore::open(&core_config.resolve_blob_dir())
            .map_err(|e| anyhow::anyhow!("failed to open blob store: {}", e))?,
    );

    let trends = match &server_config.trends {
        Some(t) => {
            let client = publication::trends::TrendClient::new(
                &t.base_url,
                Duration::from_secs(t.timeout_secs),
            )
            .map_err(|e| anyhow::anyhow!("failed to build trend client: {}", e))?;
            info!("Trend ranking at {}", client.base_url());
            Some(client)
        }
        None => {
            info!("No trend ranker configured; /trending will answer 503");
            None
        }
    };

    let publication_module = publication::PublicationModule::new(kv, blob, trends);
    info!("Publication module initialized");

    let module_routes = vec![(publication_module.name(), publication_module.routes())];
    let app = routes::build_router(module_routes);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!("pubsvcd listening on {}", core_config.listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
