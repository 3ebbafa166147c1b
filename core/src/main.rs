/// Deskline sync core - Main entry point
use deskline_core::rest::RestClient;
use deskline_core::store::ClientStore;
use deskline_core::{Config, Gateway, SyncEngine};
use std::env;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse configuration
    let args: Vec<String> = env::args().collect();
    let config = Config::from_args(&args)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    // Local store holds the credential and per-conversation notes
    let store = match &config.data_dir {
        Some(dir) => Some(
            ClientStore::new(dir).map_err(|e| anyhow::anyhow!("Store error: {}", e))?,
        ),
        None => None,
    };

    let token = match (&config.token, &store) {
        (Some(token), _) => Some(token.clone()),
        (None, Some(store)) => store
            .credential()
            .map_err(|e| anyhow::anyhow!("Store error: {}", e))?,
        (None, None) => None,
    };

    let rest = RestClient::new(&config, token)
        .map_err(|e| anyhow::anyhow!("Client error: {}", e))?;
    let mut engine = SyncEngine::new(Arc::new(rest));
    if let Some(store) = store {
        engine = engine.with_store(store);
    }

    let gateway = Gateway::new(engine, config.push_url.clone(), config.refresh_interval);
    info!("🚀 Starting Deskline sync core");
    info!("   API base: {}", config.api_base);
    info!("   Push channel: {}", config.push_url);

    tokio::select! {
        result = gateway.run() => {
            result.map_err(|e| anyhow::anyhow!("Gateway error: {}", e))?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received, shutting down");
            gateway.shutdown().await;
        }
    }

    Ok(())
}
