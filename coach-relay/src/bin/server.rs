//! Coach relay server binary

use anyhow::{Context, Result};
use coach::api::{create_router, ApiState};
use coach::provider;
use coach::RelayConfig;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Config path is optional; without one, defaults plus environment apply
    let config = match std::env::args().nth(1) {
        Some(path) => RelayConfig::load(Path::new(&path))
            .with_context(|| format!("Failed to load config file: {}", path))?,
        None => RelayConfig::default(),
    };

    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting coach relay v{}", env!("CARGO_PKG_VERSION"));

    let Some(api_key) = config.resolve_api_key() else {
        error!(
            provider = %config.provider.provider_type,
            "No API key configured (set {} or provider.api_key)",
            config.provider.api_key_env()
        );
        std::process::exit(1);
    };

    let provider = provider::from_config(&config.provider, &api_key)
        .context("Failed to create model provider")?;
    info!(
        provider = provider.name(),
        model = provider.model(),
        "Model provider ready"
    );

    let state = Arc::new(ApiState {
        provider,
        limits: config.limits.clone(),
        temperature: config.provider.temperature,
        max_tokens: config.provider.max_tokens,
    });

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
