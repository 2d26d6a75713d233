use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use reelpage_api::{
    api::{create_router, AppState},
    config::Config,
    db::{create_redis_client, load_catalog, Cache},
    services::{
        providers::{
            tmdb::{RetryPolicy, TmdbPosterGateway},
            PlaceholderPosterGateway, PosterGateway,
        },
        RecommendationService,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let session_idle_ttl = config.session_idle_ttl()?;

    // Catalog/matrix mismatches abort startup
    let store = load_catalog(&config.catalog_dir)
        .await
        .and_then(|data| data.into_store())
        .with_context(|| format!("Failed to load catalog from {}", config.catalog_dir))?;
    let store = Arc::new(store);

    let (cache, cache_handle) = match &config.redis_url {
        Some(url) => {
            let (cache, handle) = Cache::new(create_redis_client(url)?);
            (Some(cache), Some(handle))
        }
        None => {
            tracing::info!("REDIS_URL not set, poster caching disabled");
            (None, None)
        }
    };

    let gateway: Arc<dyn PosterGateway> = if config.tmdb_api_key.is_empty() {
        tracing::warn!("TMDB_API_KEY is empty, serving placeholder posters");
        Arc::new(PlaceholderPosterGateway)
    } else {
        Arc::new(TmdbPosterGateway::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.tmdb_image_url.clone(),
            Duration::from_secs(config.poster_timeout_secs),
            RetryPolicy {
                attempts: config.poster_retry_attempts,
                delay: Duration::from_millis(config.poster_retry_delay_ms),
            },
            cache,
        )?)
    };

    let service =
        RecommendationService::new(store, gateway, config.primary_k, config.page_size)?;
    let state = AppState::new(service, session_idle_ttl);

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
