use std::sync::Arc;

use anyhow::Result;
use movie_ratings::api;
use movie_ratings::catalog::CatalogHandle;
use movie_ratings::config::AppConfig;
use movie_ratings::remote::{OmdbClient, RemoteCache, RemoteProvider};
use movie_ratings::service::QueryService;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .pretty()
        .init();

    let config = AppConfig::from_env()?;
    info!(
        data_dir = %config.data_dir.display(),
        bind_addr = %config.bind_addr,
        remote_enabled = config.omdb_api_key.is_some(),
        "loaded configuration"
    );

    let remote = build_remote(&config)?;
    let service = QueryService::new(CatalogHandle::from_data_dir(config.data_dir.clone()), remote)
        .with_fuzzy(config.fuzzy_limit, config.fuzzy_threshold);

    match service.catalog().get().await {
        Ok(catalog) => info!(titles = catalog.len(), "local catalog ready"),
        Err(err) => warn!(error = ?err, "local catalog unavailable, retrying on first query"),
    }

    let app = api::router(api::AppState::new(service));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "starting http server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn build_remote(config: &AppConfig) -> Result<RemoteProvider> {
    let Some(api_key) = config.omdb_api_key.clone() else {
        warn!("OMDB_API_KEY not set, remote lookups disabled");
        return Ok(RemoteProvider::disabled());
    };

    let client = OmdbClient::new(
        api_key,
        config.omdb_base_url.clone(),
        config.remote_timeout,
    )?;
    let cache = RemoteCache::new(config.cache_max_entries, config.cache_ttl);
    Ok(RemoteProvider::new(Arc::new(client), cache).with_fuzzy_limit(config.fuzzy_limit))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
