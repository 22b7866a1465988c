use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use marquee_api::{
    api::{create_router, AppState},
    config::Config,
    db::{create_pool, create_redis_client, postgres::run_migrations, Cache},
    services::{
        playlists::PostgresPlaylistRepo,
        providers::{omdb::OmdbProvider, tmdb::TmdbProvider},
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    tracing::info!("Database ready");

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client).await;

    let metadata = Arc::new(OmdbProvider::new(
        cache.clone(),
        config.omdb_api_key.clone(),
        config.omdb_api_url.clone(),
    ));
    let discovery = Arc::new(TmdbProvider::new(
        cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
    ));
    let playlists = Arc::new(PostgresPlaylistRepo::new(pool));

    let state = AppState::new(metadata, discovery, playlists);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Flush pending cache writes before exiting
    cache_writer.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
