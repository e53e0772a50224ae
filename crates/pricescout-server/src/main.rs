mod api;
mod middleware;

use std::sync::Arc;

use pricescout_core::RegionCatalog;
use pricescout_scraper::{FetchSettings, HttpFetcher, SearchEngine, SearchOptions};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = pricescout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if config.serpapi_api_key.is_none() {
        tracing::warn!("SERPAPI_API_KEY not set; search API sources disabled");
    }
    let catalog = Arc::new(RegionCatalog::for_config(&config)?);
    let fetcher = Arc::new(HttpFetcher::new(FetchSettings::from(&config))?);
    let engine = SearchEngine::new(catalog, fetcher, SearchOptions::from(&config));

    let app = build_app(AppState {
        engine: Arc::new(engine),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "pricescout server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
