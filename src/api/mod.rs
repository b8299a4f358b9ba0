// src/api/mod.rs

//! HTTP surface: `/scan` (plus its legacy alias), `/visited`, and `/health`.

pub mod handlers;

use std::sync::Arc;

use axum::{Router, routing::get};
use color_eyre::eyre::{Result, WrapErr};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::core::diff_engine::DiffEngine;
use crate::core::scanner::build_http_client;
use crate::core::scanner::page_metadata::HtmlMetadataFetcher;
use crate::core::scanner::ssl_labs::SslLabsClient;
use crate::core::scanner::whois::WhoisClient;
use crate::core::snapshot::SnapshotBuilder;
use crate::logging::get_data_dir;
use crate::store::{MEMORY_DATABASE_URL, RecordStore, open_store};

/// Everything a request handler needs, shared across requests.
pub struct AppState {
    pub builder: SnapshotBuilder,
    pub engine: DiffEngine,
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new(builder: SnapshotBuilder, engine: DiffEngine, store: Arc<dyn RecordStore>) -> Self {
        Self {
            builder,
            engine,
            store,
        }
    }

    /// Wires the production adapters and opens the configured store.
    ///
    /// # Arguments
    /// * `config` - Parsed runtime settings.
    ///
    /// # Returns
    /// The shared state, or a startup error when the HTTP client cannot be
    /// built or the store cannot be opened.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let client = build_http_client(&config.user_agent, config.http_timeout())
            .wrap_err("Failed to build HTTP client")?;

        let builder = SnapshotBuilder::new(
            Arc::new(SslLabsClient::new(
                client.clone(),
                &config.scan_api_url,
                config.scan_from_cache,
                config.scan_retries,
            )),
            Arc::new(WhoisClient::new(&config.whois_server, config.whois_timeout())),
            Arc::new(HtmlMetadataFetcher::new(client)),
            config.enrichment_timeout(),
        );

        let store = open_store(&config.database_url())
            .await
            .wrap_err("Failed to open record store")?;
        let engine = DiffEngine::new(store.clone(), config.staleness_window_secs);

        Ok(Self::new(builder, engine, store))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/scan", get(handlers::scan_site))
        .route("/WebSearch", get(handlers::scan_site))
        .route("/visited", get(handlers::visited_sites))
        .route("/health", get(handlers::health_check))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin may read the responses; the service carries no credentials.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Runs the HTTP server until Ctrl-C.
pub async fn serve(config: Config) -> Result<()> {
    if config.database_url.is_none() {
        std::fs::create_dir_all(get_data_dir())?;
    }
    let state = Arc::new(AppState::from_config(&config).await?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!(addr = %config.listen, "Posture service listening.");
    if config.database_url() == MEMORY_DATABASE_URL {
        info!("History is kept in memory only.");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Posture service stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PostureError;

    #[tokio::test]
    async fn unusable_user_agent_is_a_startup_error() {
        let config = Config {
            user_agent: "bad\nagent".to_string(),
            database_url: Some(MEMORY_DATABASE_URL.to_string()),
            ..Config::default()
        };

        let error = match AppState::from_config(&config).await {
            Ok(_) => panic!("client with an invalid user agent was built"),
            Err(e) => e,
        };
        assert!(error.to_string().contains("Failed to build HTTP client"));
        assert!(error.downcast_ref::<PostureError>().is_none());
    }

    #[tokio::test]
    async fn memory_config_builds_state() {
        let config = Config {
            database_url: Some(MEMORY_DATABASE_URL.to_string()),
            ..Config::default()
        };
        let state = AppState::from_config(&config).await.unwrap();
        assert!(state.store.list_urls().await.unwrap().is_empty());
    }
}
