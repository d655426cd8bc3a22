// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the registry endpoint.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use pluginmaster_core::PluginmasterError;
use pluginmaster_manifest::ManifestStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The store every route reads from and publishes into.
    pub store: Arc<ManifestStore>,
    /// Authentication configuration for write routes.
    pub auth: AuthConfig,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
    /// Where to persist the document after each write. `None` keeps the
    /// store in memory only.
    pub manifest_path: Option<PathBuf>,
}

impl GatewayState {
    pub fn new(store: Arc<ManifestStore>, auth: AuthConfig) -> Self {
        Self {
            store,
            auth,
            start_time: Instant::now(),
            manifest_path: None,
        }
    }

    /// Persist the document to `path` after every successful write.
    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }
}

/// Gateway server configuration (mirrors `GatewayConfig` from pluginmaster-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Route serving the manifest document.
    pub manifest_route: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            manifest_route: "/pluginmaster.json".to_string(),
        }
    }
}

/// Build the router:
/// - GET {manifest_route}
/// - GET /health
/// - GET /v1/plugins/{name}
/// - GET /v1/plugins/{name}/history
/// - POST /v1/plugins (with auth)
/// - POST /v1/plugins/{name}/deprecate (with auth)
pub fn router(config: &ServerConfig, state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route(&config.manifest_route, get(handlers::get_manifest))
        .route("/health", get(handlers::get_health))
        .route("/v1/plugins/{name}", get(handlers::get_plugin))
        .route("/v1/plugins/{name}/history", get(handlers::get_history))
        .with_state(state.clone());

    let write_routes = Router::new()
        .route("/v1/plugins", post(handlers::post_plugin))
        .route("/v1/plugins/{name}/deprecate", post(handlers::post_deprecate))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(write_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind to the configured host:port and serve until `shutdown` resolves.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), PluginmasterError> {
    let app = router(config, state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PluginmasterError::Server {
            message: format!("failed to bind registry to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!(%addr, route = %config.manifest_route, "registry listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| PluginmasterError::Server {
            message: format!("registry server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("registry stopped");
    Ok(())
}
