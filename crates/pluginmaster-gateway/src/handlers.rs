// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the registry endpoint.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use pluginmaster_core::{PluginmasterError, StoreError};
use pluginmaster_manifest::{ManifestStore, PluginDescriptor, PublishOutcome};
use serde::{Deserialize, Serialize};

use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Plugins in the served document.
    pub plugins: usize,
    /// Snapshot generation currently served.
    pub generation: u64,
}

/// Response body for POST /v1/plugins.
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    /// `created`, `new_version`, `refreshed` or `unchanged`.
    pub outcome: &'static str,
    pub plugin: PluginDescriptor,
}

/// Request body for POST /v1/plugins/{name}/deprecate.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeprecateRequest {
    pub reason: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A handler failure rendered as a status code plus [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError(pub PluginmasterError);

impl<E: Into<PluginmasterError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            PluginmasterError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PluginmasterError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            PluginmasterError::Store(StoreError::Deprecated { .. }) => StatusCode::GONE,
            PluginmasterError::Store(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// GET /pluginmaster.json (route is configurable)
///
/// Serves the pre-rendered document. A matching `If-None-Match` gets a 304.
pub async fn get_manifest(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    let manifest = state.store.serve();
    let etag = HeaderValue::from_str(&manifest.etag).ok();

    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| etag_matches(v, &manifest.etag));

    let mut response = if not_modified {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        let mut response = Body::from(Bytes::from_owner(manifest.body.clone())).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        response
    };

    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    if let Some(etag) = etag {
        headers.insert(header::ETAG, etag);
    }
    response
}

/// `If-None-Match` may list several tags, weak tags, or `*`.
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}

/// GET /v1/plugins/{name}
pub async fn get_plugin(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
) -> Result<Json<PluginDescriptor>, ApiError> {
    Ok(Json(state.store.get(&name)?))
}

/// GET /v1/plugins/{name}/history
///
/// Every published version, oldest first. Deprecated plugins keep their history.
pub async fn get_history(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<PluginDescriptor>>, ApiError> {
    Ok(Json(state.store.history(&name)?))
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let snapshot = state.store.snapshot();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        plugins: snapshot.active_count(),
        generation: snapshot.generation(),
    })
}

/// POST /v1/plugins
///
/// Publishes a descriptor. 201 for a new plugin, 200 otherwise.
pub async fn post_plugin(
    State(state): State<GatewayState>,
    Json(descriptor): Json<PluginDescriptor>,
) -> Result<Response, ApiError> {
    let name = descriptor.name.clone();
    let (outcome, plugin) = write(&state, move |store| {
        let outcome = store.publish(descriptor)?;
        Ok((outcome, store.get(&name)?))
    })
    .await?;

    tracing::info!(plugin = %plugin.name, version = ?plugin.version, outcome = outcome_label(&outcome), "publish");

    let status = if outcome == PublishOutcome::Created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let body = PublishResponse {
        outcome: outcome_label(&outcome),
        plugin,
    };
    Ok((status, Json(body)).into_response())
}

/// POST /v1/plugins/{name}/deprecate
pub async fn post_deprecate(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
    Json(body): Json<DeprecateRequest>,
) -> Result<StatusCode, ApiError> {
    if body.reason.trim().is_empty() {
        return Err(ApiError(PluginmasterError::Validation(
            pluginmaster_core::ValidationError::MissingField { field: "reason" },
        )));
    }
    write(&state, move |store| store.deprecate(&name, body.reason.trim())).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Run a store write off the async runtime, then persist if configured.
async fn write<T, F>(state: &GatewayState, apply: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ManifestStore) -> Result<T, PluginmasterError> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    let manifest_path = state.manifest_path.clone();

    let result = tokio::task::spawn_blocking(move || {
        let value = apply(&store)?;
        if let Some(path) = manifest_path.as_deref() {
            store.persist(path)?;
        }
        Ok::<_, PluginmasterError>(value)
    })
    .await
    .map_err(|e| PluginmasterError::Internal(format!("store write task failed: {e}")))?;

    Ok(result?)
}

fn outcome_label(outcome: &PublishOutcome) -> &'static str {
    match outcome {
        PublishOutcome::Created => "created",
        PublishOutcome::NewVersion => "new_version",
        PublishOutcome::Refreshed => "refreshed",
        PublishOutcome::Unchanged => "unchanged",
    }
}
