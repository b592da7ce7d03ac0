//! Plugin administration endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use serde::Serialize;

use super::ApiState;

/// Plugin info returned by the API
#[derive(Serialize)]
pub struct PluginResponse {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub privileged: bool,
    pub folder: String,
}

/// Build plugin administration routes (token-protected)
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(list_plugins))
        .route("/{name}/deactivate", post(deactivate_plugin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            super::auth::require_token,
        ))
        .with_state(state)
}

/// List all active plugins
async fn list_plugins(State(state): State<Arc<ApiState>>) -> Json<Vec<PluginResponse>> {
    let plugins = state
        .manager
        .list()
        .await
        .into_iter()
        .map(|p| PluginResponse {
            name: p.manifest.name,
            version: p.manifest.version,
            privileged: p.privileged,
            folder: p.folder.display().to_string(),
        })
        .collect();
    Json(plugins)
}

/// Deactivate a plugin by name
///
/// Routes and helpers the plugin registered stay registered.
async fn deactivate_plugin(
    State(state): State<Arc<ApiState>>,
    Path(name): Path<String>,
) -> StatusCode {
    if state.manager.get(&name).await.is_none() {
        return StatusCode::NOT_FOUND;
    }

    match state.manager.deactivate(&name).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::error!(plugin = %name, error = %e, "deactivation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
