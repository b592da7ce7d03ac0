//! HTTP API server for the hammer host
//!
//! Hosts the built-in endpoints (health, auth, plugin administration) and
//! mounts every plugin-declared route from the route registry. The registry
//! is converted to a router once the plugin batch settles; routes registered
//! after that point are not picked up (deactivation does not retract them
//! either).

pub mod auth;
pub mod health;
pub mod plugins;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::Authentication;
use crate::db::DbPool;
use crate::plugins::PluginManager;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Database pool
    pub db: DbPool,
    /// Token authentication service
    pub auth: Arc<Authentication>,
    /// The plugin manager, for administration endpoints
    pub manager: Arc<PluginManager>,
}

/// Assemble the full application router
///
/// `plugin_routes` is the router built from the route registry after
/// `initialize()` settled.
pub fn build_router(state: Arc<ApiState>, plugin_routes: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health::router())
        .merge(health::ready_router(state.clone()))
        .nest("/api/auth", auth::router(state.clone()))
        .nest("/api/plugins", plugins::router(state))
        .merge(plugin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
