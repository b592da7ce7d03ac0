//! Route registry
//!
//! Append-only list of `(method, url, handler)` entries keyed for the HTTP
//! collaborator. Entries are registered by the plugin manager during
//! activation and converted into an `axum::Router` once the batch settles.
//! There is no retraction: a registered route stays visible process-wide.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::routing::{MethodFilter, MethodRouter};
use indexmap::IndexMap;
use tokio::sync::RwLock;

/// Request handler bound to a registered route
#[async_trait]
pub trait RouteHandler: Send + Sync {
    /// Handle one request
    async fn handle(&self, req: Request<Body>) -> Response;
}

/// Shared, clonable route handler
pub type SharedRouteHandler = Arc<dyn RouteHandler>;

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> RouteHandler for FnHandler<F>
where
    F: Fn(Request<Body>) -> Fut + Send + Sync,
    Fut: Future<Output = Response> + Send,
{
    async fn handle(&self, req: Request<Body>) -> Response {
        (self.0)(req).await
    }
}

/// Wrap an async closure as a [`SharedRouteHandler`]
pub fn handler_fn<F, Fut>(f: F) -> SharedRouteHandler
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// One registered route
#[derive(Clone)]
pub struct RouteEntry {
    /// HTTP method
    pub method: Method,
    /// Effective URL the route answers on
    pub url: String,
    /// Bound handler
    pub handler: SharedRouteHandler,
}

/// Shared route registry
#[derive(Clone, Default)]
pub struct RouteRegistry {
    inner: Arc<RwLock<Vec<RouteEntry>>>,
}

impl RouteRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route entry
    pub async fn register(&self, method: Method, url: impl Into<String>, handler: SharedRouteHandler) {
        let url = url.into();
        tracing::debug!(method = %method, url = %url, "route registered");
        self.inner.write().await.push(RouteEntry {
            method,
            url,
            handler,
        });
    }

    /// Snapshot of all registered entries, in registration order
    pub async fn entries(&self) -> Vec<RouteEntry> {
        self.inner.read().await.clone()
    }

    /// Number of registered routes
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether no routes are registered
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Build an `axum::Router` from the current entries
    ///
    /// Exact `(method, url)` duplicates are skipped with a warning; the
    /// router can hold only one handler per match. Entries whose URL does
    /// not begin with `/` are skipped likewise rather than aborting the
    /// whole build.
    pub async fn to_router(&self) -> Router {
        let entries = self.entries().await;

        let mut by_url: IndexMap<String, Vec<(Method, SharedRouteHandler)>> = IndexMap::new();
        for entry in entries {
            if !entry.url.starts_with('/') {
                tracing::warn!(url = %entry.url, "route URL must begin with '/', skipping");
                continue;
            }
            let methods = by_url.entry(entry.url.clone()).or_default();
            if methods.iter().any(|(m, _)| *m == entry.method) {
                tracing::warn!(
                    method = %entry.method,
                    url = %entry.url,
                    "duplicate route, keeping the first registration"
                );
                continue;
            }
            methods.push((entry.method, entry.handler));
        }

        let mut router = Router::new();
        for (url, methods) in by_url {
            let mut method_router = MethodRouter::new();
            for (method, handler) in methods {
                let Ok(filter) = MethodFilter::try_from(method.clone()) else {
                    tracing::warn!(method = %method, url = %url, "unroutable method, skipping");
                    continue;
                };
                method_router = method_router.on(filter, move |req: Request<Body>| {
                    let handler = handler.clone();
                    async move { handler.handle(req).await }
                });
            }
            router = router.route(&url, method_router);
        }

        router
    }
}

/// Join a URL prefix and a relative URL without duplicate slashes
///
/// The result always begins with `/`; empty segments collapse.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    let mut url = String::with_capacity(base.len() + path.len() + 2);
    url.push('/');

    for segment in base.split('/').chain(path.split('/')) {
        if segment.is_empty() {
            continue;
        }
        if !url.ends_with('/') {
            url.push('/');
        }
        url.push_str(segment);
    }

    url
}
