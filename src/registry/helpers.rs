//! Template-helper registry
//!
//! Name → handler map consumed by the template collaborator at render time.
//! A helper registers under its primary name and every declared alias. Like
//! the route registry there is no retraction; re-registering a name replaces
//! the previous handler.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

/// A template helper invocable by name
#[async_trait]
pub trait HelperHandler: Send + Sync {
    /// Run the helper against its invocation arguments
    async fn call(&self, args: &[Value]) -> anyhow::Result<Value>;
}

/// Shared, clonable helper handler
pub type SharedHelperHandler = Arc<dyn HelperHandler>;

struct FnHelper<F>(F);

#[async_trait]
impl<F, Fut> HelperHandler for FnHelper<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    async fn call(&self, args: &[Value]) -> anyhow::Result<Value> {
        (self.0)(args.to_vec()).await
    }
}

/// Wrap an async closure as a [`SharedHelperHandler`]
pub fn helper_fn<F, Fut>(f: F) -> SharedHelperHandler
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(FnHelper(f))
}

/// Shared template-helper registry
#[derive(Clone, Default)]
pub struct HelperRegistry {
    inner: Arc<RwLock<HashMap<String, SharedHelperHandler>>>,
}

impl HelperRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under every given name
    pub async fn register(&self, names: &[String], handler: SharedHelperHandler) {
        let mut map = self.inner.write().await;
        for name in names {
            if map.insert(name.clone(), handler.clone()).is_some() {
                tracing::debug!(helper = %name, "helper replaced");
            } else {
                tracing::debug!(helper = %name, "helper registered");
            }
        }
    }

    /// Look up a handler by name
    pub async fn get(&self, name: &str) -> Option<SharedHelperHandler> {
        self.inner.read().await.get(name).cloned()
    }

    /// Whether a helper is registered under `name`
    pub async fn contains(&self, name: &str) -> bool {
        self.inner.read().await.contains_key(name)
    }

    /// Invoke a helper by name
    ///
    /// # Errors
    ///
    /// Returns error if no helper is registered under `name` or the helper
    /// itself fails
    pub async fn call(&self, name: &str, args: &[Value]) -> anyhow::Result<Value> {
        let handler = self
            .get(name)
            .await
            .ok_or_else(|| anyhow::anyhow!("no helper registered as {name}"))?;
        handler.call(args).await
    }

    /// Number of registered names (aliases count separately)
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether no helpers are registered
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn upper_helper() -> SharedHelperHandler {
        helper_fn(|args: Vec<Value>| async move {
            let input = args
                .first()
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_uppercase();
            Ok(Value::String(input))
        })
    }

    #[tokio::test]
    async fn helper_is_retrievable_under_every_name() {
        let registry = HelperRegistry::new();
        registry
            .register(&["upper".to_string(), "shout".to_string()], upper_helper())
            .await;

        assert!(registry.contains("upper").await);
        assert!(registry.contains("shout").await);
        assert_eq!(registry.len().await, 2);

        let result = registry.call("shout", &[json!("hi")]).await.unwrap();
        assert_eq!(result, json!("HI"));
    }

    #[tokio::test]
    async fn unknown_helper_errors() {
        let registry = HelperRegistry::new();
        assert!(registry.call("missing", &[]).await.is_err());
        assert!(registry.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn re_registration_replaces() {
        let registry = HelperRegistry::new();
        registry
            .register(
                &["greet".to_string()],
                helper_fn(|_| async { Ok(json!("hello")) }),
            )
            .await;
        registry
            .register(
                &["greet".to_string()],
                helper_fn(|_| async { Ok(json!("goodbye")) }),
            )
            .await;

        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.call("greet", &[]).await.unwrap(), json!("goodbye"));
    }
}
