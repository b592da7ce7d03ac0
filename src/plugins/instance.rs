//! The plugin-facing contract
//!
//! An activated plugin is a trait object the manager interrogates once for
//! its declared capabilities. Capability sources are tagged: a plugin hands
//! over either a ready-made list or a producer the manager resolves exactly
//! once at registration time.

use async_trait::async_trait;
use axum::http::Method;

use crate::registry::{SharedHelperHandler, SharedRouteHandler};

/// One route a plugin wants mounted
#[derive(Clone)]
pub struct RouteDecl {
    /// HTTP method
    pub method: Method,
    /// Route URL, relative to the composed prefix
    pub url: String,
    /// Bound handler
    pub handler: SharedRouteHandler,
    /// Per-route prefix overriding the global plugin base URL
    pub base_url: Option<String>,
    /// Mount at exactly `url`, ignoring any prefix
    pub no_base_url: bool,
}

impl RouteDecl {
    /// Declare a route under the global plugin base URL
    pub fn new(method: Method, url: impl Into<String>, handler: SharedRouteHandler) -> Self {
        Self {
            method,
            url: url.into(),
            handler,
            base_url: None,
            no_base_url: false,
        }
    }

    /// Override the global base URL for this route
    #[must_use]
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = Some(base.into());
        self
    }

    /// Mount this route at its literal URL with no prefix
    #[must_use]
    pub const fn without_base(mut self) -> Self {
        self.no_base_url = true;
        self
    }
}

/// One template helper a plugin wants registered
#[derive(Clone)]
pub struct HelperDecl {
    /// Primary helper name
    pub name: String,
    /// Additional names resolving to the same handler
    pub aliases: Vec<String>,
    /// Bound handler
    pub handler: SharedHelperHandler,
}

impl HelperDecl {
    /// Declare a helper under a single name
    pub fn new(name: impl Into<String>, handler: SharedHelperHandler) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            handler,
        }
    }

    /// Add alias names for the same handler
    #[must_use]
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }
}

/// Where a plugin's route declarations come from
pub enum RouteSource {
    /// An eager list
    Static(Vec<RouteDecl>),
    /// A producer resolved once at registration time
    Lazy(Box<dyn FnOnce() -> Vec<RouteDecl> + Send>),
}

impl RouteSource {
    /// Resolve the declarations
    #[must_use]
    pub fn resolve(self) -> Vec<RouteDecl> {
        match self {
            Self::Static(decls) => decls,
            Self::Lazy(producer) => producer(),
        }
    }
}

/// Where a plugin's helper declarations come from
pub enum HelperSource {
    /// An eager list
    Static(Vec<HelperDecl>),
    /// A producer resolved once at registration time
    Lazy(Box<dyn FnOnce() -> Vec<HelperDecl> + Send>),
}

impl HelperSource {
    /// Resolve the declarations
    #[must_use]
    pub fn resolve(self) -> Vec<HelperDecl> {
        match self {
            Self::Static(decls) => decls,
            Self::Lazy(producer) => producer(),
        }
    }
}

/// A live, activated plugin
///
/// Every method has a do-nothing default; a plugin overrides only what it
/// provides. `initialize` runs after the whole batch settles and is not
/// awaited by the host; `deactivate` runs on explicit deactivation and its
/// error aborts the removal.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Routes this plugin contributes
    fn routes(&self) -> Option<RouteSource> {
        None
    }

    /// Template helpers this plugin contributes
    fn helpers(&self) -> Option<HelperSource> {
        None
    }

    /// Post-activation hook, invoked once the host is ready
    ///
    /// # Errors
    ///
    /// Errors are logged by the host and otherwise ignored
    async fn initialize(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Teardown hook, invoked on explicit deactivation
    ///
    /// # Errors
    ///
    /// An error propagates to the deactivation caller and leaves the plugin
    /// in the collection
    async fn deactivate(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
