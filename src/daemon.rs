//! Daemon startup orchestration
//!
//! Wires configuration, database, registries, factories, and the plugin
//! manager together, then serves the composed router.

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::api::{self, ApiState};
use crate::config::{Config, default_data_dir};
use crate::db;
use crate::events::EventBus;
use crate::host::HostServices;
use crate::plugins::{FactorySet, HelpersFactory, PluginManager, builtin};
use crate::registry::{HelperRegistry, RouteRegistry};
use crate::Result;

/// The hammer daemon
pub struct Daemon {
    config: Config,
}

impl Daemon {
    /// Create a daemon from configuration
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run until the server exits
    ///
    /// # Errors
    ///
    /// Returns error if startup fails, including any plugin activation
    /// failure, or if the server stops unexpectedly.
    pub async fn run(self) -> Result<()> {
        let mut config = self.config;

        // Materialize the shipped core plugins under the data dir unless a
        // core root was configured explicitly
        let core_dir = config
            .plugins
            .core_dir
            .clone()
            .unwrap_or_else(|| default_data_dir().join("core-plugins"));
        builtin::materialize_core_plugins(&core_dir)?;
        config.plugins.core_dir = Some(core_dir);

        if let Some(parent) = config.database.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let pool = db::init(&config.database.path)?;

        let config = Arc::new(config);
        let bus = EventBus::new();
        let services = HostServices::new(config.clone(), pool.clone(), bus);

        let routes = RouteRegistry::new();
        let helpers = HelperRegistry::new();

        let mut factories = FactorySet::new();
        factories.register("helpers", Arc::new(HelpersFactory));

        let manager = Arc::new(PluginManager::new(
            services.clone(),
            factories,
            routes.clone(),
            helpers,
        ));
        manager.initialize().await?;

        let plugin_router = routes.to_router().await;
        let state = Arc::new(ApiState {
            db: pool,
            auth: services.auth.clone(),
            manager,
        });
        let app = api::build_router(state, plugin_router);

        let listener = TcpListener::bind(("0.0.0.0", config.server.port)).await?;
        tracing::info!(port = config.server.port, "hammer listening");
        axum::serve(listener, app).await?;

        Ok(())
    }
}
