//! Plugin lifecycle manager
//!
//! Owns the collection of active plugins and drives the batch lifecycle:
//! root creation, discovery, concurrent activation, name-collision policy,
//! capability registration, the "plugins running" broadcast, and
//! deactivation.
//!
//! Activations are issued in discovery order but run concurrently, so
//! completion order, and therefore the outcome of a name collision, is
//! not deterministic. The only guarantee is that exactly one plugin owns a
//! contested name once the batch settles.
//!
//! The batch keeps the all-or-nothing outward signal: if any single
//! activation fails, `initialize()` fails as a whole, while capabilities
//! registered by the plugins that succeeded stay registered.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use super::activator::{Activator, FactorySet, PluginContext};
use super::discovery::{self, DiscoveredFolder};
use super::instance::Plugin;
use super::manifest::PluginManifest;
use super::ActivationError;
use crate::error::FailedActivation;
use crate::events::HostEvent;
use crate::host::HostServices;
use crate::registry::{join_url, HelperRegistry, RouteRegistry};
use crate::{Error, Result};

/// An active plugin and its descriptor
#[derive(Clone)]
pub struct ActivePlugin {
    /// The descriptor the plugin was activated from
    pub manifest: PluginManifest,
    /// Folder the plugin was discovered in
    pub folder: PathBuf,
    /// Whether the plugin came from the core root
    pub privileged: bool,
    /// The live instance
    pub instance: Arc<dyn Plugin>,
}

/// Plugin lifecycle manager
pub struct PluginManager {
    services: HostServices,
    activator: Activator,
    routes: RouteRegistry,
    helpers: HelperRegistry,
    plugins: Arc<RwLock<IndexMap<String, ActivePlugin>>>,
}

impl PluginManager {
    /// Create a manager over the given services, factories, and registries
    #[must_use]
    pub fn new(
        services: HostServices,
        factories: FactorySet,
        routes: RouteRegistry,
        helpers: HelperRegistry,
    ) -> Self {
        let activator = Activator::new(services.config.host_semver(), factories);
        Self {
            services,
            activator,
            routes,
            helpers,
            plugins: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Discover and activate every plugin under the configured roots
    ///
    /// Roots are created if absent, then all discovered folders activate
    /// concurrently. Once the batch settles successfully the manager
    /// broadcasts [`HostEvent::PluginsRunning`] and fires each plugin's
    /// `initialize` hook in insertion order without awaiting it.
    ///
    /// Zero discovered plugins is immediate no-op success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PluginBatch`] listing every failed folder if any
    /// single activation fails. Capabilities registered by successful
    /// plugins are not rolled back.
    pub async fn initialize(&self) -> Result<()> {
        let plugins_config = &self.services.config.plugins;
        discovery::ensure_roots(plugins_config)?;

        let folders = discovery::collect(plugins_config);
        if folders.is_empty() {
            tracing::info!("no plugins discovered");
            return Ok(());
        }

        let outcomes = join_all(
            folders
                .into_iter()
                .map(|discovered| self.activate_with_outcome(discovered)),
        )
        .await;

        let mut failures = Vec::new();
        for (folder, result) in outcomes {
            match result {
                Ok(name) => tracing::info!(plugin = %name, "plugin running"),
                Err(error) => {
                    tracing::warn!(
                        folder = %folder.display(),
                        error = %error,
                        "plugin activation failed"
                    );
                    failures.push(FailedActivation { folder, error });
                }
            }
        }

        if !failures.is_empty() {
            return Err(Error::PluginBatch { failures });
        }

        let plugins = self.plugins.read().await;
        let names: Vec<String> = plugins.keys().cloned().collect();
        tracing::info!(count = names.len(), "plugins running");
        self.services
            .bus
            .publish(HostEvent::PluginsRunning { plugins: names });

        // Fire initialize hooks in insertion order, without awaiting them
        for (name, active) in plugins.iter() {
            let name = name.clone();
            let instance = active.instance.clone();
            drop(tokio::spawn(async move {
                if let Err(e) = instance.initialize().await {
                    tracing::warn!(plugin = %name, error = %e, "plugin initialize hook failed");
                }
            }));
        }

        Ok(())
    }

    async fn activate_with_outcome(
        &self,
        discovered: DiscoveredFolder,
    ) -> (PathBuf, std::result::Result<String, ActivationError>) {
        let folder = discovered.folder.clone();
        let result = self
            .activate_one(discovered.folder, discovered.privileged)
            .await;
        (folder, result)
    }

    /// Activate the plugin in one folder
    ///
    /// On success the instance joins the collection and its declared routes
    /// and helpers are registered, in that order. The name-collision check
    /// runs when the activation completes: a newly activated instance whose
    /// name is already taken is discarded, not merged.
    ///
    /// # Errors
    ///
    /// Returns the per-plugin [`ActivationError`] taxonomy from descriptor
    /// loading, activation, and the collision policy.
    pub async fn activate_one(
        &self,
        folder: PathBuf,
        privileged: bool,
    ) -> std::result::Result<String, ActivationError> {
        let manifest_file = &self.services.config.plugins.manifest_file;
        let manifest = PluginManifest::load(&folder, manifest_file)?;
        tracing::debug!(plugin = %manifest.name, folder = %folder.display(), "descriptor loaded");

        let ctx = PluginContext {
            folder: folder.clone(),
            privileged,
            services: self.services.clone(),
        };

        tracing::debug!(plugin = %manifest.name, "activating");
        let instance = self.activator.activate(&manifest, ctx).await?;

        let name = manifest.name.clone();
        {
            let mut plugins = self.plugins.write().await;
            if plugins.contains_key(&name) {
                return Err(ActivationError::NameCollision { name });
            }
            plugins.insert(
                name.clone(),
                ActivePlugin {
                    manifest,
                    folder,
                    privileged,
                    instance: instance.clone(),
                },
            );
        }

        self.register_capabilities(&name, instance).await;
        Ok(name)
    }

    /// Feed a freshly activated instance's declarations into the registries
    async fn register_capabilities(&self, name: &str, instance: Arc<dyn Plugin>) {
        let route_base = &self.services.config.plugins.route_base;

        if let Some(source) = instance.routes() {
            for decl in source.resolve() {
                let url = if decl.no_base_url {
                    decl.url
                } else {
                    let base = decl.base_url.as_deref().unwrap_or(route_base);
                    join_url(base, &decl.url)
                };
                tracing::debug!(plugin = %name, method = %decl.method, url = %url, "plugin route");
                self.routes.register(decl.method, url, decl.handler).await;
            }
        }

        if let Some(source) = instance.helpers() {
            for decl in source.resolve() {
                let mut names = Vec::with_capacity(decl.aliases.len() + 1);
                names.push(decl.name);
                names.extend(decl.aliases);
                tracing::debug!(plugin = %name, helpers = ?names, "plugin helpers");
                self.helpers.register(&names, decl.handler).await;
            }
        }
    }

    /// Deactivate a plugin by name
    ///
    /// No-op if the name is not in the collection. The instance's
    /// `deactivate` hook runs first; only when it succeeds is the entry
    /// removed. Routes and helpers the plugin registered are **not**
    /// retracted.
    ///
    /// # Errors
    ///
    /// Propagates the `deactivate` hook's error; the plugin then stays in
    /// the collection.
    pub async fn deactivate(&self, name: &str) -> Result<()> {
        let instance = self
            .plugins
            .read()
            .await
            .get(name)
            .map(|active| active.instance.clone());

        let Some(instance) = instance else {
            return Ok(());
        };

        instance.deactivate().await.map_err(|e| Error::PluginHook {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        if self.plugins.write().await.shift_remove(name).is_some() {
            tracing::info!(plugin = %name, "plugin deactivated");
            self.services.bus.publish(HostEvent::PluginDeactivated {
                name: name.to_string(),
            });
        }

        Ok(())
    }

    /// Get an active plugin by name
    pub async fn get(&self, name: &str) -> Option<ActivePlugin> {
        self.plugins.read().await.get(name).cloned()
    }

    /// Snapshot of all active plugins, in insertion order
    pub async fn list(&self) -> Vec<ActivePlugin> {
        self.plugins.read().await.values().cloned().collect()
    }

    /// Active plugin names, in insertion order
    pub async fn names(&self) -> Vec<String> {
        self.plugins.read().await.keys().cloned().collect()
    }

    /// Number of active plugins
    pub async fn len(&self) -> usize {
        self.plugins.read().await.len()
    }

    /// Whether no plugins are active
    pub async fn is_empty(&self) -> bool {
        self.plugins.read().await.is_empty()
    }
}
