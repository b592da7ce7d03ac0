//! Plugin activation
//!
//! Turns a validated descriptor into a live instance. Construction is
//! delegated to a registered factory; the factory decides at the type level
//! whether construction is synchronous ([`Activation::Ready`]) or eventual
//! ([`Activation::Deferred`]). The activator suspends only on the deferred
//! arm.
//!
//! The host-version compatibility gate is advisory: an unsatisfied range is
//! logged and activation proceeds.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use semver::Version;

use super::instance::Plugin;
use super::manifest::PluginManifest;
use super::ActivationError;
use crate::host::HostServices;

/// What a factory hands a plugin under construction
#[derive(Clone)]
pub struct PluginContext {
    /// The plugin's folder on disk
    pub folder: PathBuf,
    /// Whether the plugin came from the core root
    pub privileged: bool,
    /// Host primitives (config, database, auth, event bus)
    pub services: HostServices,
}

/// Outcome of invoking a plugin factory
pub enum Activation {
    /// Construction completed synchronously
    Ready(Arc<dyn Plugin>),
    /// Construction is eventual; the activator suspends until it settles
    Deferred(BoxFuture<'static, anyhow::Result<Arc<dyn Plugin>>>),
}

/// Constructs plugin instances for one entry point
pub trait PluginFactory: Send + Sync {
    /// Invoke the entry point
    fn construct(&self, ctx: PluginContext) -> Activation;
}

struct FnFactory<F>(F);

impl<F> PluginFactory for FnFactory<F>
where
    F: Fn(PluginContext) -> Activation + Send + Sync,
{
    fn construct(&self, ctx: PluginContext) -> Activation {
        (self.0)(ctx)
    }
}

/// Wrap a closure as a [`PluginFactory`]
pub fn factory_fn<F>(f: F) -> Arc<dyn PluginFactory>
where
    F: Fn(PluginContext) -> Activation + Send + Sync + 'static,
{
    Arc::new(FnFactory(f))
}

/// Registered entry points, keyed by plugin name
#[derive(Clone, Default)]
pub struct FactorySet {
    inner: HashMap<String, Arc<dyn PluginFactory>>,
}

impl FactorySet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for the plugin carrying `name`
    pub fn register(&mut self, name: impl Into<String>, factory: Arc<dyn PluginFactory>) {
        self.inner.insert(name.into(), factory);
    }

    /// Look up the factory for a plugin name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn PluginFactory>> {
        self.inner.get(name).cloned()
    }
}

/// Activates plugins from validated descriptors
pub struct Activator {
    host_version: Option<Version>,
    factories: FactorySet,
}

impl Activator {
    /// Create an activator checking against the given host version
    ///
    /// `None` disables the advisory compatibility log entirely.
    #[must_use]
    pub fn new(host_version: Option<Version>, factories: FactorySet) -> Self {
        Self {
            host_version,
            factories,
        }
    }

    /// Produce a live instance for `manifest`
    ///
    /// # Errors
    ///
    /// - [`ActivationError::EntryNotConstructible`] if no factory is
    ///   registered for the plugin
    /// - [`ActivationError::AsyncActivation`] if deferred construction
    ///   settles with an error
    pub async fn activate(
        &self,
        manifest: &PluginManifest,
        ctx: PluginContext,
    ) -> Result<Arc<dyn Plugin>, ActivationError> {
        let factory =
            self.factories
                .get(&manifest.name)
                .ok_or_else(|| ActivationError::EntryNotConstructible {
                    name: manifest.name.clone(),
                })?;

        if let Some(host) = &self.host_version {
            if !manifest.hammer.matches(host) {
                tracing::warn!(
                    plugin = %manifest.name,
                    version = ?manifest.version,
                    declared = %manifest.hammer,
                    host = %host,
                    "plugin not compatible with current hammer version, activating anyway"
                );
            }
        }

        match factory.construct(ctx) {
            Activation::Ready(instance) => Ok(instance),
            Activation::Deferred(future) => {
                future.await.map_err(|e| ActivationError::AsyncActivation {
                    name: manifest.name.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }
}
