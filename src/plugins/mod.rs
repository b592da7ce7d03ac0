//! Plugin system for the hammer host
//!
//! Plugins are independently packaged extensions discovered from manifest
//! files (`config.json`) in subfolders of the configured plugin roots. Each
//! plugin declares its name, entry artifact, and the host version range it
//! is compatible with; an activated plugin contributes routes and template
//! helpers into the shared capability registries.
//!
//! The lifecycle per plugin: discovered → descriptor loaded → activating →
//! active or failed, with an explicit deactivation step reachable from
//! active.

pub mod activator;
pub mod builtin;
pub mod discovery;
pub mod instance;
pub mod manager;
pub mod manifest;

use std::path::PathBuf;

use thiserror::Error;

pub use activator::{Activation, Activator, FactorySet, PluginContext, PluginFactory, factory_fn};
pub use builtin::HelpersFactory;
pub use discovery::DiscoveredFolder;
pub use instance::{HelperDecl, HelperSource, Plugin, RouteDecl, RouteSource};
pub use manager::{ActivePlugin, PluginManager};
pub use manifest::PluginManifest;

/// Why a single plugin failed to activate
///
/// Every variant is a per-plugin failure; the manager aggregates them into
/// the batch outcome.
#[derive(Debug, Error)]
pub enum ActivationError {
    /// Manifest file missing or not valid structured data
    #[error("plugin manifest {path} is not readable JSON: {reason}")]
    ManifestParse {
        /// Path of the offending manifest
        path: PathBuf,
        /// Parser or IO detail
        reason: String,
    },

    /// Manifest declares no plugin name
    #[error("plugin manifest {path} declares no name")]
    MissingName {
        /// Path of the offending manifest
        path: PathBuf,
    },

    /// Manifest declares no compatible host version range
    #[error("plugin {name} declares no compatible hammer version range")]
    MissingVersionRange {
        /// Plugin name
        name: String,
    },

    /// Declared entry file does not exist as a regular file
    #[error("plugin {name} entry file {path} does not exist")]
    MissingMainFile {
        /// Plugin name
        name: String,
        /// Computed entry path
        path: PathBuf,
    },

    /// No constructible entry point is registered for the plugin
    #[error("plugin {name} has no constructible entry point")]
    EntryNotConstructible {
        /// Plugin name
        name: String,
    },

    /// Deferred construction settled with an error
    #[error("plugin {name} failed during activation: {reason}")]
    AsyncActivation {
        /// Plugin name
        name: String,
        /// Error the deferred construction settled with
        reason: String,
    },

    /// Another active plugin already owns the name
    #[error("plugin name {name} is already in use")]
    NameCollision {
        /// The contested name
        name: String,
    },
}
