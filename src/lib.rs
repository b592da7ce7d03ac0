//! Hammer - pluggable web-application runtime
//!
//! A host process that discovers independently packaged plugins, activates
//! them concurrently, and wires their declared routes and template helpers
//! into a shared HTTP server and template-helper registry. Plugins get
//! session/auth and persistence primitives from the host.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  HTTP (axum)                     │
//! │   health │ auth │ plugin admin │ plugin routes   │
//! └─────────────────────┬────────────────────────────┘
//!                       │
//! ┌─────────────────────▼────────────────────────────┐
//! │               Plugin Manager                     │
//! │  discover │ activate │ collide │ register │ ready│
//! └───────┬──────────────┬──────────────┬────────────┘
//!         │              │              │
//!   Route registry  Helper registry  Host services
//!                                   (db, auth, bus)
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod daemon;
pub mod db;
pub mod error;
pub mod events;
pub mod host;
pub mod plugins;
pub mod registry;

pub use auth::Authentication;
pub use config::Config;
pub use daemon::Daemon;
pub use db::{DbConn, DbPool};
pub use error::{Error, FailedActivation, Result};
pub use events::{EventBus, HostEvent};
pub use host::HostServices;
pub use plugins::{
    Activation, ActivationError, ActivePlugin, FactorySet, HelperDecl, HelperSource, Plugin,
    PluginContext, PluginFactory, PluginManager, PluginManifest, RouteDecl, RouteSource,
};
pub use registry::{
    HelperHandler, HelperRegistry, RouteHandler, RouteRegistry, SharedHelperHandler,
    SharedRouteHandler, handler_fn, helper_fn, join_url,
};
