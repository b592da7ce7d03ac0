//! Capability registries
//!
//! Shared, append-only maps that plugins contribute entries into during
//! activation. The HTTP collaborator consumes the route registry; the
//! template collaborator consumes the helper registry. Both are explicit
//! objects handed around by handle so independent host instances can coexist
//! in one process.

pub mod helpers;
pub mod routes;

pub use helpers::{HelperHandler, HelperRegistry, SharedHelperHandler, helper_fn};
pub use routes::{RouteHandler, RouteRegistry, SharedRouteHandler, handler_fn, join_url};
