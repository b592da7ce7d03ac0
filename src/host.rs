//! Shared host primitives
//!
//! The explicit bundle of collaborators handed to the plugin manager and to
//! plugin factories: configuration, persistence, authentication, and the
//! event bus. Passing the bundle by value (it is cheap to clone) keeps
//! independent host instances isolated; there are no module-level
//! singletons.

use std::sync::Arc;

use crate::auth::Authentication;
use crate::config::Config;
use crate::db::DbPool;
use crate::events::EventBus;

/// Host primitives exposed to plugins and the HTTP layer
#[derive(Clone)]
pub struct HostServices {
    /// Host configuration
    pub config: Arc<Config>,
    /// Database pool
    pub db: DbPool,
    /// Session/token authentication
    pub auth: Arc<Authentication>,
    /// Lifecycle event bus
    pub bus: EventBus,
}

impl HostServices {
    /// Bundle services over a configured database pool
    #[must_use]
    pub fn new(config: Arc<Config>, db: DbPool, bus: EventBus) -> Self {
        let auth = Arc::new(Authentication::new(db.clone(), config.auth.hash_rounds));
        Self {
            config,
            db,
            auth,
            bus,
        }
    }
}
