//! Shared test utilities

use std::path::Path;
use std::sync::Arc;

use hammer::{
    Authentication, Config, DbPool, EventBus, FactorySet, HelperRegistry, HostServices,
    PluginManager, RouteRegistry, db,
};

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// A fully wired host over a temp plugin root, for lifecycle tests
pub struct TestHost {
    pub manager: PluginManager,
    pub routes: RouteRegistry,
    pub helpers: HelperRegistry,
    pub bus: EventBus,
    pub db: DbPool,
    pub auth: Arc<Authentication>,
}

/// Build a host whose only user plugin root is `root`
#[must_use]
pub fn host_over(root: &Path, factories: FactorySet) -> TestHost {
    host_over_with_config(Config::default(), root, factories)
}

/// Build a host over `root`, starting from a caller-tuned config
#[must_use]
pub fn host_over_with_config(mut config: Config, root: &Path, factories: FactorySet) -> TestHost {
    config.plugins.core_dir = None;
    config.plugins.dirs = vec![root.to_path_buf()];

    let bus = EventBus::new();
    let pool = setup_test_db();
    let services = HostServices::new(Arc::new(config), pool.clone(), bus.clone());
    let auth = services.auth.clone();

    let routes = RouteRegistry::new();
    let helpers = HelperRegistry::new();
    let manager = PluginManager::new(services, factories, routes.clone(), helpers.clone());

    TestHost {
        manager,
        routes,
        helpers,
        bus,
        db: pool,
        auth,
    }
}

/// Write a plugin folder with a valid manifest and entry artifact
pub fn write_plugin(root: &Path, folder_name: &str, plugin_name: &str) {
    let folder = root.join(folder_name);
    std::fs::create_dir_all(&folder).expect("failed to create plugin folder");
    std::fs::write(
        folder.join("config.json"),
        format!(r#"{{"name":"{plugin_name}","main":"entry.json","hammer":">=0.1.0"}}"#),
    )
    .expect("failed to write manifest");
    std::fs::write(folder.join("entry.json"), "{}").expect("failed to write entry");
}

/// Write a plugin folder with a caller-supplied manifest body
pub fn write_plugin_manifest(root: &Path, folder_name: &str, manifest: &str, entry: bool) {
    let folder = root.join(folder_name);
    std::fs::create_dir_all(&folder).expect("failed to create plugin folder");
    std::fs::write(folder.join("config.json"), manifest).expect("failed to write manifest");
    if entry {
        std::fs::write(folder.join("entry.json"), "{}").expect("failed to write entry");
    }
}
