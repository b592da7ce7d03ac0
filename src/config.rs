//! Configuration for the hammer host
//!
//! Defaults-first: every section deserializes with `#[serde(default)]`, so a
//! config file only needs to name what it changes.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Hammer host configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Plugin discovery and routing configuration
    pub plugins: PluginsConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Directory the `include` template helper resolves template names in
    pub templates_dir: PathBuf,

    /// Version string plugins are compatibility-checked against
    ///
    /// Defaults to this crate's version. The check is advisory: an
    /// incompatible plugin is logged, never rejected.
    pub host_version: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the `SQLite` database file
    pub path: PathBuf,
}

/// Plugin discovery and routing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// Root folder for core plugins shipped with the host
    ///
    /// Scanned before `dirs`; plugins found here are tagged privileged for
    /// diagnostics but receive no different trust treatment. `None` means
    /// the daemon materializes the built-in core root under the data
    /// directory.
    pub core_dir: Option<PathBuf>,

    /// Root folders for user plugins, scanned in order
    pub dirs: Vec<PathBuf>,

    /// Manifest filename looked up inside each plugin folder
    pub manifest_file: String,

    /// URL prefix joined in front of plugin route declarations
    pub route_base: String,
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Iteration count for password hashing
    pub hash_rounds: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            plugins: PluginsConfig::default(),
            auth: AuthConfig::default(),
            templates_dir: PathBuf::from("templates"),
            host_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_data_dir().join("hammer.db"),
        }
    }
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            core_dir: None,
            dirs: vec![PathBuf::from("plugins")],
            manifest_file: "config.json".to_string(),
            route_base: "/hammer/".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { hash_rounds: 10 }
    }
}

impl Config {
    /// Load configuration from a TOML file, or defaults if `path` is `None`
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid TOML
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                let config: Self = toml::from_str(&content)?;
                Ok(config)
            }
        }
    }

    /// The semver-parsed host version, if the configured string is valid
    #[must_use]
    pub fn host_semver(&self) -> Option<semver::Version> {
        semver::Version::parse(&self.host_version).ok()
    }
}

/// Default data directory for the database and materialized core plugins
///
/// Uses `~/.local/share/hammer/` on Linux, falling back to a relative
/// `.hammer/` when no home directory is available.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "hammer", "hammer").map_or_else(
        || PathBuf::from(".hammer"),
        |d| d.data_dir().to_path_buf(),
    )
}
