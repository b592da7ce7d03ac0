//! Plugin folder discovery
//!
//! Scans the configured plugin roots for candidate plugin folders. The core
//! root is scanned before user roots; plugins found under it are tagged
//! privileged for diagnostics only; they receive no different trust
//! treatment. Within a root, folders come back in directory-listing order.

use std::path::{Path, PathBuf};

use crate::Result;
use crate::config::PluginsConfig;

/// A candidate plugin folder found under a configured root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFolder {
    /// The plugin's folder
    pub folder: PathBuf,
    /// Whether the folder came from the core root
    pub privileged: bool,
}

/// Create every configured plugin root that does not exist yet
///
/// # Errors
///
/// Returns error if a root cannot be created
pub fn ensure_roots(config: &PluginsConfig) -> Result<()> {
    if let Some(core) = &config.core_dir {
        std::fs::create_dir_all(core)?;
    }
    for dir in &config.dirs {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Collect candidate plugin folders under every configured root
#[must_use]
pub fn collect(config: &PluginsConfig) -> Vec<DiscoveredFolder> {
    let mut folders = Vec::new();

    if let Some(core) = &config.core_dir {
        scan_root(core, true, &mut folders);
    }
    for dir in &config.dirs {
        scan_root(dir, false, &mut folders);
    }

    folders
}

fn scan_root(root: &Path, privileged: bool, out: &mut Vec<DiscoveredFolder>) {
    if !root.is_dir() {
        tracing::debug!(path = %root.display(), "plugin root does not exist, skipping");
        return;
    }

    let Ok(entries) = std::fs::read_dir(root) else {
        tracing::warn!(path = %root.display(), "failed to read plugin root");
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        tracing::debug!(
            path = %path.display(),
            privileged,
            "plugin folder discovered"
        );
        out.push(DiscoveredFolder {
            folder: path,
            privileged,
        });
    }
}
