//! Plugin manifest loading and validation
//!
//! A manifest is a JSON file inside the plugin folder. Parsing is two-step:
//! serde into an all-optional raw form, then field validation producing the
//! distinct error taxonomy callers report per plugin.

use std::path::{Path, PathBuf};

use semver::VersionReq;
use serde::Deserialize;

use super::ActivationError;

/// Validated plugin descriptor
///
/// Immutable once loaded; the manager rejects a second descriptor carrying
/// an already-active name.
#[derive(Debug, Clone)]
pub struct PluginManifest {
    /// Unique plugin identity
    pub name: String,
    /// Relative path to the entry artifact inside the plugin folder
    pub main: String,
    /// Host version range the plugin declares compatibility with (advisory)
    pub hammer: VersionReq,
    /// Plugin's own version, informational only
    pub version: Option<String>,
}

/// Raw manifest as it appears on disk, before validation
#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    main: Option<String>,
    #[serde(default)]
    hammer: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

impl PluginManifest {
    /// Load and validate the manifest of the plugin in `folder`
    ///
    /// # Errors
    ///
    /// - [`ActivationError::ManifestParse`] if the manifest file is missing,
    ///   unreadable, not valid JSON, or carries an unparsable version range
    /// - [`ActivationError::MissingName`] if no `name` field is present
    /// - [`ActivationError::MissingVersionRange`] if no `hammer` range is
    ///   declared
    /// - [`ActivationError::MissingMainFile`] if the computed entry path is
    ///   not a regular file
    pub fn load(folder: &Path, manifest_file: &str) -> Result<Self, ActivationError> {
        let path = folder.join(manifest_file);

        let content =
            std::fs::read_to_string(&path).map_err(|e| ActivationError::ManifestParse {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let raw: RawManifest =
            serde_json::from_str(&content).map_err(|e| ActivationError::ManifestParse {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let name = match raw.name {
            Some(name) if !name.is_empty() => name,
            _ => return Err(ActivationError::MissingName { path }),
        };

        let hammer = match raw.hammer {
            Some(range) if !range.is_empty() => {
                VersionReq::parse(&range).map_err(|e| ActivationError::ManifestParse {
                    path: path.clone(),
                    reason: format!("invalid hammer version range {range:?}: {e}"),
                })?
            }
            _ => return Err(ActivationError::MissingVersionRange { name }),
        };

        let main = raw.main.unwrap_or_default();
        let entry = folder.join(&main);
        if !entry.is_file() {
            return Err(ActivationError::MissingMainFile { name, path: entry });
        }

        Ok(Self {
            name,
            main,
            hammer,
            version: raw.version,
        })
    }

    /// Absolute path of the entry artifact
    #[must_use]
    pub fn entry_path(&self, folder: &Path) -> PathBuf {
        folder.join(&self.main)
    }
}
