//! Core plugins shipped with the host
//!
//! The stock `helpers` plugin contributes the `include` template helper: it
//! concatenates the named template files from the configured templates
//! directory. Any unreadable or unsafe template name resolves the whole
//! invocation to an empty string rather than failing the render.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use super::activator::{Activation, PluginContext, PluginFactory};
use super::instance::{HelperDecl, HelperSource, Plugin};
use crate::registry::helper_fn;
use crate::Result;

/// The stock template-helpers plugin
pub struct HelpersPlugin {
    templates_dir: PathBuf,
}

impl HelpersPlugin {
    /// Create the plugin resolving template names in `templates_dir`
    #[must_use]
    pub fn new(templates_dir: PathBuf) -> Self {
        Self { templates_dir }
    }
}

impl Plugin for HelpersPlugin {
    fn helpers(&self) -> Option<HelperSource> {
        let dir = self.templates_dir.clone();
        Some(HelperSource::Static(vec![HelperDecl::new(
            "include",
            helper_fn(move |args: Vec<Value>| {
                let dir = dir.clone();
                async move { Ok(Value::String(include_templates(&dir, &args).await)) }
            }),
        )]))
    }
}

/// Concatenate the named templates, or empty on any failure
async fn include_templates(dir: &Path, args: &[Value]) -> String {
    let mut out = String::new();

    for arg in args {
        let Some(name) = arg.as_str() else {
            continue;
        };
        let Some(path) = safe_template_path(dir, name) else {
            tracing::warn!(template = %name, "refusing template path outside templates dir");
            return String::new();
        };
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => out.push_str(&content),
            Err(e) => {
                tracing::warn!(template = %name, error = %e, "template not readable");
                return String::new();
            }
        }
    }

    out
}

/// Resolve a template name inside the templates dir, rejecting traversal
fn safe_template_path(dir: &Path, name: &str) -> Option<PathBuf> {
    let relative = Path::new(name);
    if relative.is_absolute() {
        return None;
    }
    if relative
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
    {
        return None;
    }
    Some(dir.join(relative))
}

/// Factory constructing the stock helpers plugin
pub struct HelpersFactory;

impl PluginFactory for HelpersFactory {
    fn construct(&self, ctx: PluginContext) -> Activation {
        let templates_dir = ctx.services.config.templates_dir.clone();
        Activation::Ready(Arc::new(HelpersPlugin::new(templates_dir)))
    }
}

/// Write the shipped core plugins into the core root if absent
///
/// Each core plugin gets its folder, manifest, and entry artifact so it
/// flows through discovery and activation like any other plugin.
///
/// # Errors
///
/// Returns error if the folders or files cannot be written
pub fn materialize_core_plugins(core_dir: &Path) -> Result<()> {
    let helpers = core_dir.join("helpers");
    if helpers.join("config.json").exists() {
        return Ok(());
    }

    std::fs::create_dir_all(&helpers)?;
    std::fs::write(
        helpers.join("config.json"),
        format!(
            "{{\"name\":\"helpers\",\"main\":\"entry.json\",\"hammer\":\">=0.1.0\",\"version\":\"{}\"}}",
            env!("CARGO_PKG_VERSION")
        ),
    )?;
    std::fs::write(helpers.join("entry.json"), "{\"factory\":\"helpers\"}\n")?;

    tracing::debug!(path = %helpers.display(), "core helpers plugin materialized");
    Ok(())
}
