//! Policy registry.
//!
//! Scans the search locations once, loads every candidate plugin, and keeps
//! the resulting hooks together with the libraries they point into. A
//! registry is immutable once built, so it can be shared across threads
//! without locking.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::config::PolicyConfig;
use crate::hooks::{ActiveHookSet, HookSetBuilder};
use crate::loader::{LoadedPlugin, PluginLoader};

static GLOBAL: OnceCell<Arc<PolicyRegistry>> = OnceCell::new();

/// Loaded policy plugins and the hooks they provide.
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    // Declared before `plugins` so hooks are dropped before their libraries.
    hooks: ActiveHookSet,
    plugins: Vec<LoadedPlugin>,
    locations: Vec<PathBuf>,
}

impl PolicyRegistry {
    /// A registry without plugins.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry whose hooks are compiled into the current binary.
    pub fn from_hooks(hooks: ActiveHookSet) -> Self {
        Self {
            hooks,
            ..Self::default()
        }
    }

    /// Build a registry from the configured search locations.
    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::initialize(&config.search_locations)
    }

    /// Scan `locations` in order and load every candidate plugin.
    ///
    /// An empty location means the directory holding the running
    /// executable. Plugins loaded later replace hooks of the same direction
    /// loaded earlier. Nothing here fails: unreadable locations and broken
    /// plugins are logged and skipped.
    pub fn initialize<P: AsRef<Path>>(locations: &[P]) -> Self {
        let loader = PluginLoader::new();
        let mut builder = HookSetBuilder::new();
        let mut plugins = Vec::new();
        let mut scanned = Vec::new();

        for location in locations {
            let Some(dir) = resolve_location(location.as_ref()) else {
                tracing::debug!("Cannot determine the executable directory; skipping it");
                continue;
            };

            for path in loader.discover(&dir) {
                match loader.load(&path) {
                    Ok(policy) => {
                        let (hooks, plugin) = policy.into_parts();
                        builder.overlay(hooks);
                        plugins.push(plugin);
                    }
                    Err(e) => {
                        tracing::warn!("Skipping policy plugin {}: {}", path.display(), e);
                    }
                }
            }
            scanned.push(dir);
        }

        let hooks = builder.freeze();
        tracing::info!(
            plugins = plugins.len(),
            numeric_to_textual = hooks.numeric_to_textual().is_some(),
            textual_to_numeric = hooks.textual_to_numeric().is_some(),
            "Policy registry initialized"
        );

        Self {
            hooks,
            plugins,
            locations: scanned,
        }
    }

    /// The process-wide registry, built from [`PolicyConfig::from_env`] on
    /// first use.
    pub fn global() -> Arc<PolicyRegistry> {
        GLOBAL
            .get_or_init(|| Arc::new(Self::from_config(&PolicyConfig::from_env())))
            .clone()
    }

    pub fn hooks(&self) -> &ActiveHookSet {
        &self.hooks
    }

    /// Every library that was opened, in load order.
    pub fn plugins(&self) -> &[LoadedPlugin] {
        &self.plugins
    }

    /// Directories that were scanned, with the empty location resolved.
    pub fn locations(&self) -> &[PathBuf] {
        &self.locations
    }
}

fn resolve_location(location: &Path) -> Option<PathBuf> {
    if !location.as_os_str().is_empty() {
        return Some(location.to_path_buf());
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_location_is_executable_dir() {
        let dir = resolve_location(Path::new("")).unwrap();
        let exe = std::env::current_exe().unwrap();
        assert_eq!(exe.parent().unwrap(), dir);
        assert_eq!(
            resolve_location(Path::new("policies")).unwrap(),
            PathBuf::from("policies")
        );
    }

    #[test]
    fn test_missing_locations_are_empty() {
        let registry = PolicyRegistry::initialize(&["/nonexistent/idmap/policies"]);
        assert!(registry.plugins().is_empty());
        assert!(registry.hooks().is_empty());
        assert_eq!(registry.locations().len(), 1);
    }
}
