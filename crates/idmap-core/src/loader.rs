//! Policy plugin loader.
//!
//! Opens one dynamic library and resolves the two well-known hook symbols.

use std::path::{Path, PathBuf};

use libloading::Library;

use crate::abi::{
    NumericToTextualFn, NumericToTextualHook, TextualToNumericFn, TextualToNumericHook,
    NUMERIC_TO_TEXTUAL_SYMBOL, TEXTUAL_TO_NUMERIC_SYMBOL,
};
use crate::error::{PolicyError, Result};
use crate::hooks::PluginHooks;

/// Platform dynamic library suffix, without the dot.
pub const LIBRARY_SUFFIX: &str = std::env::consts::DLL_EXTENSION;

/// A library that was opened successfully. Keeps the library mapped.
pub struct LoadedPlugin {
    path: PathBuf,
    _library: Library,
}

impl LoadedPlugin {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPlugin").field("path", &self.path).finish()
    }
}

/// Result of loading a plugin: the library plus whatever hooks it exports.
#[derive(Debug)]
pub struct LoadedPolicy {
    hooks: PluginHooks,
    plugin: LoadedPlugin,
}

impl LoadedPolicy {
    pub fn path(&self) -> &Path {
        self.plugin.path()
    }

    pub fn hooks(&self) -> &PluginHooks {
        &self.hooks
    }

    /// Hooks point into the library, so they are only handed out together
    /// with it.
    pub(crate) fn into_parts(self) -> (PluginHooks, LoadedPlugin) {
        (self.hooks, self.plugin)
    }
}

/// Loader for policy plugins (.so, .dylib, .dll).
#[derive(Debug, Default, Clone, Copy)]
pub struct PluginLoader;

impl PluginLoader {
    pub fn new() -> Self {
        Self
    }

    /// Open the library at `path` and look up both hooks.
    ///
    /// Failing to open is an error; a missing hook is not.
    pub fn load(&self, path: &Path) -> Result<LoadedPolicy> {
        // SAFETY: loading runs the library's initializers. Policy plugins
        // are trusted local files.
        let library = unsafe { Library::new(path) }.map_err(|source| PolicyError::PluginOpen {
            path: path.to_path_buf(),
            source,
        })?;

        let numeric_to_textual = lookup::<NumericToTextualFn>(&library, path, NUMERIC_TO_TEXTUAL_SYMBOL)
            // SAFETY: the hook is stored next to its library in LoadedPolicy.
            .map(|func| unsafe { NumericToTextualHook::from_plugin(func, path) });
        let textual_to_numeric = lookup::<TextualToNumericFn>(&library, path, TEXTUAL_TO_NUMERIC_SYMBOL)
            // SAFETY: as above.
            .map(|func| unsafe { TextualToNumericHook::from_plugin(func, path) });

        tracing::info!(
            path = %path.display(),
            numeric_to_textual = numeric_to_textual.is_some(),
            textual_to_numeric = textual_to_numeric.is_some(),
            "Loaded policy plugin"
        );

        Ok(LoadedPolicy {
            hooks: PluginHooks {
                numeric_to_textual,
                textual_to_numeric,
            },
            plugin: LoadedPlugin {
                path: path.to_path_buf(),
                _library: library,
            },
        })
    }

    /// List candidate plugin files directly inside `dir`.
    ///
    /// A missing or unreadable directory yields nothing.
    pub fn discover(&self, dir: &Path) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Skipping policy location {}: {}", dir.display(), e);
                return Vec::new();
            }
        };

        let mut candidates = Vec::new();
        for entry in entries.flatten() {
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            if is_candidate_name(&entry.file_name().to_string_lossy()) {
                candidates.push(entry.path());
            }
        }
        candidates
    }
}

/// Look up a hook symbol, logging and discarding a `SymbolNotFound`.
fn lookup<T: Copy>(library: &Library, path: &Path, symbol: &'static str) -> Option<T> {
    // SAFETY: T is the fn pointer type the ABI fixes for this symbol.
    match unsafe { library.get::<T>(symbol.as_bytes()) } {
        Ok(found) => Some(*found),
        Err(_) => {
            let err = PolicyError::SymbolNotFound {
                path: path.to_path_buf(),
                symbol,
            };
            tracing::trace!("{}", err);
            None
        }
    }
}

/// True when `name` ends in `.` plus the platform library suffix and has
/// something before the dot.
///
/// `auth.so` qualifies; `authso`, `.so` and `libsomething.sodium` do not.
pub fn is_candidate_name(name: &str) -> bool {
    is_candidate_name_for(name, LIBRARY_SUFFIX)
}

fn is_candidate_name_for(name: &str, suffix: &str) -> bool {
    name.strip_suffix(suffix)
        .and_then(|stem| stem.strip_suffix('.'))
        .is_some_and(|base| !base.is_empty())
}
