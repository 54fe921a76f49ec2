//! Policy configuration.
//!
//! Defaults plus environment overrides for where policy plugins are looked
//! up. Embedders can also deserialize [`PolicyConfig`] from their own
//! configuration documents.

use std::ffi::OsStr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default plugin search locations, scanned in this order. The empty entry
/// is the directory of the running executable.
pub const DEFAULT_SEARCH_LOCATIONS: [&str; 3] = ["policies", "lib", ""];

/// Environment variable names.
pub mod env_vars {
    /// Replaces the default search locations. Uses the platform path list
    /// syntax (`:` on Unix, `;` on Windows); an empty entry is the
    /// executable directory.
    pub const POLICY_PATH: &str = "IDMAP_POLICY_PATH";

    /// Emit logs as JSON when set to `true`.
    pub const LOG_JSON: &str = "IDMAP_LOG_JSON";
}

/// Where to look for policy plugins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub search_locations: Vec<PathBuf>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            search_locations: DEFAULT_SEARCH_LOCATIONS.iter().map(PathBuf::from).collect(),
        }
    }
}

impl PolicyConfig {
    /// Defaults, with [`env_vars::POLICY_PATH`] applied when set.
    pub fn from_env() -> Self {
        match std::env::var_os(env_vars::POLICY_PATH) {
            Some(value) => Self::from_path_list(&value).unwrap_or_default(),
            None => Self::default(),
        }
    }

    /// Parse a platform path list. Returns `None` for an empty value.
    pub fn from_path_list(value: &OsStr) -> Option<Self> {
        if value.is_empty() {
            return None;
        }
        Some(Self {
            search_locations: std::env::split_paths(value).collect(),
        })
    }

    /// Append a search location.
    pub fn with_search_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.search_locations.push(location.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order() {
        let config = PolicyConfig::default();
        assert_eq!(
            config.search_locations,
            vec![
                PathBuf::from("policies"),
                PathBuf::from("lib"),
                PathBuf::new()
            ]
        );
    }

    #[test]
    fn test_path_list() {
        assert!(PolicyConfig::from_path_list(OsStr::new("")).is_none());

        let list = std::env::join_paths(["/opt/idmap", "/usr/lib/idmap"]).unwrap();
        let config = PolicyConfig::from_path_list(&list).unwrap();
        assert_eq!(
            config.search_locations,
            vec![PathBuf::from("/opt/idmap"), PathBuf::from("/usr/lib/idmap")]
        );
    }

    #[test]
    fn test_with_search_location_appends() {
        let config = PolicyConfig::default().with_search_location("/opt/idmap");
        assert_eq!(config.search_locations.len(), 4);
        assert_eq!(config.search_locations[0], PathBuf::from("policies"));
        assert_eq!(config.search_locations[3], PathBuf::from("/opt/idmap"));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: PolicyConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PolicyConfig::default());

        let config: PolicyConfig =
            serde_json::from_str(r#"{"search_locations":["/etc/idmap/policies"]}"#).unwrap();
        assert_eq!(config.search_locations, vec![PathBuf::from("/etc/idmap/policies")]);
    }
}
