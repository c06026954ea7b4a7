// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Settings read once at process startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Scripting module the engine loads first.
    pub entry_module: String,
    /// Forces dev tooling and verbose dispatch tracing on or off. `None`
    /// follows the build profile. Never changes dispatch results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_support: Option<bool>,
    /// Shared libraries the native loader opens before any module runs.
    pub native_libraries: Vec<PathBuf>,
    /// Directory the replay engine reads `<entry_module>.jsonl` from.
    pub script_dir: Option<PathBuf>,
    /// Analytics application family reported with every event.
    pub app_family: String,
    /// Application version string reported with every event. Always the
    /// version of the running build, never read from disk.
    #[serde(skip)]
    pub app_version: String,
    /// SQLite file for the analytics record store. `None` keeps events in
    /// memory.
    pub analytics_store: Option<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            entry_module: "index".into(),
            dev_support: None,
            native_libraries: Vec::new(),
            script_dir: None,
            app_family: "Mallard Editions".into(),
            app_version: env!("CARGO_PKG_VERSION").into(),
            analytics_store: None,
        }
    }
}

impl HostConfig {
    /// Effective dev flag: the explicit setting, else the build profile.
    pub fn dev_enabled(&self) -> bool {
        self.dev_support.unwrap_or(cfg!(debug_assertions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_index() {
        let config = HostConfig::default();
        assert_eq!(config.entry_module, "index");
        assert!(config.native_libraries.is_empty());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: HostConfig =
            serde_json::from_str(r#"{ "entry_module": "main", "dev_support": true }"#).unwrap();
        assert_eq!(config.entry_module, "main");
        assert!(config.dev_enabled());
        assert_eq!(config.app_family, "Mallard Editions");
    }

    #[test]
    fn unset_dev_flag_follows_build_profile() {
        let config: HostConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.dev_support, None);
        assert_eq!(config.dev_enabled(), cfg!(debug_assertions));
    }

    #[test]
    fn app_version_is_never_persisted_or_loaded() {
        let json = serde_json::to_value(HostConfig::default()).unwrap();
        assert!(json.get("app_version").is_none());
        assert!(json.get("dev_support").is_none());

        let config: HostConfig =
            serde_json::from_str(r#"{ "app_version": "0.0.1" }"#).unwrap();
        assert_eq!(config.app_version, env!("CARGO_PKG_VERSION"));
    }
}
