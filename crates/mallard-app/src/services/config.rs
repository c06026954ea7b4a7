// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host config persistence.
//
// `host.json` in the data directory is optional; missing or unreadable files
// fall back to defaults. `MALLARD_DEV` overrides the dev flag either way.

use std::path::Path;

use mallard_core::HostConfig;
use mallard_core::error::Result;
use tracing::{info, warn};

pub const CONFIG_FILE: &str = "host.json";
pub const DEV_ENV: &str = "MALLARD_DEV";

/// Load `host.json` from `data_dir`, or `None` if absent or malformed.
pub fn load_config(data_dir: &Path) -> Option<HostConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed host config");
            None
        }
    }
}

pub fn persist_config(data_dir: &Path, config: &HostConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}

/// Parse a `MALLARD_DEV` value. Unrecognised values leave the flag alone.
fn dev_override(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Final config for this process: persisted file (or defaults), env
/// override, and a script directory under `data_dir` when none is set.
///
/// A first run with no `host.json` writes the defaults out as a template.
/// The template never pins the dev flag or the app version; both keep
/// following the running build unless set by hand.
pub fn resolve_config(data_dir: &Path, dev_env: Option<&str>) -> HostConfig {
    let mut config = match load_config(data_dir) {
        Some(config) => config,
        None => {
            let defaults = HostConfig::default();
            if !data_dir.join(CONFIG_FILE).exists() {
                if let Err(e) = persist_config(data_dir, &defaults) {
                    warn!(error = %e, "could not write default host config");
                }
            }
            defaults
        }
    };

    if let Some(dev) = dev_env.and_then(dev_override) {
        config.dev_support = Some(dev);
    }

    let script_dir = config
        .script_dir
        .get_or_insert_with(|| data_dir.join("scripts"))
        .clone();
    if let Err(e) = std::fs::create_dir_all(&script_dir) {
        warn!(path = %script_dir.display(), error = %e, "could not create script directory");
    }

    info!(
        entry = %config.entry_module,
        dev_support = config.dev_enabled(),
        libraries = config.native_libraries.len(),
        scripts = %script_dir.display(),
        "host config resolved"
    );
    config
}
