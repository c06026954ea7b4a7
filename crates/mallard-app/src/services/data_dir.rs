// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::PathBuf;

/// Return the host data directory, creating it if needed.
///
/// On desktop this uses a conventional location. On mobile the native loader
/// library should point `MALLARD_DATA_DIR` at the app's sandbox instead.
pub fn data_dir() -> PathBuf {
    let dir = match std::env::var("MALLARD_DATA_DIR") {
        Ok(explicit) => PathBuf::from(explicit),
        Err(_) => dirs_fallback().join("mallard"),
    };
    std::fs::create_dir_all(&dir).ok();
    dir
}

fn dirs_fallback() -> PathBuf {
    // Try XDG data dir, then fallback to home
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort
    std::env::temp_dir()
}
