// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native code loader.
//
// Opens the shared libraries native modules depend on before any module is
// constructed. Libraries are recorded in a process-wide table and stay
// mapped until the process exits, so a path is opened at most once no
// matter how many loaders name it. Each loader also caches its first
// `init` outcome, so repeated calls neither reload nor retry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, OnceLock, PoisonError};

use libloading::Library;
use mallard_core::error::{MallardError, Result};
use tracing::{debug, info, instrument, warn};

/// Every library opened by any loader in this process, by configured path.
static PROCESS_LIBRARIES: LazyLock<Mutex<HashMap<PathBuf, Arc<Library>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Whether `path` has been loaded into this process by any loader.
pub fn is_process_loaded(path: &Path) -> bool {
    PROCESS_LIBRARIES
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_key(path)
}

/// Platform hook run before the module registry is built.
pub trait NativeLoader: Send + Sync {
    /// Human-readable platform name (e.g. "Android", "iOS", "Desktop").
    fn platform_name(&self) -> &str;

    /// Prepare native code. Idempotent.
    fn init(&self) -> Result<()>;
}

/// Loader that opens a fixed list of shared libraries into the process.
pub struct ProcessLoader {
    platform: &'static str,
    libraries: Vec<PathBuf>,
    loaded: OnceLock<std::result::Result<Vec<Arc<Library>>, String>>,
}

impl ProcessLoader {
    pub fn new(platform: &'static str, libraries: Vec<PathBuf>) -> Self {
        Self {
            platform,
            libraries,
            loaded: OnceLock::new(),
        }
    }

    /// Number of libraries currently held open.
    pub fn loaded_count(&self) -> usize {
        match self.loaded.get() {
            Some(Ok(libs)) => libs.len(),
            _ => 0,
        }
    }

    #[instrument(skip_all, fields(platform = self.platform, count = self.libraries.len()))]
    fn load_all(&self) -> std::result::Result<Vec<Arc<Library>>, String> {
        let mut process = PROCESS_LIBRARIES
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut libs = Vec::with_capacity(self.libraries.len());
        for path in &self.libraries {
            if let Some(lib) = process.get(path) {
                debug!(path = %path.display(), "native library already loaded");
                libs.push(Arc::clone(lib));
                continue;
            }
            // SAFETY: only libraries named in the host configuration are
            // opened; running their initialisers is the point of loading.
            let lib = unsafe { Library::new(path) }.map_err(|e| {
                warn!(path = %path.display(), error = %e, "native library failed to load");
                format!("{}: {e}", path.display())
            })?;
            info!(path = %path.display(), "native library loaded");
            let lib = Arc::new(lib);
            process.insert(path.clone(), Arc::clone(&lib));
            libs.push(lib);
        }
        Ok(libs)
    }
}

impl NativeLoader for ProcessLoader {
    fn platform_name(&self) -> &str {
        self.platform
    }

    fn init(&self) -> Result<()> {
        match self.loaded.get_or_init(|| self.load_all()) {
            Ok(_) => Ok(()),
            Err(reason) => Err(MallardError::Loader(reason.clone())),
        }
    }
}

/// Retrieves the loader for the target operating system.
pub fn platform_loader(libraries: Vec<PathBuf>) -> Box<dyn NativeLoader> {
    Box::new(ProcessLoader::new(platform_name(), libraries))
}

fn platform_name() -> &'static str {
    #[cfg(target_os = "ios")]
    {
        "iOS"
    }
    #[cfg(target_os = "android")]
    {
        "Android"
    }
    #[cfg(not(any(target_os = "ios", target_os = "android")))]
    {
        "Desktop"
    }
}
