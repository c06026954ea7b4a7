// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mallard — concrete native modules.
//
// Two fixed, ordered lists: the base platform set, registered first, and
// the application set. Adding a module means adding it to one of these
// lists; nothing is discovered at runtime.

pub mod ophan;
pub mod platform;

use mallard_bridge::NativeModule;
use mallard_core::HostConfig;
use mallard_core::error::Result;
use tokio::runtime::Handle;

pub use ophan::Ophan;
pub use platform::{NativeLog, PlatformConstants};

/// What a module may need from the host when it is constructed.
#[derive(Debug, Clone)]
pub struct ModuleContext {
    pub config: HostConfig,
    /// Platform name reported by the native loader.
    pub platform: String,
    /// Runtime used to offload blocking work.
    pub runtime: Handle,
}

/// Modules every host provides, in registration order.
pub fn base_modules(ctx: &ModuleContext) -> Result<Vec<Box<dyn NativeModule>>> {
    let modules: Vec<Box<dyn NativeModule>> = vec![
        Box::new(PlatformConstants::new(ctx)),
        Box::new(NativeLog::new()),
    ];
    Ok(modules)
}

/// Application-specific modules, registered after the base set.
pub fn app_modules(ctx: &ModuleContext) -> Result<Vec<Box<dyn NativeModule>>> {
    let modules: Vec<Box<dyn NativeModule>> = vec![Box::new(Ophan::from_context(ctx)?)];
    Ok(modules)
}
