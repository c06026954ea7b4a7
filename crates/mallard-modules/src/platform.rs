// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Base platform modules, registered ahead of every application module.

use mallard_bridge::{MethodTable, NativeModule};
use mallard_core::types::{Arity, Value};
use serde_json::json;
use tracing::{debug, error, info, trace, warn};

use crate::ModuleContext;

/// Static facts about the host, for the scripting side to read at startup.
pub struct PlatformConstants {
    methods: MethodTable,
}

impl PlatformConstants {
    pub const NAME: &'static str = "PlatformConstants";

    pub fn new(ctx: &ModuleContext) -> Self {
        let constants = json!({
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "platform": ctx.platform,
            "devSupport": ctx.config.dev_enabled(),
            "entryModule": ctx.config.entry_module,
            "version": ctx.config.app_version,
        });
        let methods = MethodTable::new().sync_method("getConstants", Arity::Exact(0), move |_| {
            Ok(constants.clone())
        });
        Self { methods }
    }
}

impl NativeModule for PlatformConstants {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn methods(&self) -> &MethodTable {
        &self.methods
    }
}

/// Forwards scripting-side log lines into the host's tracing output.
pub struct NativeLog {
    methods: MethodTable,
}

impl NativeLog {
    pub const NAME: &'static str = "NativeLog";

    pub fn new() -> Self {
        let methods = MethodTable::new().sync_method("log", Arity::Exact(2), |args| {
            let level = args.string(0, "level")?;
            let message = args.string(1, "message")?;
            match level.as_str() {
                "trace" => trace!(target: "script", "{message}"),
                "debug" => debug!(target: "script", "{message}"),
                "info" | "log" => info!(target: "script", "{message}"),
                "warn" => warn!(target: "script", "{message}"),
                "error" => error!(target: "script", "{message}"),
                other => return Err(args.invalid(format!("unknown log level {other:?}"))),
            }
            Ok(Value::Null)
        });
        Self { methods }
    }
}

impl Default for NativeLog {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeModule for NativeLog {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn methods(&self) -> &MethodTable {
        &self.methods
    }
}
