// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host application — the single startup entry point.
//
// Startup always runs in the same order: native loader, then module
// registry, then engine. `start` consumes the application, so a process
// cannot run it twice through the same value.

use mallard_bridge::{CallBridge, ModuleRegistry, NativeLoader, NativeModule};
use mallard_core::HostConfig;
use mallard_core::error::Result;
use mallard_modules::ModuleContext;
use tokio::runtime::Handle;
use tracing::{error, info};

use crate::engine::{EngineContext, ScriptEngine};

/// Builds one ordered module list from the host context.
pub type ModuleList = fn(&ModuleContext) -> Result<Vec<Box<dyn NativeModule>>>;

pub struct HostApplication {
    config: HostConfig,
    loader: Box<dyn NativeLoader>,
    runtime: Handle,
    base: ModuleList,
    app: ModuleList,
}

/// A started host: the bridge handed to the engine, kept for diagnostics.
#[derive(Debug)]
pub struct RunningHost {
    pub bridge: CallBridge,
    pub entry_module: String,
}

impl HostApplication {
    /// Host with the standard base platform and application module lists.
    pub fn new(config: HostConfig, loader: Box<dyn NativeLoader>, runtime: Handle) -> Self {
        Self::with_modules(
            config,
            loader,
            runtime,
            mallard_modules::base_modules,
            mallard_modules::app_modules,
        )
    }

    pub fn with_modules(
        config: HostConfig,
        loader: Box<dyn NativeLoader>,
        runtime: Handle,
        base: ModuleList,
        app: ModuleList,
    ) -> Self {
        Self {
            config,
            loader,
            runtime,
            base,
            app,
        }
    }

    /// Run loader init, build the registry, and start `engine` with it.
    ///
    /// Any failure stops bootstrap at that step; later steps do not run.
    pub fn start(self, engine: &mut dyn ScriptEngine) -> Result<RunningHost> {
        let platform = self.loader.platform_name().to_string();
        info!(%platform, dev_support = self.config.dev_enabled(), "host starting");

        self.loader.init().inspect_err(|e| {
            error!(error = %e, "native loader failed");
        })?;

        let ctx = ModuleContext {
            config: self.config.clone(),
            platform,
            runtime: self.runtime.clone(),
        };
        let registry = ModuleRegistry::build((self.base)(&ctx)?, (self.app)(&ctx)?)
            .inspect_err(|e| error!(error = %e, "module registry rejected"))?;

        let bridge = CallBridge::new(registry).with_dev_support(self.config.dev_enabled());
        let entry_module = self.config.entry_module.clone();

        engine
            .start(EngineContext {
                bridge: bridge.clone(),
                entry_module: entry_module.clone(),
                dev_support: self.config.dev_enabled(),
                runtime: self.runtime,
            })
            .inspect_err(|e| error!(engine = engine.name(), error = %e, "engine failed to start"))?;

        info!(engine = engine.name(), entry = %entry_module, modules = bridge.registry().len(), "host started");
        Ok(RunningHost {
            bridge,
            entry_module,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mallard_bridge::MethodTable;
    use mallard_core::MallardError;
    use mallard_core::types::Arity;
    use std::sync::{Arc, Mutex};

    // Startup steps are recorded into this per-test log through the loader
    // and the engine; module lists write to a thread-local copy.
    type Log = Arc<Mutex<Vec<&'static str>>>;

    thread_local! {
        static LIST_LOG: std::cell::RefCell<Vec<&'static str>> = const { std::cell::RefCell::new(Vec::new()) };
    }

    struct RecordingLoader {
        log: Log,
        fail: bool,
    }

    impl NativeLoader for RecordingLoader {
        fn platform_name(&self) -> &str {
            "Test"
        }

        fn init(&self) -> Result<()> {
            self.log.lock().unwrap().push("loader");
            if self.fail {
                Err(MallardError::Loader("no such library".into()))
            } else {
                Ok(())
            }
        }
    }

    struct RecordingEngine {
        log: Log,
        ctx: Option<EngineContext>,
    }

    impl ScriptEngine for RecordingEngine {
        fn name(&self) -> &str {
            "recording"
        }

        fn start(&mut self, ctx: EngineContext) -> Result<()> {
            self.log.lock().unwrap().push("engine");
            self.ctx = Some(ctx);
            Ok(())
        }
    }

    struct Named {
        name: &'static str,
        methods: MethodTable,
    }

    impl NativeModule for Named {
        fn name(&self) -> &str {
            self.name
        }

        fn methods(&self) -> &MethodTable {
            &self.methods
        }
    }

    fn named(name: &'static str) -> Box<dyn NativeModule> {
        Box::new(Named {
            name,
            methods: MethodTable::new().async_method("ping", Arity::Exact(0), |_, h| {
                h.resolve("pong")
            }),
        })
    }

    fn base_ab(_: &ModuleContext) -> Result<Vec<Box<dyn NativeModule>>> {
        LIST_LOG.with(|l| l.borrow_mut().push("base"));
        Ok(vec![named("A"), named("B")])
    }

    fn app_c(_: &ModuleContext) -> Result<Vec<Box<dyn NativeModule>>> {
        LIST_LOG.with(|l| l.borrow_mut().push("app"));
        Ok(vec![named("C")])
    }

    fn app_dup(_: &ModuleContext) -> Result<Vec<Box<dyn NativeModule>>> {
        Ok(vec![named("A")])
    }

    fn host(log: &Log, fail_loader: bool, app: ModuleList) -> HostApplication {
        let config = HostConfig {
            entry_module: "index".into(),
            dev_support: Some(true),
            ..HostConfig::default()
        };
        HostApplication::with_modules(
            config,
            Box::new(RecordingLoader {
                log: Arc::clone(log),
                fail: fail_loader,
            }),
            Handle::current(),
            base_ab,
            app,
        )
    }

    fn engine(log: &Log) -> RecordingEngine {
        RecordingEngine {
            log: Arc::clone(log),
            ctx: None,
        }
    }

    #[tokio::test]
    async fn startup_order_and_registry_contents() {
        LIST_LOG.with(|l| l.borrow_mut().clear());
        let log = Log::default();
        let mut engine = engine(&log);

        let running = host(&log, false, app_c).start(&mut engine).unwrap();

        assert_eq!(*log.lock().unwrap(), ["loader", "engine"]);
        LIST_LOG.with(|l| assert_eq!(*l.borrow(), ["base", "app"]));
        assert_eq!(running.bridge.registry().names(), ["A", "B", "C"]);
        assert_eq!(running.entry_module, "index");

        let ctx = engine.ctx.expect("engine started");
        assert_eq!(ctx.entry_module, "index");
        assert!(ctx.dev_support);
        assert_eq!(ctx.bridge.call("B", "ping", vec![]).await.unwrap(), "pong");
    }

    #[tokio::test]
    async fn loader_failure_stops_bootstrap() {
        LIST_LOG.with(|l| l.borrow_mut().clear());
        let log = Log::default();
        let mut engine = engine(&log);

        let err = host(&log, true, app_c).start(&mut engine).unwrap_err();

        assert!(matches!(err, MallardError::Loader(_)));
        assert_eq!(*log.lock().unwrap(), ["loader"]);
        LIST_LOG.with(|l| assert!(l.borrow().is_empty()));
        assert!(engine.ctx.is_none());
    }

    #[tokio::test]
    async fn duplicate_module_is_fatal_before_engine_start() {
        let log = Log::default();
        let mut engine = engine(&log);

        let err = host(&log, false, app_dup).start(&mut engine).unwrap_err();

        assert!(matches!(
            err,
            MallardError::DuplicateRegistration { ref name, first: 0, second: 2 } if name == "A"
        ));
        assert_eq!(*log.lock().unwrap(), ["loader"]);
        assert!(engine.ctx.is_none());
    }

    #[tokio::test]
    async fn standard_lists_start_with_replay_script() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("index.jsonl"),
            "{\"module\": \"PlatformConstants\", \"method\": \"getConstants\"}\n\
             {\"module\": \"Ophan\", \"method\": \"sendPageViewEvent\", \"args\": [\"/uk\"]}\n",
        )
        .unwrap();

        let loader = mallard_bridge::platform_loader(Vec::new());
        let app = HostApplication::new(HostConfig::default(), loader, Handle::current());
        let mut engine = crate::engine::ReplayEngine::new(dir.path());

        let running = app.start(&mut engine).unwrap();
        assert_eq!(
            running.bridge.registry().names(),
            ["PlatformConstants", "NativeLog", "Ophan"]
        );

        let summary = engine.join().await.unwrap();
        assert_eq!(summary.resolved(), 2);
        assert_eq!(summary.outcomes[1].as_ref().unwrap(), "/uk");
    }
}
