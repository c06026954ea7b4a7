// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Embedded scripting engine seam.
//
// The host only needs an engine to accept the call bridge and an entry
// module name. `ReplayEngine` is a headless stand-in that reads a script of
// bridge calls (one JSON object per line) and plays them back in order.

use std::path::PathBuf;

use mallard_bridge::CallBridge;
use mallard_core::error::{MallardError, Result};
use mallard_core::rejection::{Rejection, to_rejection};
use mallard_core::types::Value;
use serde::Deserialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Everything an engine receives when the host starts it.
#[derive(Debug, Clone)]
pub struct EngineContext {
    pub bridge: CallBridge,
    pub entry_module: String,
    pub dev_support: bool,
    /// Runtime the engine spawns its own work on. `start` may be called
    /// from a thread outside any runtime.
    pub runtime: Handle,
}

/// An embedded scripting runtime the host can start.
pub trait ScriptEngine {
    fn name(&self) -> &str;

    /// Load the entry module with the bridge attached. Must return promptly;
    /// long-running evaluation belongs on the engine's own task or thread.
    fn start(&mut self, ctx: EngineContext) -> Result<()>;
}

/// One line of a replay script.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptCall {
    pub module: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Outcomes of a replayed script, in call order.
#[derive(Debug, Clone, Default)]
pub struct ReplaySummary {
    pub outcomes: Vec<std::result::Result<Value, Rejection>>,
}

impl ReplaySummary {
    pub fn resolved(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn rejected(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_err()).count()
    }
}

/// Parse a replay script. Blank lines and `//` comments are skipped.
pub fn parse_script(source: &str) -> Result<Vec<ScriptCall>> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("//"))
        .map(|line| serde_json::from_str(line).map_err(MallardError::from))
        .collect()
}

/// Headless engine that replays `<script_dir>/<entry_module>.jsonl`.
pub struct ReplayEngine {
    script_dir: PathBuf,
    task: Option<JoinHandle<ReplaySummary>>,
}

impl ReplayEngine {
    pub fn new(script_dir: impl Into<PathBuf>) -> Self {
        Self {
            script_dir: script_dir.into(),
            task: None,
        }
    }

    /// Wait for the replay to finish.
    pub async fn join(&mut self) -> Result<ReplaySummary> {
        let task = self
            .task
            .take()
            .ok_or_else(|| MallardError::Engine("replay engine was never started".into()))?;
        task.await
            .map_err(|e| MallardError::Engine(format!("replay task failed: {e}")))
    }
}

impl ScriptEngine for ReplayEngine {
    fn name(&self) -> &str {
        "replay"
    }

    fn start(&mut self, ctx: EngineContext) -> Result<()> {
        if self.task.is_some() {
            return Err(MallardError::Engine("replay engine already started".into()));
        }

        let path = self.script_dir.join(format!("{}.jsonl", ctx.entry_module));
        let source = std::fs::read_to_string(&path).inspect_err(|e| {
            warn!(path = %path.display(), error = %e, "entry script unreadable; nothing to replay");
        })?;
        let calls = parse_script(&source)?;
        info!(path = %path.display(), calls = calls.len(), "replay script loaded");

        let runtime = ctx.runtime.clone();
        self.task = Some(runtime.spawn(replay(calls, ctx)));
        Ok(())
    }
}

async fn replay(calls: Vec<ScriptCall>, ctx: EngineContext) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for call in calls {
        let outcome = ctx
            .bridge
            .call(call.module.as_str(), call.method.as_str(), call.args)
            .await;
        match outcome {
            Ok(value) => {
                if ctx.dev_support {
                    debug!(module = %call.module, method = %call.method, %value, "call resolved");
                } else {
                    info!(module = %call.module, method = %call.method, "call resolved");
                }
                summary.outcomes.push(Ok(value));
            }
            Err(err) => {
                let rejection = to_rejection(&err);
                warn!(
                    module = %call.module,
                    method = %call.method,
                    code = %rejection.code,
                    "call rejected: {}", rejection.message
                );
                summary.outcomes.push(Err(rejection));
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use mallard_bridge::{MethodTable, ModuleRegistry, NativeModule};
    use mallard_core::types::Arity;

    struct Greeter {
        methods: MethodTable,
    }

    impl NativeModule for Greeter {
        fn name(&self) -> &str {
            "Greeter"
        }

        fn methods(&self) -> &MethodTable {
            &self.methods
        }
    }

    fn context(entry: &str) -> EngineContext {
        let greeter = Greeter {
            methods: MethodTable::new()
                .async_method("getGreeting", Arity::Exact(0), |_, h| h.resolve("hello")),
        };
        let modules: Vec<Box<dyn NativeModule>> = vec![Box::new(greeter)];
        EngineContext {
            bridge: CallBridge::new(ModuleRegistry::build(Vec::new(), modules).unwrap()),
            entry_module: entry.into(),
            dev_support: false,
            runtime: Handle::current(),
        }
    }

    #[test]
    fn parse_skips_blanks_and_comments() {
        let calls = parse_script(
            r#"
            // warm up
            {"module": "Greeter", "method": "getGreeting"}

            {"module": "Ophan", "method": "sendPageViewEvent", "args": ["/uk"]}
            "#,
        )
        .unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].args.is_empty());
        assert_eq!(calls[1].args[0], "/uk");
    }

    #[test]
    fn malformed_line_is_serialization_error() {
        let err = parse_script("{not json}").unwrap_err();
        assert!(matches!(err, MallardError::Serialization(_)));
    }

    #[tokio::test]
    async fn replays_entry_script_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("index.jsonl"),
            "{\"module\": \"Greeter\", \"method\": \"getGreeting\"}\n\
             {\"module\": \"Missing\", \"method\": \"x\"}\n",
        )
        .unwrap();

        let mut engine = ReplayEngine::new(dir.path());
        engine.start(context("index")).unwrap();
        let summary = engine.join().await.unwrap();

        assert_eq!(summary.resolved(), 1);
        assert_eq!(summary.rejected(), 1);
        assert_eq!(summary.outcomes[0].as_ref().unwrap(), "hello");
        let rejection = summary.outcomes[1].as_ref().unwrap_err();
        assert_eq!(rejection.code, "E_MODULE_NOT_FOUND");
        assert!(rejection.message.contains("Missing"));
    }

    #[tokio::test]
    async fn starts_from_thread_outside_the_runtime() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("index.jsonl"),
            "{\"module\": \"Greeter\", \"method\": \"getGreeting\"}\n",
        )
        .unwrap();

        let ctx = context("index");
        let mut engine = ReplayEngine::new(dir.path());
        let mut engine = std::thread::spawn(move || {
            assert!(Handle::try_current().is_err());
            engine.start(ctx).map(|()| engine)
        })
        .join()
        .expect("start thread")
        .unwrap();

        let summary = engine.join().await.unwrap();
        assert_eq!(summary.resolved(), 1);
    }

    #[tokio::test]
    async fn missing_entry_script_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut engine = ReplayEngine::new(dir.path());
        let err = engine.start(context("nowhere")).unwrap_err();
        assert!(matches!(err, MallardError::Io(_)));
        assert!(engine.join().await.is_err());
    }
}
