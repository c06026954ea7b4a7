// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ophan analytics module.
//
// Screen, component and page-view events from the scripting side are
// stamped with an event id, a timestamp and the session's user id, then
// appended to the record store on the blocking pool. Each call resolves
// with the primary argument it was given once the event is stored.

pub mod store;

use std::sync::{Arc, Mutex, PoisonError};

use mallard_bridge::{CompletionHandle, MethodTable, NativeModule};
use mallard_core::error::Result;
use mallard_core::types::{Arity, Value};
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::ModuleContext;
use store::{EventKind, OphanEvent, RecordStore};

struct OphanState {
    greeting: String,
    user_id: Mutex<Option<String>>,
    store: Mutex<RecordStore>,
    runtime: Handle,
}

impl OphanState {
    fn record(&self, kind: EventKind) -> Result<()> {
        let user_id = self
            .user_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let event = OphanEvent::new(kind, user_id);
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .append(&event)
    }
}

/// Run `job` on the blocking pool and complete `handle` with its outcome.
fn offload<F>(state: &Arc<OphanState>, handle: CompletionHandle, job: F)
where
    F: FnOnce(&OphanState) -> Result<Value> + Send + 'static,
{
    let worker = Arc::clone(state);
    state.runtime.spawn_blocking(move || {
        let outcome = job(&worker);
        handle.complete(outcome).ok();
    });
}

/// The `Ophan` native module.
pub struct Ophan {
    state: Arc<OphanState>,
    methods: MethodTable,
}

impl Ophan {
    pub const NAME: &'static str = "Ophan";

    pub fn new(store: RecordStore, greeting: impl Into<String>, runtime: Handle) -> Self {
        let state = Arc::new(OphanState {
            greeting: greeting.into(),
            user_id: Mutex::new(None),
            store: Mutex::new(store),
            runtime,
        });
        let methods = Self::exports(&state);
        Self { state, methods }
    }

    /// Build from host context, opening the configured record store (or an
    /// in-memory one when none is configured).
    pub fn from_context(ctx: &ModuleContext) -> Result<Self> {
        let store = match &ctx.config.analytics_store {
            Some(path) => RecordStore::open(path)?,
            None => RecordStore::open_in_memory()?,
        };
        info!(app_family = %ctx.config.app_family, "ophan analytics ready");
        let greeting = format!(
            "Hello from {} {} on {}",
            ctx.config.app_family, ctx.config.app_version, ctx.platform
        );
        Ok(Self::new(store, greeting, ctx.runtime.clone()))
    }

    pub fn user_id(&self) -> Option<String> {
        self.state
            .user_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn recent_events(&self, limit: usize) -> Result<Vec<OphanEvent>> {
        self.state
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recent(limit)
    }

    fn exports(state: &Arc<OphanState>) -> MethodTable {
        let greet = Arc::clone(state);
        let user = Arc::clone(state);
        let screen = Arc::clone(state);
        let component = Arc::clone(state);
        let page = Arc::clone(state);

        MethodTable::new()
            .async_method("getGreeting", Arity::Exact(0), move |_, handle| {
                offload(&greet, handle, |s| Ok(Value::from(s.greeting.clone())));
                Ok(())
            })
            .async_method("setUserId", Arity::Exact(1), move |args, handle| {
                let user_id = args.string(0, "userId")?;
                offload(&user, handle, move |s| {
                    *s.user_id.lock().unwrap_or_else(PoisonError::into_inner) =
                        Some(user_id.clone());
                    debug!("ophan user id updated");
                    Ok(Value::from(user_id))
                });
                Ok(())
            })
            .async_method(
                "sendAppScreenEvent",
                Arity::Range { min: 1, max: 2 },
                move |args, handle| {
                    let screen_name = args.string(0, "screenName")?;
                    let value = args.opt_string(1, "value")?;
                    offload(&screen, handle, move |s| {
                        s.record(EventKind::AppScreen {
                            screen_name: screen_name.clone(),
                            value,
                        })?;
                        Ok(Value::from(screen_name))
                    });
                    Ok(())
                },
            )
            .async_method(
                "sendComponentEvent",
                Arity::Range { min: 2, max: 4 },
                move |args, handle| {
                    let component_type = args.string(0, "componentType")?;
                    let action = args.string(1, "action")?;
                    let value = args.opt_string(2, "value")?;
                    let component_id = args.opt_string(3, "componentId")?;
                    offload(&component, handle, move |s| {
                        s.record(EventKind::Component {
                            component_type: component_type.clone(),
                            action,
                            value,
                            component_id,
                        })?;
                        Ok(Value::from(component_type))
                    });
                    Ok(())
                },
            )
            .async_method("sendPageViewEvent", Arity::Exact(1), move |args, handle| {
                let path = args.string(0, "path")?;
                offload(&page, handle, move |s| {
                    s.record(EventKind::PageView { path: path.clone() })?;
                    Ok(Value::from(path))
                });
                Ok(())
            })
    }
}

impl NativeModule for Ophan {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn methods(&self) -> &MethodTable {
        &self.methods
    }
}
