// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Call bridge — routes scripting-side calls to native methods.
//
// Results always travel through the request's completion handle, for sync
// and async methods alike. Resolution failures (unknown module, unknown
// method, bad argument count) are delivered as rejections and never
// escape `dispatch`. The bridge has no timeout, retry or cancellation of
// its own.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use mallard_core::error::{MallardError, Result};
use mallard_core::types::{CallId, Value};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::args::Args;
use crate::completion::CompletionHandle;
use crate::registry::ModuleRegistry;
use crate::traits::Handler;

/// A single named call from the scripting side.
#[derive(Debug)]
pub struct InvocationRequest {
    pub call_id: CallId,
    pub module: String,
    pub method: String,
    pub args: Vec<Value>,
    pub handle: CompletionHandle,
}

impl InvocationRequest {
    /// Build a request whose result is delivered to `sink`.
    pub fn new<F>(
        module: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Value>,
        sink: F,
    ) -> Self
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        let module = module.into();
        let method = method.into();
        let handle = CompletionHandle::new(module.clone(), method.clone(), sink);
        Self {
            call_id: CallId::new(),
            module,
            method,
            args,
            handle,
        }
    }

    /// Build a request paired with a receiver for its result.
    pub fn with_channel(
        module: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Value>,
    ) -> (Self, oneshot::Receiver<Result<Value>>) {
        let module = module.into();
        let method = method.into();
        let (handle, rx) = CompletionHandle::channel(module.clone(), method.clone());
        let request = Self {
            call_id: CallId::new(),
            module,
            method,
            args,
            handle,
        };
        (request, rx)
    }
}

/// Dispatches invocation requests against a shared, read-only registry.
///
/// Cheap to clone; every clone shares the same registry.
#[derive(Clone)]
pub struct CallBridge {
    registry: Arc<ModuleRegistry>,
    dev_support: bool,
}

impl CallBridge {
    pub fn new(registry: ModuleRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            dev_support: false,
        }
    }

    /// Log arguments and outcomes of every dispatch. Diagnostics only.
    pub fn with_dev_support(mut self, enabled: bool) -> Self {
        self.dev_support = enabled;
        self
    }

    pub fn dev_support(&self) -> bool {
        self.dev_support
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Route `request` to its method. Never fails directly: every outcome,
    /// including resolution errors, is delivered through the request's
    /// completion handle.
    pub fn dispatch(&self, request: InvocationRequest) {
        let InvocationRequest {
            call_id,
            module,
            method,
            args,
            handle,
        } = request;

        if self.dev_support {
            debug!(%call_id, %module, %method, ?args, "bridge dispatch");
        } else {
            trace!(%call_id, %module, %method, "bridge dispatch");
        }

        let Some(native) = self.registry.resolve(&module) else {
            debug!(%call_id, %module, "call to unregistered module");
            handle.reject(MallardError::ModuleNotFound(module)).ok();
            return;
        };

        let Some(entry) = native.methods().get(&method) else {
            debug!(%call_id, %module, %method, "call to unexported method");
            handle
                .reject(MallardError::MethodNotFound { module, method })
                .ok();
            return;
        };

        if !entry.arity().accepts(args.len()) {
            let reason = format!("expected {}, got {}", entry.arity(), args.len());
            handle
                .reject(MallardError::InvalidArguments {
                    module,
                    method,
                    reason,
                })
                .ok();
            return;
        }

        let args = Args::new(module.as_str(), method.as_str(), args);
        match entry.handler() {
            Handler::Sync(run) => {
                let outcome = catch_unwind(AssertUnwindSafe(|| run(&args)))
                    .unwrap_or_else(|payload| Err(panicked(&module, &method, payload)));
                if self.dev_support {
                    debug!(%call_id, ok = outcome.is_ok(), "sync method returned");
                }
                handle.complete(outcome).ok();
            }
            Handler::Async(run) => {
                let guard = handle.clone();
                let failure = match catch_unwind(AssertUnwindSafe(|| run(args, handle))) {
                    Ok(Ok(())) => None,
                    Ok(Err(err)) => Some(err),
                    Err(payload) => Some(panicked(&module, &method, payload)),
                };

                if let Some(err) = failure {
                    if guard.is_completed() {
                        warn!(%call_id, %module, %method, error = %err,
                            "method failed after completing its handle; error dropped");
                    } else {
                        guard.reject(err).ok();
                    }
                }
            }
        }
    }

    /// Dispatch a call and wait for its result.
    pub async fn call(
        &self,
        module: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Value>,
    ) -> Result<Value> {
        let (request, rx) = InvocationRequest::with_channel(module, method, args);
        let (module, method) = (request.module.clone(), request.method.clone());
        self.dispatch(request);
        // The handle's drop guard always sends, so a closed channel means
        // the sink itself was lost.
        rx.await
            .unwrap_or(Err(MallardError::UnresolvedCompletion { module, method }))
    }
}

impl std::fmt::Debug for CallBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallBridge")
            .field("registry", &self.registry)
            .field("dev_support", &self.dev_support)
            .finish()
    }
}

fn panicked(module: &str, method: &str, payload: Box<dyn Any + Send>) -> MallardError {
    let reason = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".into());
    MallardError::MethodPanicked {
        module: module.to_string(),
        method: method.to_string(),
        reason,
    }
}
