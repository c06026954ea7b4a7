// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One-shot completion handles.
//
// A handle wraps the caller's result sink. The first `resolve`/`reject`
// consumes the sink; any later attempt is reported as `DoubleCompletion`
// and leaves the delivered result untouched. When the last clone of a
// handle is dropped without a result, the sink receives
// `UnresolvedCompletion` so the caller is not left waiting.

use std::sync::{Arc, Mutex, PoisonError};

use mallard_core::error::{MallardError, Result};
use mallard_core::types::Value;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

type Sink = Box<dyn FnOnce(Result<Value>) + Send + 'static>;

struct Slot {
    module: String,
    method: String,
    sink: Mutex<Option<Sink>>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        let sink = self
            .sink
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sink) = sink {
            warn!(
                module = %self.module,
                method = %self.method,
                "completion handle dropped without a result"
            );
            sink(Err(MallardError::UnresolvedCompletion {
                module: self.module.clone(),
                method: self.method.clone(),
            }));
        }
    }
}

/// Delivers exactly one result for a bridge call.
///
/// Cloning is cheap; all clones share the same one-shot slot.
#[derive(Clone)]
pub struct CompletionHandle {
    slot: Arc<Slot>,
}

impl CompletionHandle {
    /// Wrap a result sink for a call to `module.method`.
    pub fn new<F>(module: impl Into<String>, method: impl Into<String>, sink: F) -> Self
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        Self {
            slot: Arc::new(Slot {
                module: module.into(),
                method: method.into(),
                sink: Mutex::new(Some(Box::new(sink))),
            }),
        }
    }

    /// Handle whose result is delivered through a tokio oneshot channel.
    pub fn channel(
        module: impl Into<String>,
        method: impl Into<String>,
    ) -> (Self, oneshot::Receiver<Result<Value>>) {
        let (tx, rx) = oneshot::channel();
        let handle = Self::new(module, method, move |outcome| {
            if tx.send(outcome).is_err() {
                debug!("bridge result discarded: receiver dropped");
            }
        });
        (handle, rx)
    }

    pub fn resolve(&self, value: impl Into<Value>) -> Result<()> {
        self.complete(Ok(value.into()))
    }

    pub fn reject(&self, err: MallardError) -> Result<()> {
        self.complete(Err(err))
    }

    /// Deliver `outcome` if this is the first completion.
    ///
    /// Returns `DoubleCompletion` (and logs it) when the handle has already
    /// been completed; `outcome` is discarded in that case.
    pub fn complete(&self, outcome: Result<Value>) -> Result<()> {
        let sink = self
            .slot
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sink {
            Some(sink) => {
                sink(outcome);
                Ok(())
            }
            None => {
                error!(
                    module = %self.slot.module,
                    method = %self.slot.method,
                    discarded = ?outcome,
                    "completion handle invoked more than once"
                );
                Err(MallardError::DoubleCompletion {
                    module: self.slot.module.clone(),
                    method: self.slot.method.clone(),
                })
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        self.slot
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    pub fn module(&self) -> &str {
        &self.slot.module
    }

    pub fn method(&self) -> &str {
        &self.slot.method
    }
}

impl std::fmt::Debug for CompletionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionHandle")
            .field("module", &self.slot.module)
            .field("method", &self.slot.method)
            .field("completed", &self.is_completed())
            .finish()
    }
}
