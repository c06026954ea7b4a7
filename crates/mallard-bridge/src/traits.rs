// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The native module contract.
//
// A native module is anything that has a stable name and an explicit table
// of exported methods. Only methods placed in the table are reachable from
// the scripting side.

use std::collections::HashMap;

use mallard_core::error::Result;
use mallard_core::types::{Arity, MethodKind, Value};

use crate::args::Args;
use crate::completion::CompletionHandle;

/// Handler that returns its result directly.
pub type SyncHandler = dyn Fn(&Args) -> Result<Value> + Send + Sync;

/// Handler that completes the supplied handle, possibly later and from
/// another thread. Returning `Err` before completing the handle rejects
/// the call with that error.
pub type AsyncHandler = dyn Fn(Args, CompletionHandle) -> Result<()> + Send + Sync;

pub enum Handler {
    Sync(Box<SyncHandler>),
    Async(Box<AsyncHandler>),
}

/// A single exported method.
pub struct Method {
    name: String,
    arity: Arity,
    handler: Handler,
}

impl Method {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn kind(&self) -> MethodKind {
        match self.handler {
            Handler::Sync(_) => MethodKind::Sync,
            Handler::Async(_) => MethodKind::Async,
        }
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Exported methods of one module, in declaration order.
///
/// Declaring the same name twice is recorded and rejected when the module
/// is registered.
#[derive(Debug, Default)]
pub struct MethodTable {
    methods: Vec<Method>,
    index: HashMap<String, usize>,
    duplicates: Vec<String>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export a method that returns its value directly.
    pub fn sync_method<F>(mut self, name: impl Into<String>, arity: Arity, handler: F) -> Self
    where
        F: Fn(&Args) -> Result<Value> + Send + Sync + 'static,
    {
        self.insert(name.into(), arity, Handler::Sync(Box::new(handler)));
        self
    }

    /// Export a method that completes a `CompletionHandle`.
    pub fn async_method<F>(mut self, name: impl Into<String>, arity: Arity, handler: F) -> Self
    where
        F: Fn(Args, CompletionHandle) -> Result<()> + Send + Sync + 'static,
    {
        self.insert(name.into(), arity, Handler::Async(Box::new(handler)));
        self
    }

    fn insert(&mut self, name: String, arity: Arity, handler: Handler) {
        if self.index.contains_key(&name) {
            self.duplicates.push(name);
            return;
        }
        self.index.insert(name.clone(), self.methods.len());
        self.methods.push(Method {
            name,
            arity,
            handler,
        });
    }

    pub fn get(&self, name: &str) -> Option<&Method> {
        self.index.get(name).map(|&i| &self.methods[i])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(Method::name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Names declared more than once, in the order the repeats were seen.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }
}

/// A named unit of native functionality callable from the scripting side.
///
/// Implementors build their `MethodTable` once (typically in `new`) and
/// return it by reference; handlers capture whatever shared state the
/// module needs.
pub trait NativeModule: Send + Sync {
    /// Stable, non-empty name, unique within a registry.
    fn name(&self) -> &str;

    /// Methods exported for remote invocation.
    fn methods(&self) -> &MethodTable;
}
