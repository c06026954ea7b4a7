// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types shared between the bridge, the modules and the host.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque engine value passed across the bridge.
pub type Value = serde_json::Value;

/// Unique identifier for a single bridge call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Argument-count constraint a method may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Arity {
    /// No constraint.
    #[default]
    Any,
    /// Exactly this many arguments.
    Exact(usize),
    /// Between `min` and `max` arguments, inclusive. Trailing optional
    /// arguments are expressed this way.
    Range { min: usize, max: usize },
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Any => true,
            Arity::Exact(n) => count == n,
            Arity::Range { min, max } => (min..=max).contains(&count),
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Any => write!(f, "any number of arguments"),
            Arity::Exact(1) => write!(f, "1 argument"),
            Arity::Exact(n) => write!(f, "{n} arguments"),
            Arity::Range { min, max } => write!(f, "{min} to {max} arguments"),
        }
    }
}

/// How a method delivers its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodKind {
    /// Returns a value directly; the bridge completes the handle.
    Sync,
    /// Receives the completion handle and completes it itself.
    Async,
}
