// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the Mallard host shell.

use thiserror::Error;

/// Top-level error type for all Mallard operations.
#[derive(Debug, Error)]
pub enum MallardError {
    // -- Call resolution (delivered to the caller as rejections) --
    #[error("native module not found: {0}")]
    ModuleNotFound(String),

    #[error("method {method} not found on native module {module}")]
    MethodNotFound { module: String, method: String },

    #[error("invalid arguments for {module}.{method}: {reason}")]
    InvalidArguments {
        module: String,
        method: String,
        reason: String,
    },

    // -- Method execution --
    #[error("{module}.{method} failed: {reason}")]
    MethodFailed {
        module: String,
        method: String,
        reason: String,
    },

    #[error("{module}.{method} panicked: {reason}")]
    MethodPanicked {
        module: String,
        method: String,
        reason: String,
    },

    #[error("{module}.{method} completed more than once")]
    DoubleCompletion { module: String, method: String },

    #[error("{module}.{method} dropped its completion handle without a result")]
    UnresolvedCompletion { module: String, method: String },

    // -- Registration (fatal at startup) --
    #[error("native module {name:?} registered twice (positions {first} and {second})")]
    DuplicateRegistration {
        name: String,
        first: usize,
        second: usize,
    },

    #[error("native module {module} declares method {method} more than once")]
    DuplicateMethod { module: String, method: String },

    #[error("native module at position {0} has an empty name")]
    InvalidModuleName(usize),

    // -- Host bootstrap --
    #[error("native loader failed: {0}")]
    Loader(String),

    #[error("scripting engine error: {0}")]
    Engine(String),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MallardError {
    /// Whether this error is a startup configuration fault rather than a
    /// per-call failure.
    pub fn is_registration_fault(&self) -> bool {
        matches!(
            self,
            Self::DuplicateRegistration { .. }
                | Self::DuplicateMethod { .. }
                | Self::InvalidModuleName(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MallardError>;
