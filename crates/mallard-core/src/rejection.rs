// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Serialisable rejection payloads for the scripting side.
//
// The embedded engine sees a rejected call as a `{ code, message }` pair.
// Codes are stable strings so scripting code can branch on them without
// parsing messages.

use serde::{Deserialize, Serialize};

use crate::error::MallardError;

/// How the scripting side should treat a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    /// The call never reached a method (unknown module/method, bad arguments).
    Resolution,
    /// The method ran and reported a failure.
    Execution,
    /// The host itself is misconfigured or failed underneath the method.
    Host,
}

/// A rejected call as delivered to the embedded engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// Stable machine-readable code, e.g. `E_MODULE_NOT_FOUND`.
    pub code: String,
    /// Human-readable description.
    pub message: String,
    pub origin: Origin,
}

/// Stable code for each error variant.
pub fn error_code(err: &MallardError) -> &'static str {
    match err {
        MallardError::ModuleNotFound(_) => "E_MODULE_NOT_FOUND",
        MallardError::MethodNotFound { .. } => "E_METHOD_NOT_FOUND",
        MallardError::InvalidArguments { .. } => "E_INVALID_ARGUMENTS",
        MallardError::MethodFailed { .. } => "E_METHOD_FAILED",
        MallardError::MethodPanicked { .. } => "E_METHOD_PANICKED",
        MallardError::DoubleCompletion { .. } => "E_DOUBLE_COMPLETION",
        MallardError::UnresolvedCompletion { .. } => "E_UNRESOLVED",
        MallardError::DuplicateRegistration { .. } => "E_DUPLICATE_MODULE",
        MallardError::DuplicateMethod { .. } => "E_DUPLICATE_METHOD",
        MallardError::InvalidModuleName(_) => "E_INVALID_MODULE_NAME",
        MallardError::Loader(_) => "E_LOADER",
        MallardError::Engine(_) => "E_ENGINE",
        MallardError::Database(_) => "E_DATABASE",
        MallardError::Io(_) => "E_IO",
        MallardError::Serialization(_) => "E_SERIALIZATION",
    }
}

/// Convert a `MallardError` into the payload handed to the scripting side.
pub fn to_rejection(err: &MallardError) -> Rejection {
    let origin = match err {
        MallardError::ModuleNotFound(_)
        | MallardError::MethodNotFound { .. }
        | MallardError::InvalidArguments { .. } => Origin::Resolution,
        MallardError::MethodFailed { .. }
        | MallardError::MethodPanicked { .. }
        | MallardError::UnresolvedCompletion { .. }
        | MallardError::Database(_)
        | MallardError::Io(_)
        | MallardError::Serialization(_) => Origin::Execution,
        _ => Origin::Host,
    };

    Rejection {
        code: error_code(err).to_string(),
        message: err.to_string(),
        origin,
    }
}

impl From<&MallardError> for Rejection {
    fn from(err: &MallardError) -> Self {
        to_rejection(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_module_is_resolution() {
        let rejection = to_rejection(&MallardError::ModuleNotFound("Missing".into()));
        assert_eq!(rejection.code, "E_MODULE_NOT_FOUND");
        assert_eq!(rejection.origin, Origin::Resolution);
        assert!(rejection.message.contains("Missing"));
    }

    #[test]
    fn method_failure_is_execution() {
        let err = MallardError::MethodFailed {
            module: "Ophan".into(),
            method: "sendPageViewEvent".into(),
            reason: "store closed".into(),
        };
        let rejection = to_rejection(&err);
        assert_eq!(rejection.code, "E_METHOD_FAILED");
        assert_eq!(rejection.origin, Origin::Execution);
    }

    #[test]
    fn loader_failure_is_host() {
        let rejection = to_rejection(&MallardError::Loader("libophan.so".into()));
        assert_eq!(rejection.origin, Origin::Host);
    }

    #[test]
    fn rejection_serialises_as_code_and_message() {
        let rejection = to_rejection(&MallardError::MethodNotFound {
            module: "Ophan".into(),
            method: "nope".into(),
        });
        let json = serde_json::to_value(&rejection).unwrap();
        assert_eq!(json["code"], "E_METHOD_NOT_FOUND");
        assert_eq!(json["origin"], "Resolution");
    }
}
