// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Positional argument access for native method handlers.

use serde::de::DeserializeOwned;

use mallard_core::error::{MallardError, Result};
use mallard_core::types::Value;

/// Arguments of a single call, labelled with the method they belong to so
/// extraction failures produce a complete `InvalidArguments` error.
#[derive(Debug, Clone)]
pub struct Args {
    module: String,
    method: String,
    values: Vec<Value>,
}

impl Args {
    pub fn new(module: impl Into<String>, method: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            module: module.into(),
            method: method.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Required string argument.
    pub fn string(&self, index: usize, name: &str) -> Result<String> {
        match self.values.get(index) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(self.invalid(format!(
                "argument {index} ({name}) must be a string, got {}",
                type_name(other)
            ))),
            None => Err(self.invalid(format!("missing argument {index} ({name})"))),
        }
    }

    /// Optional string argument; absent and `null` both read as `None`.
    pub fn opt_string(&self, index: usize, name: &str) -> Result<Option<String>> {
        match self.values.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.string(index, name).map(Some),
        }
    }

    /// Deserialize an argument into any serde type.
    pub fn parse<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T> {
        let value = self
            .values
            .get(index)
            .cloned()
            .ok_or_else(|| self.invalid(format!("missing argument {index} ({name})")))?;
        serde_json::from_value(value)
            .map_err(|e| self.invalid(format!("argument {index} ({name}): {e}")))
    }

    /// `InvalidArguments` for this call.
    pub fn invalid(&self, reason: impl Into<String>) -> MallardError {
        MallardError::InvalidArguments {
            module: self.module.clone(),
            method: self.method.clone(),
            reason: reason.into(),
        }
    }

    /// `MethodFailed` for this call.
    pub fn failed(&self, reason: impl Into<String>) -> MallardError {
        MallardError::MethodFailed {
            module: self.module.clone(),
            method: self.method.clone(),
            reason: reason.into(),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
