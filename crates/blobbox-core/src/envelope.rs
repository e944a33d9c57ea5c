//! Result and envelope wire types

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failed,
}

/// What an operation handler returns: `{ "result": ..., "value"?: ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub result: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl OperationResult {
    pub fn success() -> Self {
        Self {
            result: Outcome::Success,
            value: None,
        }
    }

    pub fn success_with(value: Value) -> Self {
        Self {
            result: Outcome::Success,
            value: Some(value),
        }
    }

    pub fn failed(reason: &str) -> Self {
        Self {
            result: Outcome::Failed,
            value: Some(Value::String(reason.to_string())),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == Outcome::Success
    }
}

/// Uniform wrapper around every dispatched result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: bool,
    pub data: OperationResult,
}

impl Envelope {
    pub fn new(data: OperationResult) -> Self {
        Self { status: true, data }
    }
}
