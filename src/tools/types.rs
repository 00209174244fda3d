// src/tools/types.rs
// The envelope every dispatchable operation returns, and the function-call
// shape the conversational driver extracts from model output.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Uniform result shape crossing the function-call boundary. Fields absent
/// from the serialized form when unset; never nested further.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Vec<Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Envelope {
    pub fn success(table: Table, message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            column_names: Some(table.columns),
            data: Some(table.rows),
            message: Some(message.into()),
            metadata: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            column_names: None,
            data: None,
            message: Some(message.into()),
            metadata: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }
}

/// A structured function call proposed by the language model inside a
/// `<function_call>` block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default = "empty_params")]
    pub parameters: Value,
}

fn empty_params() -> Value {
    Value::Object(serde_json::Map::new())
}
