//! Runtime boundary types
//!
//! The analyzer never executes actions itself; an external runner does. These
//! serde types pin down the request/result envelope the runner exchanges so
//! that `invocation_plan` values stay an honored contract.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::ResultKind;

/// A request to invoke one resolved action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub action_id: String,
    pub module_import_path: String,
    pub qualname: String,
    /// Attribute path inside the module (`qualname` minus the module part),
    /// when it differs from `qualname`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr_path: Option<String>,
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_overrides: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sys_path: Option<Vec<String>>,
}

/// The envelope the runner writes back after an invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub ok: bool,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub result_kind: ResultKind,
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub stdout_truncated: bool,
    #[serde(default)]
    pub stderr_truncated: bool,
}
