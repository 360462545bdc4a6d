//! Response envelope handling.
//!
//! The upstream API is inconsistent: reads answer either
//! `{"data": {"task": ...}}` or a bare `{"task": ...}`, and mutations
//! answer `{"success": bool, "error"?: string}`. Both quirks are handled
//! here once instead of at every call site.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ApiError;

/// Take `data.<key>` if present, else `<key>`, and deserialize it.
pub fn extract<T: DeserializeOwned>(mut body: serde_json::Value, key: &str) -> Result<T, ApiError> {
    let nested = body
        .get_mut("data")
        .and_then(|data| data.get_mut(key))
        .map(serde_json::Value::take);

    let value = match nested {
        Some(v) => v,
        None => body
            .get_mut(key)
            .map(serde_json::Value::take)
            .ok_or_else(|| ApiError::Decode(format!("response has neither data.{key} nor {key}")))?,
    };

    serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("invalid {key}: {e}")))
}

/// Body returned by create/update/delete endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl MutationResponse {
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Rejected {
                message: self.error.or(self.message),
            })
        }
    }
}
