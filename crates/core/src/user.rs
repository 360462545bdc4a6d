//! Cached admin user record.
//!
//! The session stores the logged-in user as a JSON string next to the
//! token. A record that fails to parse or lacks its identity fields is
//! treated as "not logged in" by callers.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{record_serde, EntityId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct AdminUser {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

record_serde!(AdminUser);

/// Parse and validate a stored user record.
pub fn parse_stored_user(raw: &str) -> Result<AdminUser, CoreError> {
    let user: AdminUser = serde_json::from_str(raw)
        .map_err(|e| CoreError::Unauthorized(format!("Stored user record is malformed: {e}")))?;

    if user.id.trim().is_empty() || user.username.trim().is_empty() {
        return Err(CoreError::Unauthorized(
            "Stored user record is missing id or username".to_string(),
        ));
    }
    Ok(user)
}
