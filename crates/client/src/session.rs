//! Persisted session and the authentication context built from it.
//!
//! [`SessionStore`] is a small string key/value file, the desktop
//! counterpart of the browser's local storage. The token lives under
//! [`TOKEN_KEY`] and the cached user record (a JSON string) under
//! [`USER_KEY`]. [`AuthContext`] is loaded once and handed to the API
//! client so no call site reads the store directly.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use dataco_core::user::{parse_stored_user, AdminUser};

use crate::error::ApiError;

pub const TOKEN_KEY: &str = "adminToken";
pub const USER_KEY: &str = "adminUser";

/// Errors reading or writing the session file.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// String key/value store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a single value. Missing file or key yields `None`.
    pub fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    pub fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }

    /// Store a token and user after a successful login.
    pub fn save_login(&self, token: &str, user: &AdminUser) -> Result<(), SessionError> {
        let mut entries = self.read_all()?;
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        entries.insert(USER_KEY.to_string(), serde_json::to_string(user)?);
        self.write_all(&entries)
    }

    /// Drop the token and user record.
    pub fn logout(&self) -> Result<(), SessionError> {
        let mut entries = self.read_all()?;
        entries.remove(TOKEN_KEY);
        entries.remove(USER_KEY);
        self.write_all(&entries)
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

/// Authentication state injected into the API client.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    token: Option<String>,
    user: Option<AdminUser>,
}

impl AuthContext {
    /// A context with no credentials. Every request fails with
    /// [`ApiError::Unauthenticated`].
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user: None,
        }
    }

    /// Build the context from the session store.
    ///
    /// A missing or blank token, an unreadable store, or a stored user
    /// record that fails validation all yield an anonymous context.
    pub fn load(store: &SessionStore) -> Self {
        let token = match store.get(TOKEN_KEY) {
            Ok(Some(token)) if !token.trim().is_empty() => token,
            Ok(_) => {
                tracing::debug!(path = %store.path().display(), "No admin token in session");
                return Self::anonymous();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session store");
                return Self::anonymous();
            }
        };

        let user = match store.get(USER_KEY) {
            Ok(Some(raw)) => match parse_stored_user(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding session with invalid user record");
                    return Self::anonymous();
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session store");
                return Self::anonymous();
            }
        };

        Self {
            token: Some(token),
            user,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn user(&self) -> Option<&AdminUser> {
        self.user.as_ref()
    }

    /// The bearer token, or [`ApiError::Unauthenticated`].
    pub fn bearer(&self) -> Result<&str, ApiError> {
        self.token
            .as_deref()
            .ok_or_else(|| ApiError::Unauthenticated("no admin token in session".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("nested").join("session.json"))
    }

    fn user() -> AdminUser {
        AdminUser {
            id: "u1".into(),
            username: "noa".into(),
            role: Some("admin".into()),
        }
    }

    #[test]
    fn missing_file_is_anonymous() {
        let dir = TempDir::new().unwrap();
        let ctx = AuthContext::load(&store_in(&dir));
        assert!(!ctx.is_authenticated());
        assert!(ctx.bearer().unwrap_err().is_unauthenticated());
    }

    #[test]
    fn saved_login_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save_login("tok-1", &user()).unwrap();

        let ctx = AuthContext::load(&store);
        assert_eq!(ctx.bearer().unwrap(), "tok-1");
        assert_eq!(ctx.user().map(|u| u.username.as_str()), Some("noa"));
    }

    #[test]
    fn malformed_user_record_means_logged_out() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set(TOKEN_KEY, "tok-1").unwrap();
        store.set(USER_KEY, "{\"username\": 5").unwrap();

        assert!(!AuthContext::load(&store).is_authenticated());
    }

    #[test]
    fn token_without_user_is_accepted() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set(TOKEN_KEY, "tok-2").unwrap();

        let ctx = AuthContext::load(&store);
        assert!(ctx.is_authenticated());
        assert!(ctx.user().is_none());
    }

    #[test]
    fn logout_clears_credentials_only() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save_login("tok-1", &user()).unwrap();
        store.set("theme", "dark").unwrap();
        store.logout().unwrap();

        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }
}
