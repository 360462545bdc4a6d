use std::path::PathBuf;
use std::time::Duration;

use dataco_client::{AdminApi, AuthContext, SessionStore};

use crate::error::DashboardError;
use crate::variant::PageVariant;

/// Dashboard configuration loaded from environment variables.
///
/// Defaults target a local API on port 3000.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// API origin without the `/api` suffix.
    pub api_base_url: String,
    /// JSON file holding the persisted session (token and user).
    pub session_path: PathBuf,
    /// Realtime change feed. `None` disables realtime updates.
    pub realtime_ws_url: Option<String>,
    /// Background refresh period. `None` when set to `0`.
    pub poll_interval: Option<Duration>,
    pub request_timeout: Duration,
    pub variant: PageVariant,
}

impl DashboardConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                  |
    /// |------------------------|--------------------------|
    /// | `API_BASE_URL`         | `http://localhost:3000`  |
    /// | `SESSION_PATH`         | `.dataco/session.json`   |
    /// | `REALTIME_WS_URL`      | unset (no realtime)      |
    /// | `POLL_INTERVAL_SECS`   | `30` (`0` disables)      |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                     |
    /// | `PAGE_VARIANT`         | `realtime`               |
    pub fn from_env() -> Result<Self, DashboardError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DashboardError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_base_url = var("API_BASE_URL").unwrap_or_else(|| "http://localhost:3000".into());
        let session_path = var("SESSION_PATH")
            .unwrap_or_else(|| ".dataco/session.json".into())
            .into();
        let realtime_ws_url = var("REALTIME_WS_URL");

        let poll_secs = parse_secs("POLL_INTERVAL_SECS", var("POLL_INTERVAL_SECS"), 30)?;
        let timeout_secs = parse_secs("REQUEST_TIMEOUT_SECS", var("REQUEST_TIMEOUT_SECS"), 30)?;

        let variant = match var("PAGE_VARIANT") {
            Some(raw) => raw.parse().map_err(DashboardError::Config)?,
            None => PageVariant::default(),
        };

        Ok(Self {
            api_base_url,
            session_path,
            realtime_ws_url,
            poll_interval: (poll_secs > 0).then(|| Duration::from_secs(poll_secs)),
            request_timeout: Duration::from_secs(timeout_secs),
            variant,
        })
    }
}

impl DashboardConfig {
    /// Build an API client from the stored session.
    pub fn connect(&self, store: &SessionStore) -> Result<AdminApi, DashboardError> {
        let auth = AuthContext::load(store);
        if !auth.is_authenticated() {
            return Err(DashboardError::NotLoggedIn);
        }
        Ok(AdminApi::with_timeout(&self.api_base_url, auth, self.request_timeout)?)
    }
}

fn parse_secs(key: &str, raw: Option<String>, default: u64) -> Result<u64, DashboardError> {
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|_| DashboardError::Config(format!("{key} must be a whole number of seconds, got '{raw}'"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<DashboardConfig, DashboardError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DashboardConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:3000");
        assert_eq!(config.session_path, PathBuf::from(".dataco/session.json"));
        assert_eq!(config.realtime_ws_url, None);
        assert_eq!(config.poll_interval, Some(Duration::from_secs(30)));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.variant, PageVariant::realtime());
    }

    #[test]
    fn zero_poll_interval_disables_polling() {
        let config = load(&[("POLL_INTERVAL_SECS", "0"), ("PAGE_VARIANT", "classic")]).unwrap();
        assert_eq!(config.poll_interval, None);
        assert_eq!(config.variant, PageVariant::classic());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[("REALTIME_WS_URL", "  "), ("API_BASE_URL", "")]).unwrap();
        assert_eq!(config.realtime_ws_url, None);
        assert_eq!(config.api_base_url, "http://localhost:3000");
    }

    #[test]
    fn connect_needs_a_stored_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let config = load(&[("API_BASE_URL", "http://api.test:3000")]).unwrap();

        assert_matches!(config.connect(&store), Err(DashboardError::NotLoggedIn));

        store.set(dataco_client::session::TOKEN_KEY, "tok").unwrap();
        let api = config.connect(&store).unwrap();
        assert_eq!(api.base_url(), "http://api.test:3000");
        assert!(api.auth().is_authenticated());
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert_matches!(load(&[("REQUEST_TIMEOUT_SECS", "soon")]), Err(DashboardError::Config(_)));
        assert_matches!(load(&[("PAGE_VARIANT", "v7")]), Err(DashboardError::Config(_)));
    }
}
