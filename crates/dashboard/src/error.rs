use dataco_client::session::SessionError;
use dataco_client::ApiError;

/// Errors from wiring up the dashboard (configuration, session, client).
///
/// Page operations never return these; they report through
/// [`FetchOutcome`](crate::controller::FetchOutcome) and
/// [`MutationOutcome`](crate::controller::MutationOutcome) instead.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Not logged in. Run `dataco-admin session login --token <TOKEN>` first")]
    NotLoggedIn,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Api(#[from] ApiError),
}
