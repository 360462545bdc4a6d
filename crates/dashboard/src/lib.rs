//! Task-page core of the DATACO admin dashboard.
//!
//! - [`TaskPageController`]: page state, fetch gate, realtime handling and
//!   mutations for one task.
//! - [`PageVariant`]: the behaviours that differ between page flavours.
//! - [`run_page`]: drives a controller from realtime, polling and manual
//!   refresh triggers.
//! - [`DashboardConfig`]: environment-driven configuration.

pub mod config;
pub mod controller;
pub mod error;
pub mod notice;
pub mod runner;
pub mod state;
pub mod variant;

pub use config::DashboardConfig;
pub use controller::{
    create_task, submit_bug_report, FetchOutcome, MutationOutcome, RealtimeOutcome, TaskPageController,
};
pub use error::DashboardError;
pub use notice::{LogNotifier, Notice, NoticeLevel, Notifier};
pub use runner::{run_page, Triggers};
pub use state::PageState;
pub use variant::{NoticeStyle, PageVariant};
