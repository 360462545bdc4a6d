//! Realtime and polling triggers for the dashboard.
//!
//! - [`RealtimeHub`]: in-process publish/subscribe of table change events,
//!   backed by `tokio::sync::broadcast`.
//! - [`RealtimeSubscription`]: WebSocket client for the change feed with
//!   exponential-backoff reconnection.
//! - [`poll_interval`]: ticker for periodic background refreshes.

pub mod hub;
pub mod poll;
pub mod reconnect;
pub mod subscription;

pub use hub::{RealtimeHub, Table, TableEvent};
pub use poll::poll_interval;
pub use reconnect::ReconnectConfig;
pub use subscription::{RealtimeError, RealtimeSubscription};
