//! In-process realtime hub backed by a `tokio::sync::broadcast` channel.
//!
//! [`RealtimeHub`] fans out every [`TableEvent`] received from the
//! realtime channel to any number of page controllers. It is designed to
//! be shared via `Arc<RealtimeHub>`.

use chrono::{DateTime, Utc};
use dataco_core::realtime::RawChange;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// TableEvent
// ---------------------------------------------------------------------------

/// Tables the dashboard subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Tasks,
    Subtasks,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Tasks => "tasks",
            Table::Subtasks => "subtasks",
        }
    }
}

/// One change notification for one table.
///
/// The change itself stays raw; it is validated into a typed
/// [`RealtimeEvent`](dataco_core::realtime::RealtimeEvent) by the consumer,
/// which knows the record type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableEvent {
    pub table: Table,
    #[serde(flatten)]
    pub change: RawChange,
    /// When this process received the notification (UTC).
    #[serde(default = "Utc::now", skip_serializing)]
    pub received_at: DateTime<Utc>,
}

impl TableEvent {
    pub fn new(table: Table, change: RawChange) -> Self {
        Self {
            table,
            change,
            received_at: Utc::now(),
        }
    }
}

/// Parse one realtime text frame.
///
/// Frames look like `{"table": "subtasks", "eventType": "UPDATE",
/// "new": {...}, "old": {...}}`. Unknown tables are an error; callers
/// should log and continue.
pub fn parse_frame(text: &str) -> Result<TableEvent, serde_json::Error> {
    serde_json::from_str(text)
}

// ---------------------------------------------------------------------------
// RealtimeHub
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out of realtime table events.
///
/// Slow receivers that fall more than the capacity behind observe
/// `RecvError::Lagged`; the page controller treats that as a cue to do a
/// forced refresh.
pub struct RealtimeHub {
    sender: broadcast::Sender<TableEvent>,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped silently when nobody
    /// is listening.
    pub fn publish(&self, event: TableEvent) {
        // Ignore the SendError: it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TableEvent> {
        self.sender.subscribe()
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
