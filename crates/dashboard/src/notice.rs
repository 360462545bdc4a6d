//! User-facing notices (alerts / toasts).

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::variant::NoticeStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub style: NoticeStyle,
    pub level: NoticeLevel,
    pub message: String,
}

/// Where notices go. Implementations must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => {
                tracing::error!(style = ?notice.style, "{}", notice.message)
            }
            NoticeLevel::Success | NoticeLevel::Info => {
                tracing::info!(style = ?notice.style, "{}", notice.message)
            }
        }
    }
}

/// Forwards notices to a channel, for front ends that render them.
impl Notifier for UnboundedSender<Notice> {
    fn notify(&self, notice: Notice) {
        // A closed receiver just means nobody is rendering any more.
        let _ = self.send(notice);
    }
}
