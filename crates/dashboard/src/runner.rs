//! Drives a [`TaskPageController`] from its triggers.
//!
//! One task per open page: a forced load on mount, then realtime events,
//! poll ticks and manual refresh requests until cancelled.

use std::sync::Arc;
use std::time::Duration;

use dataco_client::DashboardApi;
use dataco_core::realtime::RealtimeEvent;
use dataco_events::{poll_interval, Table, TableEvent};
use tokio::sync::{broadcast, mpsc};
use tokio::time::Interval;
use tokio_util::sync::CancellationToken;

use crate::controller::{RealtimeOutcome, TaskPageController};

/// Sources that can refresh a page. Any of them may be absent.
#[derive(Default)]
pub struct Triggers {
    pub realtime: Option<broadcast::Receiver<TableEvent>>,
    pub poll_period: Option<Duration>,
    /// Each message is a refresh-button press.
    pub manual: Option<mpsc::Receiver<()>>,
}

pub async fn run_page<A: DashboardApi>(
    controller: Arc<TaskPageController<A>>,
    triggers: Triggers,
    cancel: CancellationToken,
) {
    let Triggers {
        mut realtime,
        poll_period,
        mut manual,
    } = triggers;
    let mut poll = poll_period.map(poll_interval);

    tracing::info!(
        task_id = controller.task_id(),
        realtime = realtime.is_some(),
        poll_secs = poll_period.map(|p| p.as_secs()),
        "Task page started",
    );
    controller.force_refresh().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(task_id = controller.task_id(), "Task page stopped");
                return;
            }
            received = recv_realtime(&mut realtime) => match received {
                Ok(event) => {
                    handle_table_event(&controller, event);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Realtime receiver lagged, reloading page");
                    controller.force_refresh().await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::warn!("Realtime hub closed, continuing without realtime");
                    realtime = None;
                }
            },
            _ = tick(&mut poll) => {
                controller.safe_refresh().await;
            }
            request = recv_manual(&mut manual) => match request {
                Some(()) => {
                    controller.force_refresh().await;
                }
                None => manual = None,
            },
        }
    }
}

/// Route one raw table event through the controller's guard and reducer.
pub fn handle_table_event<A: DashboardApi>(
    controller: &TaskPageController<A>,
    event: TableEvent,
) -> RealtimeOutcome {
    let table = event.table;
    let outcome = match table {
        Table::Subtasks => match RealtimeEvent::from_raw(event.change) {
            Ok(event) => controller.handle_subtask_event(event),
            Err(e) => {
                tracing::warn!(table = table.as_str(), error = %e, "Rejected realtime event");
                RealtimeOutcome::Ignored
            }
        },
        Table::Tasks => match RealtimeEvent::from_raw(event.change) {
            Ok(event) => controller.handle_task_event(event),
            Err(e) => {
                tracing::warn!(table = table.as_str(), error = %e, "Rejected realtime event");
                RealtimeOutcome::Ignored
            }
        },
    };

    tracing::debug!(table = table.as_str(), ?outcome, "Realtime event handled");
    outcome
}

async fn recv_realtime(
    rx: &mut Option<broadcast::Receiver<TableEvent>>,
) -> Result<TableEvent, broadcast::error::RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn recv_manual(rx: &mut Option<mpsc::Receiver<()>>) -> Option<()> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
