//! Background sync worker
//!
//! Runs one invocation on the blocking pool and publishes progress lines over
//! a channel, so an interactive caller can drain them on its own schedule.
//! Only one invocation per device should be in flight; the worker does not
//! enforce this.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::engine::{run_sync, SyncReport};
use super::executor::LogLine;
use crate::error::{QuadernoError, Result};
use crate::remote::RemoteStore;
use crate::types::SyncConfig;

/// Event published by a running worker
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A progress line, in emission order
    Line(LogLine),
    /// Always the last event
    Finished(SyncOutcome),
}

/// Timing and status of a finished invocation
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub simulated: bool,
    /// No fatal error and no failed operation
    pub success: bool,
    pub error: Option<String>,
}

/// Handle on a sync running in the background
pub struct SyncWorker {
    handle: JoinHandle<Result<SyncReport>>,
}

impl SyncWorker {
    /// Start a sync. Must be called from within a tokio runtime.
    ///
    /// The channel is unbounded so the sync never stalls on a slow consumer.
    pub fn spawn(
        config: SyncConfig,
        store: Arc<dyn RemoteStore>,
    ) -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();

        let handle = tokio::task::spawn_blocking(move || {
            let started_at = Utc::now();

            let result = run_sync(&config, store.as_ref(), |line| {
                // A dropped receiver only means nobody is watching
                let _ = sender.send(SyncEvent::Line(line.clone()));
            });

            let outcome = SyncOutcome {
                started_at,
                completed_at: Utc::now(),
                simulated: config.simulate,
                success: matches!(&result, Ok(report) if report.log.is_success()),
                error: result.as_ref().err().map(|e| e.to_string()),
            };
            match &result {
                Ok(report) => tracing::info!(
                    "Sync finished: {} applied, {} failed in {:?}",
                    report.log.applied,
                    report.log.failed,
                    outcome.completed_at - outcome.started_at
                ),
                Err(e) => tracing::error!("Sync failed: {}", e),
            }
            let _ = sender.send(SyncEvent::Finished(outcome));

            result
        });

        (Self { handle }, receiver)
    }

    /// Wait for the sync to finish
    pub async fn wait(self) -> Result<SyncReport> {
        self.handle
            .await
            .map_err(|e| QuadernoError::Sync(format!("sync task failed: {}", e)))?
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
