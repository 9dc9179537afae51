//! Plan executor
//!
//! Applies a plan one operation at a time. A failing operation is logged and
//! skipped; nothing is retried or rolled back.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::QuadernoError;
use crate::remote::{join_remote, RemoteStore};
use crate::types::{SyncOperation, SyncPlan};

/// Severity of a progress line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

/// One human-readable progress line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub level: LogLevel,
    pub message: String,
}

impl LogLine {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Execution switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Log operations instead of calling the device
    pub dry_run: bool,
    /// After a file delete, check that the file is really gone
    pub verify_deletes: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            verify_deletes: true,
        }
    }
}

/// Outcome of executing a plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLog {
    /// Every line emitted, summary last
    pub lines: Vec<LogLine>,
    pub applied: usize,
    pub failed: usize,
    pub warnings: usize,
    pub simulated: bool,
}

impl ExecutionLog {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    fn push(&mut self, line: LogLine, on_line: &mut impl FnMut(&LogLine)) {
        trace_line(&line);
        on_line(&line);
        self.lines.push(line);
    }
}

/// Mirror a progress line into tracing at the matching level
pub(crate) fn trace_line(line: &LogLine) {
    match line.level {
        LogLevel::Info => tracing::info!("{}", line.message),
        LogLevel::Warning => tracing::warn!("{}", line.message),
        LogLevel::Error => tracing::error!("{}", line.message),
    }
}

/// Execute a plan with default options apart from `dry_run`
pub fn execute(
    plan: &SyncPlan,
    store: &dyn RemoteStore,
    remote_root: &str,
    dry_run: bool,
) -> ExecutionLog {
    let options = ExecuteOptions {
        dry_run,
        ..Default::default()
    };
    execute_with(plan, store, remote_root, options, |_| {})
}

/// Execute a plan, reporting each line to `on_line` as it is produced
pub fn execute_with(
    plan: &SyncPlan,
    store: &dyn RemoteStore,
    remote_root: &str,
    options: ExecuteOptions,
    mut on_line: impl FnMut(&LogLine),
) -> ExecutionLog {
    let mut log = ExecutionLog {
        simulated: options.dry_run,
        ..Default::default()
    };

    for op in plan {
        let full_path = join_remote(remote_root, op.path());

        if options.dry_run {
            log.push(LogLine::info(simulated_message(op, &full_path)), &mut on_line);
            continue;
        }

        match apply(op, store, &full_path) {
            Ok(()) => {
                log.applied += 1;
                log.push(LogLine::info(applied_message(op, &full_path)), &mut on_line);

                if options.verify_deletes && matches!(op, SyncOperation::DeleteFile { .. }) {
                    if let Some(warning) = verify_deleted(store, &full_path) {
                        log.warnings += 1;
                        log.push(warning, &mut on_line);
                    }
                }
            }
            Err(e) => {
                log.failed += 1;
                let failure = QuadernoError::OperationFailed {
                    operation: format!("{} ({})", operation_label(op), full_path),
                    message: e.to_string(),
                };
                log.push(LogLine::error(failure.to_string()), &mut on_line);
            }
        }
    }

    let summary = if options.dry_run {
        format!(
            "Zotero sync simulation complete: {} operation(s) planned.",
            plan.len()
        )
    } else {
        format!(
            "Zotero sync complete: {} applied, {} failed.",
            log.applied, log.failed
        )
    };
    log.push(LogLine::info(summary), &mut on_line);

    log
}

fn apply(op: &SyncOperation, store: &dyn RemoteStore, full_path: &str) -> crate::Result<()> {
    match op {
        SyncOperation::CreateFolder { .. } => store.create_folder(full_path),
        SyncOperation::DeleteFolder { .. } => store.delete_folder(full_path),
        SyncOperation::DeleteFile { .. } => store.delete_document(full_path),
        SyncOperation::UploadFile { source, .. } => store.upload_file(source, full_path),
    }
}

fn verify_deleted(store: &dyn RemoteStore, full_path: &str) -> Option<LogLine> {
    match store.path_exists(full_path) {
        Ok(true) => Some(LogLine::warning(format!(
            "Warning: File still exists after deletion attempt: {}",
            full_path
        ))),
        Ok(false) => None,
        Err(e) => {
            tracing::debug!("Could not verify deletion of {}: {}", full_path, e);
            None
        }
    }
}

fn operation_label(op: &SyncOperation) -> &'static str {
    match op {
        SyncOperation::CreateFolder { .. } => "Folder creation",
        SyncOperation::DeleteFolder { .. } => "Folder deletion",
        SyncOperation::DeleteFile { .. } => "File deletion",
        SyncOperation::UploadFile { .. } => "File upload",
    }
}

fn simulated_message(op: &SyncOperation, full_path: &str) -> String {
    let action = match op {
        SyncOperation::CreateFolder { .. } => "create folder",
        SyncOperation::DeleteFolder { .. } => "delete folder",
        SyncOperation::DeleteFile { .. } => "delete file",
        SyncOperation::UploadFile { .. } => "upload file",
    };
    format!("Simulate: Would {}: {}", action, full_path)
}

fn applied_message(op: &SyncOperation, full_path: &str) -> String {
    match op {
        SyncOperation::CreateFolder { .. } => format!("Created folder: {}", full_path),
        SyncOperation::DeleteFolder { .. } => format!("Deleted folder: {}", full_path),
        SyncOperation::DeleteFile { .. } => format!("Deleted file: {}", full_path),
        SyncOperation::UploadFile { .. } => format!("Uploaded: {}", full_path),
    }
}
