//! One full sync invocation
//!
//! Snapshots both sides, plans, and executes, reporting progress lines in
//! order. Fatal errors emit one explanatory line and abort before any device
//! mutation.

use serde::{Deserialize, Serialize};

use super::executor::{execute_with, trace_line, ExecuteOptions, ExecutionLog, LogLine};
use super::planner::plan;
use crate::catalog::{read_local_snapshot, CatalogPaths};
use crate::error::Result;
use crate::remote::{read_remote_snapshot, RemoteStore};
use crate::types::{LocalSnapshot, RemoteSnapshot, SyncConfig, SyncPlan};

/// Result of a completed invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub plan: SyncPlan,
    pub log: ExecutionLog,
}

/// Resolve catalog paths from the configuration
pub fn catalog_paths(config: &SyncConfig) -> Result<CatalogPaths> {
    CatalogPaths::resolve(config.storage_root.as_deref(), config.catalog_path.as_deref())
}

/// Build both snapshots. Nothing on the device is touched.
pub fn snapshots(
    config: &SyncConfig,
    store: &dyn RemoteStore,
) -> Result<(LocalSnapshot, RemoteSnapshot)> {
    let paths = catalog_paths(config)?;
    let local = read_local_snapshot(&paths)?;
    let remote = read_remote_snapshot(store, &config.remote_root)?;
    Ok((local, remote))
}

/// Compute the plan for the current state of both sides
pub fn plan_sync(config: &SyncConfig, store: &dyn RemoteStore) -> Result<SyncPlan> {
    let (local, remote) = snapshots(config, store)?;
    Ok(plan(&local, &remote))
}

/// Run a full sync, streaming progress lines to `on_line`
pub fn run_sync(
    config: &SyncConfig,
    store: &dyn RemoteStore,
    mut on_line: impl FnMut(&LogLine),
) -> Result<SyncReport> {
    let mut emit = |line: LogLine| {
        trace_line(&line);
        on_line(&line);
    };

    emit(LogLine::info(format!(
        "Starting Zotero sync...{}",
        if config.simulate { " (Simulation)" } else { "" }
    )));

    let (local, remote) = match snapshots(config, store) {
        Ok(snapshots) => snapshots,
        Err(e) => {
            emit(LogLine::error(format!("Sync aborted: {}", e)));
            return Err(e);
        }
    };

    let plan = plan(&local, &remote);
    emit(LogLine::info(format!(
        "Planned {} operation(s): {}",
        plan.len(),
        plan.summary()
    )));

    let options = ExecuteOptions {
        dry_run: config.simulate,
        verify_deletes: config.verify_deletes,
    };
    let log = execute_with(&plan, store, &config.remote_root, options, on_line);

    Ok(SyncReport { plan, log })
}
