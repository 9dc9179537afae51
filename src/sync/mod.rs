//! Reconciliation engine
//!
//! Plans and applies the create/delete/upload operations that bring the
//! device tree in line with the local library.

mod engine;
mod executor;
mod planner;
mod worker;

pub use engine::{catalog_paths, plan_sync, run_sync, snapshots, SyncReport};
pub use executor::{execute, execute_with, ExecuteOptions, ExecutionLog, LogLevel, LogLine};
pub use planner::plan;
pub use worker::{SyncEvent, SyncOutcome, SyncWorker};
