//! Command orchestrators for business logic
//!
//! This module provides orchestrators that coordinate between the CLI layer
//! and the core library services.

pub mod report;
pub mod sync_orchestrator;

pub use report::{EventLog, completed_bytes, summarize};
pub use sync_orchestrator::{
    RunOutcome, SyncError, SyncOrchestrator, SyncReport, SyncRequest, SyncSession,
};
