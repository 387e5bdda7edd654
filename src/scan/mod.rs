//! A scan lifecycle built on the engine.
//!
//! A scan starts `pending`, moves to `running` on `start_scan` and to
//! `completed` on `all_jobs_completed`. State behavior keeps the in-memory
//! [`Scan`] record's status in step with the persisted state.

mod domain;
mod scheduler;
mod states;

pub use domain::{Scan, ScanError, ScanJob, ScanPayload};
pub use scheduler::{Admission, ScanScheduler};
pub use states::{
    scan_fsm, scan_lock_retry, CompletedState, PendingState, RunningState, SharedScan,
    EVENT_ALL_JOBS_COMPLETED, EVENT_START_SCAN, STATE_COMPLETED, STATE_PENDING, STATE_RUNNING,
};
