//! Driving scans through their lifecycle.

use super::domain::{Scan, ScanError, ScanPayload};
use super::states::{
    scan_fsm, SharedScan, EVENT_ALL_JOBS_COMPLETED, EVENT_START_SCAN, STATE_COMPLETED,
    STATE_PENDING, STATE_RUNNING,
};
use crate::core::Event;
use crate::storage::LockableStorage;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Result of offering a scan to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The scan moved to `running`.
    Started,
    /// The scan was already running or completed.
    Skipped { state: String },
}

/// Starts scans and completes them once their jobs are done.
///
/// Every operation builds a fresh engine around the scan, so any number of
/// schedulers may share one lockable storage.
#[derive(Clone)]
pub struct ScanScheduler {
    storage: Arc<dyn LockableStorage>,
}

impl ScanScheduler {
    pub fn new(storage: Arc<dyn LockableStorage>) -> Self {
        Self { storage }
    }

    /// Record an unknown scan as pending, then start it.
    ///
    /// Redelivered scans that are already running or completed are skipped.
    pub fn admit(&self, payload: ScanPayload) -> Result<(SharedScan, Admission), ScanError> {
        let id = payload.id.clone();
        let scan: SharedScan = Arc::new(Mutex::new(Scan::from(payload)));
        let fsm = scan_fsm(Arc::clone(&scan), Arc::clone(&self.storage))?;

        match fsm.current_state(&id) {
            Ok(state) if state == STATE_RUNNING || state == STATE_COMPLETED => {
                info!(scan_id = %id, state = %state, "skipping scan already in progress");
                return Ok((scan, Admission::Skipped { state }));
            }
            Ok(_) => {}
            Err(_) => {
                info!(scan_id = %id, "initializing scan state");
                self.storage.set_state(&id, STATE_PENDING)?;
            }
        }

        fsm.trigger(&id, &Event::named(EVENT_START_SCAN))?;
        Ok((scan, Admission::Started))
    }

    /// Mark every job completed and move the scan to `completed`.
    pub fn finish(&self, scan: &SharedScan) -> Result<(), ScanError> {
        let id = {
            let mut scan = scan.lock();
            scan.complete_jobs();
            scan.id.clone()
        };

        info!(scan_id = %id, "triggering all_jobs_completed");
        let fsm = scan_fsm(Arc::clone(scan), Arc::clone(&self.storage))?;
        fsm.trigger(&id, &Event::named(EVENT_ALL_JOBS_COMPLETED))?;
        Ok(())
    }
}
