//! Scan lifecycle states: pending -> running -> completed.

use super::domain::Scan;
use crate::builder::{AutoLock, FsmBuilder};
use crate::core::{Event, HookError, Rejection, State, Transition, TriggerContext};
use crate::engine::{Fsm, FsmError, LockRetryConfig};
use crate::storage::LockableStorage;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const STATE_PENDING: &str = "pending";
pub const STATE_RUNNING: &str = "running";
pub const STATE_COMPLETED: &str = "completed";

pub const EVENT_START_SCAN: &str = "start_scan";
pub const EVENT_ALL_JOBS_COMPLETED: &str = "all_jobs_completed";

/// A scan shared between the caller and its states.
pub type SharedScan = Arc<Mutex<Scan>>;

/// Lock policy for scan engines.
pub fn scan_lock_retry() -> LockRetryConfig {
    LockRetryConfig::new(5, Duration::from_millis(200))
}

fn set_status(scan: &SharedScan, status: &str) -> Result<(), HookError> {
    scan.lock().status = status.to_string();
    Ok(())
}

pub struct PendingState {
    scan: SharedScan,
}

impl PendingState {
    pub fn new(scan: SharedScan) -> Self {
        Self { scan }
    }
}

impl State for PendingState {
    fn name(&self) -> &str {
        STATE_PENDING
    }

    fn on_enter(&self, _ctx: TriggerContext<'_>, _event: &Event) -> Result<(), HookError> {
        set_status(&self.scan, STATE_PENDING)
    }

    fn handle_event(&self, _ctx: TriggerContext<'_>, event: &Event) -> Result<Transition, Rejection> {
        match event.name() {
            EVENT_START_SCAN => Ok(Transition::to(STATE_RUNNING)),
            _ => Err(Rejection::unexpected(STATE_PENDING, event)),
        }
    }
}

pub struct RunningState {
    scan: SharedScan,
}

impl RunningState {
    pub fn new(scan: SharedScan) -> Self {
        Self { scan }
    }
}

impl State for RunningState {
    fn name(&self) -> &str {
        STATE_RUNNING
    }

    fn on_enter(&self, _ctx: TriggerContext<'_>, _event: &Event) -> Result<(), HookError> {
        set_status(&self.scan, STATE_RUNNING)
    }

    fn handle_event(&self, _ctx: TriggerContext<'_>, event: &Event) -> Result<Transition, Rejection> {
        match event.name() {
            EVENT_ALL_JOBS_COMPLETED => Ok(Transition::to(STATE_COMPLETED)),
            _ => Err(Rejection::unexpected(STATE_RUNNING, event)),
        }
    }
}

/// Terminal state.
pub struct CompletedState {
    scan: SharedScan,
}

impl CompletedState {
    pub fn new(scan: SharedScan) -> Self {
        Self { scan }
    }
}

impl State for CompletedState {
    fn name(&self) -> &str {
        STATE_COMPLETED
    }

    fn on_enter(&self, _ctx: TriggerContext<'_>, _event: &Event) -> Result<(), HookError> {
        set_status(&self.scan, STATE_COMPLETED)
    }

    fn handle_event(&self, _ctx: TriggerContext<'_>, _event: &Event) -> Result<Transition, Rejection> {
        Err(Rejection::new("completed: no transitions allowed"))
    }
}

/// Build an engine for one scan, serialized through `storage`'s entity lock.
pub fn scan_fsm(scan: SharedScan, storage: Arc<dyn LockableStorage>) -> Result<Fsm, FsmError> {
    let auto_lock = AutoLock::new(storage, scan_lock_retry()).on_failure(|entity_id, event| {
        warn!(entity_id = %entity_id, event = %event.name(), "lock failure");
    });

    FsmBuilder::new()
        .state(PendingState::new(Arc::clone(&scan)))
        .state(RunningState::new(Arc::clone(&scan)))
        .state(CompletedState::new(scan))
        .auto_lock(auto_lock)
        .build()
}
