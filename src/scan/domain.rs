//! Scan records and their wire payload.

use super::states::{EVENT_START_SCAN, STATE_COMPLETED, STATE_PENDING};
use crate::core::Event;
use crate::engine::FsmError;
use crate::storage::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("job count must be positive")]
    InvalidJobCount,

    #[error("invalid scan payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] FsmError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One unit of work within a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanJob {
    pub id: String,
    pub state: String,
    pub scan_id: String,
}

/// A scan as published by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanPayload {
    pub id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub jobs: Vec<ScanJob>,
}

impl ScanPayload {
    /// A fresh pending scan with `job_count` pending jobs and random ids.
    pub fn new(job_count: usize) -> Result<Self, ScanError> {
        if job_count == 0 {
            return Err(ScanError::InvalidJobCount);
        }

        let id = Uuid::new_v4().to_string();
        let jobs = (0..job_count)
            .map(|_| ScanJob {
                id: Uuid::new_v4().to_string(),
                state: STATE_PENDING.to_string(),
                scan_id: id.clone(),
            })
            .collect();

        Ok(Self {
            id,
            status: STATE_PENDING.to_string(),
            created_at: Utc::now(),
            jobs,
        })
    }

    /// Read a payload back out of a `start_scan` event.
    pub fn from_event(event: &Event) -> Result<Self, ScanError> {
        Ok(serde_json::from_value(event.payload().clone())?)
    }

    /// The `start_scan` event carrying this payload.
    pub fn start_event(&self) -> Result<Event, ScanError> {
        Ok(Event::new(EVENT_START_SCAN, serde_json::to_value(self)?))
    }
}

/// Scan record mutated by state behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub jobs: Vec<ScanJob>,
}

impl Scan {
    /// Mark every job completed.
    pub fn complete_jobs(&mut self) {
        for job in &mut self.jobs {
            job.state = STATE_COMPLETED.to_string();
        }
    }

    pub fn all_jobs_completed(&self) -> bool {
        self.jobs.iter().all(|job| job.state == STATE_COMPLETED)
    }
}

impl From<ScanPayload> for Scan {
    fn from(payload: ScanPayload) -> Self {
        Self {
            id: payload.id,
            status: payload.status,
            created_at: payload.created_at,
            jobs: payload.jobs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn new_payload_links_jobs_to_scan() {
        let payload = ScanPayload::new(3).unwrap();

        assert_eq!(payload.status, "pending");
        assert_eq!(payload.jobs.len(), 3);
        assert!(payload.jobs.iter().all(|job| job.scan_id == payload.id));
        assert!(payload.jobs.iter().all(|job| job.state == "pending"));
        assert!(Uuid::parse_str(&payload.id).is_ok());
    }

    #[test]
    fn zero_jobs_is_rejected() {
        assert!(matches!(ScanPayload::new(0), Err(ScanError::InvalidJobCount)));
    }

    #[test]
    fn payload_wire_shape() {
        let payload = ScanPayload::new(1).unwrap();
        let value = serde_json::to_value(&payload).unwrap();

        let object = value.as_object().unwrap();
        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["created_at", "id", "jobs", "status"]);
        assert_eq!(
            value["jobs"][0]["scan_id"],
            Value::String(payload.id.clone())
        );
    }

    #[test]
    fn start_event_carries_payload() {
        let payload = ScanPayload::new(2).unwrap();
        let event = payload.start_event().unwrap();

        assert_eq!(event.name(), "start_scan");
        assert_eq!(ScanPayload::from_event(&event).unwrap(), payload);
    }

    #[test]
    fn complete_jobs_marks_every_job() {
        let mut scan = Scan::from(ScanPayload::new(2).unwrap());
        assert!(!scan.all_jobs_completed());

        scan.complete_jobs();
        assert!(scan.all_jobs_completed());
    }
}
