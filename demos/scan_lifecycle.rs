//! Scan Lifecycle Example
//!
//! A dispatcher publishes scans, a pool of scheduler workers admits them,
//! and each scan is completed once its jobs are done. Workers share one
//! lock-aware storage, so every transition of a scan is serialized. A
//! duplicate delivered after the scan has started is skipped; admission
//! itself is not locked, so two workers racing on a brand-new scan can
//! both start it.
//!
//! Run with: cargo run --example scan_lifecycle
//! Set RUST_LOG=lockstep=debug for more detail.

use lockstep::messaging::{EventCodec, EventPublisher, JsonEventCodec, MemoryQueue, MessageSource};
use lockstep::scan::{Admission, ScanPayload, ScanScheduler};
use lockstep::storage::{
    LocalKeyValueStore, LockableStorage, SharedStorage, SharedStorageConfig, StateStorage,
};
use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Scan Lifecycle Example ===\n");

    let config = SharedStorageConfig::default()
        .prefix("scans")
        .lock_ttl(Duration::from_secs(5));
    let storage = Arc::new(SharedStorage::new(LocalKeyValueStore::new(), config));

    // Dispatcher: three scans, the second one delivered twice
    let queue = MemoryQueue::new();
    let publisher = EventPublisher::new(queue.clone());
    let payloads: Vec<ScanPayload> = (1..=3)
        .map(ScanPayload::new)
        .collect::<Result<_, _>>()?;
    for payload in &payloads {
        publisher.publish(&payload.id, &payload.start_event()?)?;
    }
    publisher.publish(&payloads[1].id, &payloads[1].start_event()?)?;
    println!("Published {} messages", queue.pending());

    // Scheduler workers drain the queue concurrently
    let lockable: Arc<dyn LockableStorage> = storage.clone();
    let scheduler = ScanScheduler::new(lockable);
    let workers: Vec<_> = (0..2)
        .map(|worker| {
            let mut source = queue.clone();
            let scheduler = scheduler.clone();
            thread::spawn(move || -> Result<usize, String> {
                let mut started = 0;
                while let Some(message) = source.fetch().map_err(|e| e.to_string())? {
                    let event = JsonEventCodec.decode(&message.value).map_err(|e| e.to_string())?;
                    let payload = ScanPayload::from_event(&event).map_err(|e| e.to_string())?;
                    let (scan, admission) = scheduler.admit(payload).map_err(|e| e.to_string())?;

                    match admission {
                        Admission::Started => {
                            started += 1;
                            println!("worker {worker}: started scan {}", message.key);
                            thread::sleep(Duration::from_millis(50));
                            scheduler.finish(&scan).map_err(|e| e.to_string())?;
                            println!("worker {worker}: completed scan {}", message.key);
                        }
                        Admission::Skipped { state } => {
                            println!("worker {worker}: skipped scan {} ({state})", message.key);
                        }
                    }
                    source.commit(&message).map_err(|e| e.to_string())?;
                }
                Ok(started)
            })
        })
        .collect();

    let mut started = 0;
    for worker in workers {
        started += worker.join().map_err(|_| "worker panicked")??;
    }

    println!("\nStarted {started} scans");
    for payload in &payloads {
        println!(
            "  {} ({} jobs): {}",
            payload.id,
            payload.jobs.len(),
            storage.get_state(&payload.id)?
        );
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
