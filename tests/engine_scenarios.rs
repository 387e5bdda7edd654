//! End-to-end engine scenarios against both storage backends.

use lockstep::builder::{AutoLock, FsmBuilder};
use lockstep::core::{Event, HookError, Rejection, State, Transition, TriggerContext};
use lockstep::engine::{FsmError, LockRetryConfig, NoopLogger};
use lockstep::scan::{scan_fsm, Scan, ScanPayload, SharedScan};
use lockstep::storage::{
    KeyValueStore, LocalKeyValueStore, LockGuard, LockableStorage, MemoryStorage, SharedStorage,
    SharedStorageConfig, StateStorage, StorageError,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Lock that refuses the first `failures` attempts.
struct FlakyLock {
    inner: MemoryStorage,
    failures: u32,
    attempts: AtomicU32,
}

impl FlakyLock {
    fn new(failures: u32) -> Self {
        Self {
            inner: MemoryStorage::with_states([("job-1", "queued")]),
            failures,
            attempts: AtomicU32::new(0),
        }
    }
}

impl StateStorage for FlakyLock {
    fn get_state(&self, entity_id: &str) -> Result<String, StorageError> {
        self.inner.get_state(entity_id)
    }

    fn set_state(&self, entity_id: &str, state: &str) -> Result<(), StorageError> {
        self.inner.set_state(entity_id, state)
    }
}

impl LockableStorage for FlakyLock {
    fn lock(&self, entity_id: &str) -> Result<LockGuard, StorageError> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(StorageError::LockHeld {
                entity_id: entity_id.to_string(),
            });
        }
        Ok(LockGuard::noop())
    }
}

struct Step {
    name: &'static str,
    next: &'static str,
}

impl State for Step {
    fn name(&self) -> &str {
        self.name
    }

    fn handle_event(&self, _: TriggerContext<'_>, event: &Event) -> Result<Transition, Rejection> {
        match event.name() {
            "advance" => Ok(Transition::to(self.next)),
            _ => Err(Rejection::unexpected(self.name, event)),
        }
    }
}

fn shared_scan() -> SharedScan {
    let scan: Scan = ScanPayload::new(2).unwrap().into();
    Arc::new(Mutex::new(scan))
}

#[test]
fn scan_rejects_restart_once_running() {
    let scan = shared_scan();
    let id = scan.lock().id.clone();
    let storage = Arc::new(MemoryStorage::with_states([(id.clone(), "pending")]));
    let fsm = scan_fsm(scan, storage.clone()).unwrap();

    fsm.trigger(&id, &Event::named("start_scan")).unwrap();
    assert_eq!(storage.get_state(&id).unwrap(), "running");

    let err = fsm.trigger(&id, &Event::named("start_scan")).unwrap_err();
    assert!(matches!(err, FsmError::TransitionRejected { .. }));
    assert_eq!(storage.get_state(&id).unwrap(), "running");
}

#[test]
fn lock_succeeds_on_third_attempt_after_backoff() {
    let storage = Arc::new(FlakyLock::new(2));
    let handler_calls = Arc::new(AtomicUsize::new(0));
    let calls = Arc::clone(&handler_calls);
    let auto_lock = AutoLock::new(storage.clone(), LockRetryConfig::new(3, Duration::from_millis(10)))
        .on_failure(move |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
    let fsm = FsmBuilder::new()
        .state(Step { name: "queued", next: "done" })
        .state(Step { name: "done", next: "" })
        .auto_lock(auto_lock)
        .logger(Arc::new(NoopLogger))
        .build()
        .unwrap();

    let started = Instant::now();
    fsm.trigger("job-1", &Event::named("advance")).unwrap();

    assert!(started.elapsed() >= Duration::from_millis(30));
    assert_eq!(storage.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(storage.get_state("job-1").unwrap(), "done");
    assert_eq!(handler_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn exhausted_retries_call_failure_handler_once() {
    let storage = Arc::new(FlakyLock::new(u32::MAX));
    let failures = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&failures);
    let auto_lock = AutoLock::new(storage.clone(), LockRetryConfig::new(2, Duration::from_millis(1)))
        .on_failure(move |entity_id, event| {
            seen.lock().push((entity_id.to_string(), event.name().to_string()));
        });
    let fsm = FsmBuilder::new()
        .state(Step { name: "queued", next: "done" })
        .state(Step { name: "done", next: "" })
        .auto_lock(auto_lock)
        .logger(Arc::new(NoopLogger))
        .build()
        .unwrap();

    let err = fsm.trigger("job-1", &Event::named("advance")).unwrap_err();

    assert!(matches!(err, FsmError::LockAcquisition { attempts: 3, .. }));
    assert_eq!(
        *failures.lock(),
        vec![("job-1".to_string(), "advance".to_string())]
    );
    assert_eq!(storage.get_state("job-1").unwrap(), "queued");
}

#[test]
fn expired_shared_lock_is_reclaimed() {
    let config = SharedStorageConfig::default().lock_ttl(Duration::from_secs(1));
    let storage = SharedStorage::new(LocalKeyValueStore::new(), config);

    let abandoned = storage.lock("scan-1").unwrap();
    std::mem::forget(abandoned);
    assert!(matches!(
        storage.lock("scan-1"),
        Err(StorageError::LockHeld { .. })
    ));

    thread::sleep(Duration::from_millis(1500));
    assert!(storage.lock("scan-1").is_ok());
}

#[test]
fn duplicate_state_name_resolves_to_last_registration() {
    let storage = Arc::new(MemoryStorage::with_states([("job-1", "running")]));
    let fsm = FsmBuilder::new()
        .state(Step { name: "running", next: "first" })
        .state(Step { name: "first", next: "" })
        .state(Step { name: "second", next: "" })
        .state(Step { name: "running", next: "second" })
        .storage(storage.clone())
        .logger(Arc::new(NoopLogger))
        .build()
        .unwrap();

    fsm.trigger("job-1", &Event::named("advance")).unwrap();

    assert_eq!(storage.get_state("job-1").unwrap(), "second");
    assert_eq!(fsm.state_names(), vec!["first", "running", "second"]);
}

#[test]
fn lock_is_released_after_rejection() {
    let storage = Arc::new(SharedStorage::new(
        LocalKeyValueStore::new(),
        SharedStorageConfig::default(),
    ));
    storage.set_state("job-1", "queued").unwrap();
    let fsm = FsmBuilder::new()
        .state(Step { name: "queued", next: "done" })
        .state(Step { name: "done", next: "" })
        .auto_lock(AutoLock::new(storage.clone(), LockRetryConfig::default()))
        .logger(Arc::new(NoopLogger))
        .build()
        .unwrap();

    assert!(fsm.trigger("job-1", &Event::named("poke")).is_err());
    fsm.trigger("job-1", &Event::named("advance")).unwrap();

    assert_eq!(storage.get_state("job-1").unwrap(), "done");
    assert_eq!(storage.store().get("fsm:lock:job-1").unwrap(), None);
}

/// Alternates between "ping" and "pong", flagging any overlap between one
/// trigger's handling and another's entry.
struct Bounce {
    name: &'static str,
    next: &'static str,
    busy: Arc<AtomicBool>,
    overlaps: Arc<AtomicUsize>,
}

impl State for Bounce {
    fn name(&self) -> &str {
        self.name
    }

    fn on_enter(&self, _: TriggerContext<'_>, _: &Event) -> Result<(), HookError> {
        self.busy.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn handle_event(&self, _: TriggerContext<'_>, _: &Event) -> Result<Transition, Rejection> {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        thread::sleep(Duration::from_micros(200));
        Ok(Transition::to(self.next))
    }
}

#[test]
fn concurrent_triggers_do_not_interleave() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;

    let busy = Arc::new(AtomicBool::new(false));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let transitions = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&transitions);
    let storage = Arc::new(MemoryStorage::with_states([("ball", "ping")]));

    let bounce = |name, next| Bounce {
        name,
        next,
        busy: Arc::clone(&busy),
        overlaps: Arc::clone(&overlaps),
    };
    let fsm = Arc::new(
        FsmBuilder::new()
            .state(bounce("ping", "pong"))
            .state(bounce("pong", "ping"))
            .auto_lock(AutoLock::new(storage.clone(), LockRetryConfig::default()))
            .transition_hook(move |_| {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .logger(Arc::new(NoopLogger))
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let fsm = Arc::clone(&fsm);
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    fsm.trigger("ball", &Event::named("hit")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(transitions.load(Ordering::SeqCst), THREADS * PER_THREAD);
    assert_eq!(storage.get_state("ball").unwrap(), "ping");
}
