//! Property-based tests for the engine.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use lockstep::builder::{AutoLock, FsmBuilder};
use lockstep::core::{Event, HookError, Rejection, State, Transition, TriggerContext};
use lockstep::engine::{FsmError, LockRetryConfig, NoopLogger};
use lockstep::storage::{
    LockGuard, LockableStorage, MemoryStorage, StateStorage, StorageError,
};
use proptest::prelude::*;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Lock that refuses the first `failures` attempts.
struct FlakyLock {
    inner: MemoryStorage,
    failures: u32,
    attempts: AtomicU32,
}

impl FlakyLock {
    fn new(failures: u32) -> Self {
        Self {
            inner: MemoryStorage::with_states([("e1", "idle")]),
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
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            Err(StorageError::LockHeld {
                entity_id: entity_id.to_string(),
            })
        } else {
            Ok(LockGuard::noop())
        }
    }
}

/// Rejects every event with its own tag so tests can tell registrations apart.
struct Tagged {
    name: String,
    tag: usize,
}

impl State for Tagged {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle_event(&self, _: TriggerContext<'_>, _: &Event) -> Result<Transition, Rejection> {
        Err(Rejection::new(format!("tag-{}", self.tag)))
    }
}

/// Returns a fixed transition and counts lifecycle calls.
struct Echo {
    name: &'static str,
    target: String,
    hooks: Arc<AtomicUsize>,
}

impl State for Echo {
    fn name(&self) -> &str {
        self.name
    }

    fn on_enter(&self, _: TriggerContext<'_>, _: &Event) -> Result<(), HookError> {
        self.hooks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_exit(&self, _: TriggerContext<'_>, _: &Event) -> Result<(), HookError> {
        self.hooks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn handle_event(&self, _: TriggerContext<'_>, _: &Event) -> Result<Transition, Rejection> {
        Ok(Transition::to(self.target.clone()))
    }
}

const NAMES: [&str; 3] = ["idle", "running", "done"];

proptest! {
    #[test]
    fn backoff_doubles_from_base(max_retries in 0u32..12, base_ms in 0u64..1_000) {
        let base = Duration::from_millis(base_ms);
        let retry = LockRetryConfig::new(max_retries, base);

        let delays: Vec<_> = retry.delays().collect();
        prop_assert_eq!(delays.len(), max_retries as usize);
        for (i, delay) in delays.iter().enumerate() {
            prop_assert_eq!(*delay, base * 2u32.pow(i as u32));
        }
        prop_assert_eq!(retry.max_attempts(), max_retries + 1);
    }

    #[test]
    fn lock_attempts_are_bounded(max_retries in 0u32..6, failures in 0u32..10) {
        let storage = Arc::new(FlakyLock::new(failures));
        let fsm = FsmBuilder::new()
            .state(Echo { name: "idle", target: String::new(), hooks: Arc::default() })
            .auto_lock(AutoLock::new(storage.clone(), LockRetryConfig::new(max_retries, Duration::ZERO)))
            .logger(Arc::new(NoopLogger))
            .build()
            .unwrap();

        let result = fsm.trigger("e1", &Event::named("tick"));
        let attempts = storage.attempts.load(Ordering::SeqCst);

        prop_assert_eq!(attempts, (failures + 1).min(max_retries + 1));
        if failures <= max_retries {
            prop_assert!(result.is_ok());
        } else {
            let is_lock_failure = matches!(
                result,
                Err(FsmError::LockAcquisition { attempts: reported, .. }) if reported == attempts
            );
            prop_assert!(is_lock_failure);
        }
    }

    #[test]
    fn last_registration_wins(picks in prop::collection::vec(0usize..NAMES.len(), 1..12)) {
        let states: Vec<Arc<dyn State>> = picks
            .iter()
            .enumerate()
            .map(|(tag, &pick)| Arc::new(Tagged { name: NAMES[pick].to_string(), tag }) as Arc<dyn State>)
            .collect();
        let storage = Arc::new(MemoryStorage::new());
        let fsm = FsmBuilder::new()
            .states(states)
            .storage(storage.clone())
            .logger(Arc::new(NoopLogger))
            .build()
            .unwrap();

        for (i, name) in NAMES.iter().enumerate() {
            let Some(last) = picks.iter().rposition(|&pick| pick == i) else {
                prop_assert!(!fsm.has_state(name));
                continue;
            };
            storage.set_state("e1", name).unwrap();
            let err = fsm.trigger("e1", &Event::named("poke")).unwrap_err();
            let is_rejection = matches!(&err, FsmError::TransitionRejected { source, .. } if source.to_string() == format!("tag-{last}"));
            prop_assert!(is_rejection, "unexpected error: {}", err);
        }
    }

    #[test]
    fn noop_transitions_change_nothing(stay_on_current in any::<bool>()) {
        let hooks = Arc::new(AtomicUsize::new(0));
        let target = if stay_on_current { "idle".to_string() } else { String::new() };
        let storage = Arc::new(MemoryStorage::with_states([("e1", "idle")]));
        let fsm = FsmBuilder::new()
            .state(Echo { name: "idle", target, hooks: hooks.clone() })
            .storage(storage.clone())
            .logger(Arc::new(NoopLogger))
            .build()
            .unwrap();

        prop_assert!(fsm.trigger("e1", &Event::named("tick")).is_ok());
        prop_assert_eq!(storage.get_state("e1").unwrap(), "idle");
        prop_assert_eq!(hooks.load(Ordering::SeqCst), 0);
    }
}
