//! Fluent builder for engines.

use crate::builder::config::{AutoLock, FsmConfig};
use crate::core::{HookError, State, TransitionRecord};
use crate::engine::{Fsm, FsmError, Logger};
use crate::storage::StateStorage;
use std::sync::Arc;

/// Builder for constructing an [`Fsm`] with a fluent API.
///
/// # Example
///
/// ```rust
/// use lockstep::builder::{AutoLock, FsmBuilder};
/// use lockstep::core::{Event, Rejection, State, Transition, TriggerContext};
/// use lockstep::engine::LockRetryConfig;
/// use lockstep::storage::{MemoryStorage, StateStorage};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// struct Step {
///     name: &'static str,
///     next: &'static str,
/// }
///
/// impl State for Step {
///     fn name(&self) -> &str {
///         self.name
///     }
///
///     fn handle_event(&self, _: TriggerContext<'_>, _: &Event) -> Result<Transition, Rejection> {
///         Ok(Transition::to(self.next))
///     }
/// }
///
/// let storage = Arc::new(MemoryStorage::with_states([("job-1", "queued")]));
/// let fsm = FsmBuilder::new()
///     .state(Step { name: "queued", next: "done" })
///     .state(Step { name: "done", next: "" })
///     .auto_lock(AutoLock::new(storage.clone(), LockRetryConfig::new(2, Duration::from_millis(5))))
///     .build()
///     .unwrap();
///
/// fsm.trigger("job-1", &Event::named("tick")).unwrap();
/// assert_eq!(storage.get_state("job-1").unwrap(), "done");
/// ```
#[derive(Default)]
pub struct FsmBuilder {
    states: Vec<Arc<dyn State>>,
    config: FsmConfig,
}

impl FsmBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state. A later state with the same name replaces it.
    pub fn state<S: State + 'static>(mut self, state: S) -> Self {
        self.states.push(Arc::new(state));
        self
    }

    /// Register a state that other code also holds a handle to.
    pub fn shared_state(mut self, state: Arc<dyn State>) -> Self {
        self.states.push(state);
        self
    }

    /// Register several states at once, in order.
    pub fn states<I>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn State>>,
    {
        self.states.extend(states);
        self
    }

    /// Storage for reading and writing state names.
    pub fn storage(mut self, storage: Arc<dyn StateStorage>) -> Self {
        self.config.storage = Some(storage);
        self
    }

    /// Serialize triggers per entity through a lock.
    pub fn auto_lock(mut self, auto_lock: AutoLock) -> Self {
        self.config.auto_lock = Some(auto_lock);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.config.logger = Some(logger);
        self
    }

    /// Observe every persisted transition.
    pub fn transition_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TransitionRecord) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.config.transition_hook = Some(Arc::new(hook));
        self
    }

    /// The configuration collected so far.
    pub fn config(&self) -> &FsmConfig {
        &self.config
    }

    /// Build the engine.
    /// Returns an error listing every missing required field.
    pub fn build(self) -> Result<Fsm, FsmError> {
        Fsm::new(self.states, self.config)
    }
}
