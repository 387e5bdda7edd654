//! Lockstep: a lock-aware finite state machine engine
//!
//! Lockstep drives entities (jobs, scans, orders) through named states in
//! response to events. The engine itself is stateless: each entity's current
//! state name lives in pluggable storage, so any number of engine instances,
//! in one process or many, can serve the same entities. When the storage can
//! lock, every trigger for an entity runs under that entity's lock, acquired
//! with bounded exponential backoff.
//!
//! # Core Concepts
//!
//! - **State**: Named behavior reacting to events via the `State` trait
//! - **Storage**: Where each entity's state name is persisted, optionally lockable
//! - **Engine**: `Fsm::trigger` runs the read, handle, exit, persist, enter protocol
//! - **Messaging**: Codec, publisher and consumer glue around the engine
//!
//! # Example
//!
//! ```rust
//! use lockstep::builder::FsmBuilder;
//! use lockstep::core::{Event, Rejection, State, Transition, TriggerContext};
//! use lockstep::storage::{MemoryStorage, StateStorage};
//! use std::sync::Arc;
//!
//! struct Draft;
//! struct Published;
//!
//! impl State for Draft {
//!     fn name(&self) -> &str {
//!         "draft"
//!     }
//!
//!     fn handle_event(&self, _: TriggerContext<'_>, event: &Event) -> Result<Transition, Rejection> {
//!         match event.name() {
//!             "publish" => Ok(Transition::to("published")),
//!             _ => Err(Rejection::unexpected("draft", event)),
//!         }
//!     }
//! }
//!
//! impl State for Published {
//!     fn name(&self) -> &str {
//!         "published"
//!     }
//!
//!     fn handle_event(&self, _: TriggerContext<'_>, _: &Event) -> Result<Transition, Rejection> {
//!         Ok(Transition::stay())
//!     }
//! }
//!
//! let storage = Arc::new(MemoryStorage::with_states([("post-1", "draft")]));
//! let fsm = FsmBuilder::new()
//!     .state(Draft)
//!     .state(Published)
//!     .storage(storage.clone())
//!     .build()
//!     .unwrap();
//!
//! fsm.trigger("post-1", &Event::named("publish")).unwrap();
//! assert_eq!(storage.get_state("post-1").unwrap(), "published");
//! ```

pub mod builder;
pub mod core;
pub mod engine;
pub mod messaging;
pub mod scan;
pub mod storage;

// Re-export commonly used types
pub use builder::FsmBuilder;
pub use core::{Event, State, Transition};
pub use engine::{Fsm, FsmError, LockRetryConfig};
pub use storage::{LockableStorage, StateStorage};
