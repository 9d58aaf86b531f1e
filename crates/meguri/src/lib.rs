//! A lightweight finite-state workflow engine for Rust.
//!
//! A workflow is a set of named states (one initial, one final, others
//! optionally disabled) and a set of named actions that move it between
//! states. Define a workflow's shape once, then drive it forward one action
//! at a time; any transition that violates the declared structure is
//! rejected and leaves the workflow untouched.
//!
//! # Example
//!
//! ```rust
//! use meguri::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ServiceError> {
//!     let service = WorkflowService::open(Arc::new(MemoryStore::new())).await?;
//!
//!     let definition = Workflow::builder(1)
//!         .name("Document review")
//!         .state(State::new(1, "Draft").initial())
//!         .state(State::new(2, "Review"))
//!         .state(State::new(3, "Done").terminal())
//!         .action(Action::new(10, "submit", [1], 2))
//!         .action(Action::new(11, "approve", [2], 3))
//!         .definition()?;
//!     service.create(definition).await?;
//!
//!     service.execute(1.into(), 10.into()).await?;
//!     let workflow = service.execute(1.into(), 11.into()).await?;
//!     assert_eq!(workflow.history(), &[StateId::new(2), StateId::new(3)]);
//!     Ok(())
//! }
//! ```
//!
//! # Persistence
//!
//! [`WorkflowService`] writes every workflow back to its [`WorkflowStore`]
//! after each successful change. [`JsonFileStore`] keeps them in one JSON
//! file; [`MemoryStore`] keeps them in memory.

mod error;
mod service;
mod store;
mod wire;

// Re-export core types
pub use meguri_core::*;

pub use error::{ServiceError, StoreError};
pub use service::WorkflowService;
pub use store::{JsonFileStore, MemoryStore, WorkflowMap, WorkflowStore};
pub use wire::{AddActionRequest, ActionsInput, CreateWorkflowRequest, StatesInput};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Action, ActionId, ActionRecord, JsonFileStore, MemoryStore, ServiceError, State, StateId,
        Workflow, WorkflowDefinition, WorkflowError, WorkflowId, WorkflowService, WorkflowStore,
    };
}
