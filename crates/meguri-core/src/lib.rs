//! Core types and rules for the meguri workflow engine.
//!
//! This crate has no runtime dependencies and performs no I/O. It defines
//! what a structurally valid workflow is and how a workflow moves between
//! its states; the `meguri` crate adds the owned store and persistence.
//!
//! # Core Types
//!
//! - [`Workflow`] - The aggregate: states, actions, current state and history
//! - [`StateRegistry`] - The states of one workflow, keyed by id
//! - [`ActionCompiler`] - Regroups flattened [`ActionRecord`]s into [`Action`]s
//! - [`TransitionExecutor`] - Guards a single transition
//! - [`WorkflowError`] - Every validation failure, with the offending ids

mod action;
mod compiler;
mod error;
mod executor;
mod ids;
mod state;
mod workflow;

pub use action::{flatten, Action, ActionRecord};
pub use compiler::ActionCompiler;
pub use error::WorkflowError;
pub use executor::{Transition, TransitionExecutor};
pub use ids::{ActionId, StateId, WorkflowId};
pub use state::{State, StateRegistry};
pub use workflow::{Workflow, WorkflowBuilder, WorkflowDefinition};
