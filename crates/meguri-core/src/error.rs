//! Workflow error types.

use crate::ids::{ActionId, StateId};
use thiserror::Error;

/// Errors raised while defining or driving a workflow.
///
/// Every variant is a validation failure of the request that produced it:
/// none of them is transient, and the workflow is left untouched when one is
/// returned. Each carries the offending id so the caller can correct the input.
///
/// # Non-Exhaustive
///
/// This enum is marked `#[non_exhaustive]`; include a wildcard arm when
/// matching on it:
///
/// ```
/// use meguri_core::WorkflowError;
///
/// fn describe(error: &WorkflowError) -> String {
///     match error {
///         WorkflowError::ActionNotApplicable { action, current } => {
///             format!("action {} cannot fire from state {}", action, current)
///         }
///         WorkflowError::TargetStateDisabled { state, .. } => {
///             format!("state {} is disabled", state)
///         }
///         other => other.to_string(),
///     }
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WorkflowError {
    /// A state with this id already exists in the workflow.
    #[error("State id {0} already exists")]
    DuplicateStateId(StateId),

    /// The referenced state does not exist in the workflow.
    #[error("State not found: {0}")]
    StateNotFound(StateId),

    /// The workflow builder is missing required configuration.
    #[error("Invalid workflow configuration: {0}")]
    Configuration(String),

    /// The declared initial state is not part of the state set.
    #[error("Initial state {0} not found")]
    UnknownInitialState(StateId),

    /// The declared final state is not part of the state set.
    #[error("Final state {0} not found")]
    UnknownFinalState(StateId),

    /// State flags disagree with the declared initial/final ids.
    #[error("Conflicting state flags on state {state}: {details}")]
    ConflictingStateFlags {
        /// The state whose flags are inconsistent.
        state: StateId,
        /// What is inconsistent about it.
        details: String,
    },

    /// An action's target state does not exist.
    #[error("Target state {state} not found for action {action}")]
    UnknownTargetState {
        /// The action being defined.
        action: ActionId,
        /// The missing target state.
        state: StateId,
    },

    /// One of an action's source states does not exist.
    #[error("Source state {state} not found for action {action}")]
    UnknownSourceState {
        /// The action being defined.
        action: ActionId,
        /// The missing source state.
        state: StateId,
    },

    /// An action lists its own target among its source states.
    #[error("Action {0} would loop back onto its own target state")]
    SelfLoop(ActionId),

    /// An action lists the workflow's final state as a source.
    #[error("Action {0} cannot leave the final state")]
    ActionFromFinalState(ActionId),

    /// Two definitions of the same action disagree on name or target.
    #[error("Action {0} has conflicting definitions")]
    ConflictingActionDefinition(ActionId),

    /// A grouped action was submitted without any source state.
    #[error("Action {0} declares no source states")]
    EmptySourceStates(ActionId),

    /// The requested action does not exist in the workflow.
    #[error("Action not found: {0}")]
    ActionNotFound(ActionId),

    /// The current state is not one of the action's source states.
    #[error("Action {action} is not valid from current state {current}")]
    ActionNotApplicable {
        /// The action that was requested.
        action: ActionId,
        /// The workflow's current state.
        current: StateId,
    },

    /// The action's target state is disabled.
    #[error("Target state {state} of action {action} is disabled")]
    TargetStateDisabled {
        /// The action that was requested.
        action: ActionId,
        /// The disabled target state.
        state: StateId,
    },
}

impl WorkflowError {
    /// Returns `true` for errors caused by a missing state or action.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WorkflowError::StateNotFound(_) | WorkflowError::ActionNotFound(_)
        )
    }

    /// Returns `true` for errors caused by a clash with existing definitions.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            WorkflowError::DuplicateStateId(_) | WorkflowError::ConflictingActionDefinition(_)
        )
    }
}
