//! States and the per-workflow state registry.

use crate::error::WorkflowError;
use crate::ids::StateId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn enabled_by_default() -> bool {
    true
}

/// A named state of a workflow.
///
/// # Examples
///
/// ```
/// use meguri_core::State;
///
/// let draft = State::new(1, "Draft").initial();
/// assert!(draft.is_initial);
/// assert!(draft.enabled);
///
/// let done = State::new(3, "Done").terminal();
/// assert!(done.is_final);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    /// Unique id within the workflow.
    pub id: StateId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Whether this is the workflow's starting state.
    #[serde(default)]
    pub is_initial: bool,
    /// Whether this is the workflow's sink state.
    #[serde(default)]
    pub is_final: bool,
    /// Disabled states cannot be entered.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl State {
    /// Creates an enabled, non-initial, non-final state.
    pub fn new(id: impl Into<StateId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_initial: false,
            is_final: false,
            enabled: true,
        }
    }

    /// Marks the state as the initial state.
    pub fn initial(mut self) -> Self {
        self.is_initial = true;
        self
    }

    /// Marks the state as the final state.
    pub fn terminal(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Marks the state as disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// All states of one workflow, keyed by id.
///
/// Actions refer to states by id only, so toggling a state here is seen by
/// every action that targets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateRegistry {
    states: BTreeMap<StateId, State>,
}

impl StateRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a list of states, rejecting duplicate ids.
    pub fn from_states(states: impl IntoIterator<Item = State>) -> Result<Self, WorkflowError> {
        let mut registry = Self::new();
        for state in states {
            registry.add_state(state)?;
        }
        Ok(registry)
    }

    /// Inserts a state.
    ///
    /// Fails with [`WorkflowError::DuplicateStateId`] if the id is taken; the
    /// registry is unchanged in that case.
    pub fn add_state(&mut self, state: State) -> Result<(), WorkflowError> {
        if self.states.contains_key(&state.id) {
            return Err(WorkflowError::DuplicateStateId(state.id));
        }
        self.states.insert(state.id, state);
        Ok(())
    }

    /// Sets the enabled flag of a state. Setting the current value again is
    /// not an error.
    pub fn toggle(&mut self, id: StateId, enabled: bool) -> Result<(), WorkflowError> {
        let state = self
            .states
            .get_mut(&id)
            .ok_or(WorkflowError::StateNotFound(id))?;
        state.enabled = enabled;
        Ok(())
    }

    /// Returns the state with the given id.
    pub fn get(&self, id: StateId) -> Option<&State> {
        self.states.get(&id)
    }

    /// Returns `true` if a state with the given id exists.
    pub fn contains(&self, id: StateId) -> bool {
        self.states.contains_key(&id)
    }

    /// Returns `true` if the state exists and is enabled.
    pub fn is_enabled(&self, id: StateId) -> bool {
        self.states.get(&id).is_some_and(|s| s.enabled)
    }

    /// Iterates over states in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &State> {
        self.states.values()
    }

    /// Returns the number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` if there are no states.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
