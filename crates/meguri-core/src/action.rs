//! Actions (transitions) and their flattened record form.

use crate::error::WorkflowError;
use crate::ids::{ActionId, StateId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named transition from any of its source states to a single target state.
///
/// # Examples
///
/// ```
/// use meguri_core::Action;
///
/// let approve = Action::new(11, "approve", [2, 4], 3);
/// assert_eq!(approve.from_state_ids.len(), 2);
/// assert_eq!(approve.records().count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Unique id within the workflow.
    pub id: ActionId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// States the action may fire from.
    #[serde(default)]
    pub from_state_ids: BTreeSet<StateId>,
    /// State the action moves to.
    pub to_state_id: StateId,
}

impl Action {
    /// Creates an action from a set of source states.
    pub fn new<S>(
        id: impl Into<ActionId>,
        name: impl Into<String>,
        from: impl IntoIterator<Item = S>,
        to: impl Into<StateId>,
    ) -> Self
    where
        S: Into<StateId>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            from_state_ids: from.into_iter().map(Into::into).collect(),
            to_state_id: to.into(),
        }
    }

    /// Returns `true` if the action may fire from `state`.
    pub fn fires_from(&self, state: StateId) -> bool {
        self.from_state_ids.contains(&state)
    }

    /// Flattens the action into one record per source state.
    pub fn records(&self) -> impl Iterator<Item = ActionRecord> + '_ {
        self.from_state_ids.iter().map(move |&from| ActionRecord {
            id: self.id,
            name: self.name.clone(),
            from_state_id: from,
            to_state_id: self.to_state_id,
        })
    }
}

/// One `(action, source state)` pair of a flattened action definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    /// The action this record belongs to.
    pub id: ActionId,
    /// Display name; must agree across all records of the action.
    #[serde(default)]
    pub name: String,
    /// One source state of the action.
    pub from_state_id: StateId,
    /// Target state; must agree across all records of the action.
    pub to_state_id: StateId,
}

impl ActionRecord {
    /// Creates a record.
    pub fn new(
        id: impl Into<ActionId>,
        name: impl Into<String>,
        from: impl Into<StateId>,
        to: impl Into<StateId>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            from_state_id: from.into(),
            to_state_id: to.into(),
        }
    }
}

/// Flattens grouped actions into records, one per source state.
///
/// An action without source states would vanish when flattened, so it is
/// rejected with [`WorkflowError::EmptySourceStates`] instead.
pub fn flatten(
    actions: impl IntoIterator<Item = Action>,
) -> Result<Vec<ActionRecord>, WorkflowError> {
    let mut records = Vec::new();
    for action in actions {
        if action.from_state_ids.is_empty() {
            return Err(WorkflowError::EmptySourceStates(action.id));
        }
        records.extend(action.records());
    }
    Ok(records)
}
