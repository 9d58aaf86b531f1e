//! Request shapes accepted at the service boundary.
//!
//! Clients may submit a workflow's actions grouped (one object per action
//! with a set of source states), keyed by action id, or flattened (one
//! object per source state). These adapters turn every shape into the
//! canonical [`WorkflowDefinition`] the core works on.

use crate::error::ServiceError;
use meguri_core::{Action, ActionId, ActionRecord, State, StateId, Workflow, WorkflowDefinition, WorkflowId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// States as submitted: a list, or a map keyed by state id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatesInput {
    /// `[{ "id": 1, ... }, ...]`
    Listed(Vec<State>),
    /// `{ "1": { "id": 1, ... }, ... }`
    Keyed(BTreeMap<StateId, State>),
}

impl StatesInput {
    fn into_states(self) -> Result<Vec<State>, ServiceError> {
        match self {
            StatesInput::Listed(states) => Ok(states),
            StatesInput::Keyed(states) => states
                .into_iter()
                .map(|(key, state)| {
                    if key == state.id {
                        Ok(state)
                    } else {
                        Err(ServiceError::InvalidRequest(format!(
                            "state keyed as {} declares id {}",
                            key, state.id
                        )))
                    }
                })
                .collect(),
        }
    }
}

/// Actions as submitted.
///
/// Flattened records are tried first: a record carries `fromStateId`, which
/// a grouped action never does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionsInput {
    /// `[{ "id": 10, "fromStateId": 1, "toStateId": 2 }, ...]`
    Records(Vec<ActionRecord>),
    /// `[{ "id": 10, "fromStateIds": [1, 4], "toStateId": 2 }, ...]`
    Grouped(Vec<Action>),
    /// `{ "10": { "id": 10, "fromStateIds": [1], "toStateId": 2 }, ... }`
    Keyed(BTreeMap<ActionId, Action>),
}

impl Default for ActionsInput {
    fn default() -> Self {
        ActionsInput::Records(Vec::new())
    }
}

impl ActionsInput {
    fn into_grouped(self) -> Result<(Vec<Action>, Vec<ActionRecord>), ServiceError> {
        match self {
            ActionsInput::Records(records) => Ok((Vec::new(), records)),
            ActionsInput::Grouped(actions) => Ok((actions, Vec::new())),
            ActionsInput::Keyed(actions) => {
                let actions = actions
                    .into_iter()
                    .map(|(key, action)| {
                        if key == action.id {
                            Ok(action)
                        } else {
                            Err(ServiceError::InvalidRequest(format!(
                                "action keyed as {} declares id {}",
                                key, action.id
                            )))
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((actions, Vec::new()))
            }
        }
    }
}

/// Body of a create-workflow request.
///
/// When `initialStateId` or `finalStateId` is omitted, the state flagged
/// `isInitial` / `isFinal` is used. Any submitted current state or history is
/// ignored: a new workflow always starts at its initial state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowRequest {
    pub id: WorkflowId,
    #[serde(default)]
    pub name: String,
    pub states: StatesInput,
    #[serde(default)]
    pub actions: ActionsInput,
    #[serde(default)]
    pub initial_state_id: Option<StateId>,
    #[serde(default)]
    pub final_state_id: Option<StateId>,
}

impl CreateWorkflowRequest {
    /// Converts the request into a canonical definition.
    pub fn into_definition(self) -> Result<WorkflowDefinition, ServiceError> {
        let mut builder = Workflow::builder(self.id).name(self.name);
        for state in self.states.into_states()? {
            builder = builder.state(state);
        }

        let (actions, records) = self.actions.into_grouped()?;
        for action in actions {
            builder = builder.action(action);
        }
        for record in records {
            builder = builder.record(record);
        }

        if let Some(id) = self.initial_state_id {
            builder = builder.initial_state(id);
        }
        if let Some(id) = self.final_state_id {
            builder = builder.final_state(id);
        }
        Ok(builder.definition()?)
    }
}

/// Body of an add-action request: the action and one source state for it.
///
/// Any `fromStateIds` on the embedded action are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddActionRequest {
    pub action: Action,
    pub from_state_id: StateId,
}

impl AddActionRequest {
    /// Converts the request into a single action record.
    pub fn into_record(self) -> ActionRecord {
        ActionRecord::new(
            self.action.id,
            self.action.name,
            self.from_state_id,
            self.action.to_state_id,
        )
    }
}
