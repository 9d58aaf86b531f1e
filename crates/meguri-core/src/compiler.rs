//! Compiles flattened action records into canonical multi-source actions.

use crate::action::{Action, ActionRecord};
use crate::error::WorkflowError;
use crate::ids::{ActionId, StateId};
use crate::state::StateRegistry;
use std::collections::BTreeMap;

/// Validates action definitions against a workflow's states.
///
/// A single logical action may be declared as several records, one per
/// source state. The compiler regroups them by action id, checks that every
/// record of a group agrees on name and target, and checks each resulting
/// transition against the state registry.
///
/// # Examples
///
/// ```
/// use meguri_core::{ActionCompiler, ActionRecord, State, StateId, StateRegistry};
///
/// let states = StateRegistry::from_states([
///     State::new(1, "Draft").initial(),
///     State::new(2, "Rework"),
///     State::new(3, "Review"),
///     State::new(4, "Done").terminal(),
/// ])?;
///
/// let compiler = ActionCompiler::new(&states, StateId::new(4));
/// let actions = compiler.compile([
///     ActionRecord::new(10, "submit", 1, 3),
///     ActionRecord::new(10, "submit", 2, 3),
/// ])?;
///
/// assert_eq!(actions.len(), 1);
/// assert_eq!(actions.values().next().map(|a| a.from_state_ids.len()), Some(2));
/// # Ok::<(), meguri_core::WorkflowError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ActionCompiler<'a> {
    states: &'a StateRegistry,
    final_state_id: StateId,
}

impl<'a> ActionCompiler<'a> {
    /// Creates a compiler for a workflow with the given states and final state.
    pub fn new(states: &'a StateRegistry, final_state_id: StateId) -> Self {
        Self {
            states,
            final_state_id,
        }
    }

    /// Regroups records by action id and validates each resulting action.
    ///
    /// Groups are checked in ascending action id order. Nothing is returned
    /// unless every group compiles.
    pub fn compile(
        &self,
        records: impl IntoIterator<Item = ActionRecord>,
    ) -> Result<BTreeMap<ActionId, Action>, WorkflowError> {
        let mut groups: BTreeMap<ActionId, Vec<ActionRecord>> = BTreeMap::new();
        for record in records {
            groups.entry(record.id).or_default().push(record);
        }

        let mut actions = BTreeMap::new();
        for (id, group) in groups {
            let action = Self::regroup(id, group)?;
            self.validate(&action)?;
            actions.insert(id, action);
        }
        Ok(actions)
    }

    /// Checks a canonical action against the registry.
    pub fn validate(&self, action: &Action) -> Result<(), WorkflowError> {
        if action.from_state_ids.is_empty() {
            return Err(WorkflowError::EmptySourceStates(action.id));
        }
        self.check_target(action.id, action.to_state_id)?;
        for &from in &action.from_state_ids {
            self.check_source(action.id, from, action.to_state_id)?;
        }
        Ok(())
    }

    /// Adds one source state to an action, creating the action if needed.
    ///
    /// An existing action keeps its name; its target must equal the
    /// record's target.
    pub fn extend(
        &self,
        existing: Option<&Action>,
        record: ActionRecord,
    ) -> Result<Action, WorkflowError> {
        self.check_target(record.id, record.to_state_id)?;
        self.check_source(record.id, record.from_state_id, record.to_state_id)?;

        match existing {
            Some(action) if action.to_state_id != record.to_state_id => {
                Err(WorkflowError::ConflictingActionDefinition(record.id))
            }
            Some(action) => {
                let mut action = action.clone();
                action.from_state_ids.insert(record.from_state_id);
                Ok(action)
            }
            None => Ok(Action::new(
                record.id,
                record.name,
                [record.from_state_id],
                record.to_state_id,
            )),
        }
    }

    fn regroup(id: ActionId, group: Vec<ActionRecord>) -> Result<Action, WorkflowError> {
        let mut records = group.into_iter();
        let Some(first) = records.next() else {
            return Err(WorkflowError::EmptySourceStates(id));
        };

        let mut action = Action::new(id, first.name, [first.from_state_id], first.to_state_id);
        for record in records {
            if record.name != action.name || record.to_state_id != action.to_state_id {
                return Err(WorkflowError::ConflictingActionDefinition(id));
            }
            action.from_state_ids.insert(record.from_state_id);
        }
        Ok(action)
    }

    fn check_target(&self, action: ActionId, to: StateId) -> Result<(), WorkflowError> {
        if !self.states.contains(to) {
            return Err(WorkflowError::UnknownTargetState { action, state: to });
        }
        Ok(())
    }

    fn check_source(&self, action: ActionId, from: StateId, to: StateId) -> Result<(), WorkflowError> {
        if !self.states.contains(from) {
            return Err(WorkflowError::UnknownSourceState {
                action,
                state: from,
            });
        }
        if from == to {
            return Err(WorkflowError::SelfLoop(action));
        }
        if from == self.final_state_id {
            return Err(WorkflowError::ActionFromFinalState(action));
        }
        Ok(())
    }
}
