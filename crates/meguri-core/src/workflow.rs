//! The workflow aggregate and its builder.

use crate::action::{flatten, Action, ActionRecord};
use crate::compiler::ActionCompiler;
use crate::error::WorkflowError;
use crate::executor::{Transition, TransitionExecutor};
use crate::ids::{ActionId, StateId, WorkflowId};
use crate::state::{State, StateRegistry};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

/// A submitted workflow shape, prior to validation.
///
/// Actions arrive flattened, one record per source state; see
/// [`ActionCompiler`] for how they are regrouped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    /// Store-wide unique id.
    pub id: WorkflowId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Every state of the workflow.
    pub states: Vec<State>,
    /// Flattened action records.
    #[serde(default)]
    pub actions: Vec<ActionRecord>,
    /// The state a new workflow starts in.
    pub initial_state_id: StateId,
    /// The sink state no action may leave.
    pub final_state_id: StateId,
}

/// A finite-state workflow: its states, its actions, and where it currently is.
///
/// The current state and history only change through [`Workflow::execute`].
///
/// # Examples
///
/// ```
/// use meguri_core::{Action, State, StateId, Workflow};
///
/// let mut workflow = Workflow::builder(1)
///     .name("Document review")
///     .state(State::new(1, "Draft").initial())
///     .state(State::new(2, "Review"))
///     .state(State::new(3, "Done").terminal())
///     .action(Action::new(10, "submit", [1], 2))
///     .action(Action::new(11, "approve", [2], 3))
///     .build()?;
///
/// workflow.execute(10.into())?;
/// workflow.execute(11.into())?;
///
/// assert!(workflow.is_complete());
/// assert_eq!(workflow.history(), &[StateId::new(2), StateId::new(3)]);
/// # Ok::<(), meguri_core::WorkflowError>(())
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    id: WorkflowId,
    #[serde(default)]
    name: String,
    states: StateRegistry,
    #[serde(default)]
    actions: BTreeMap<ActionId, Action>,
    initial_state_id: StateId,
    final_state_id: StateId,
    current_state_id: StateId,
    #[serde(default, alias = "stateHistory")]
    history: Vec<StateId>,
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("states", &self.states.iter().map(|s| s.id).collect::<Vec<_>>())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("current_state_id", &self.current_state_id)
            .field("history", &self.history)
            .finish()
    }
}

impl Workflow {
    /// Creates a new workflow builder.
    pub fn builder(id: impl Into<WorkflowId>) -> WorkflowBuilder {
        WorkflowBuilder::new(id)
    }

    /// Validates a definition and creates the workflow at its initial state.
    ///
    /// The declared initial and final ids must name existing states, and no
    /// other state may carry the initial or final flag. The declared states
    /// get their flag set if the submission left it out.
    pub fn from_definition(definition: WorkflowDefinition) -> Result<Self, WorkflowError> {
        let WorkflowDefinition {
            id,
            name,
            states,
            actions,
            initial_state_id,
            final_state_id,
        } = definition;

        let states = normalize_flags(states, initial_state_id, final_state_id)?;
        let actions = ActionCompiler::new(&states, final_state_id).compile(actions)?;

        Ok(Self {
            id,
            name,
            states,
            actions,
            initial_state_id,
            final_state_id,
            current_state_id: initial_state_id,
            history: Vec::new(),
        })
    }

    /// Returns the workflow id.
    pub fn id(&self) -> WorkflowId {
        self.id
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the state registry.
    pub fn states(&self) -> &StateRegistry {
        &self.states
    }

    /// Returns the action with the given id.
    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions.get(&id)
    }

    /// Iterates over actions in ascending id order.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.values()
    }

    pub fn initial_state_id(&self) -> StateId {
        self.initial_state_id
    }

    pub fn final_state_id(&self) -> StateId {
        self.final_state_id
    }

    pub fn current_state_id(&self) -> StateId {
        self.current_state_id
    }

    /// States entered so far, oldest first. Does not include the initial state.
    pub fn history(&self) -> &[StateId] {
        &self.history
    }

    /// Returns `true` once the workflow has reached its final state.
    pub fn is_complete(&self) -> bool {
        self.current_state_id == self.final_state_id
    }

    /// Adds a state after creation.
    ///
    /// The initial and final states are fixed at creation, so a new state may
    /// not carry either flag.
    pub fn add_state(&mut self, state: State) -> Result<(), WorkflowError> {
        if state.is_initial || state.is_final {
            return Err(WorkflowError::ConflictingStateFlags {
                state: state.id,
                details: "initial and final states are fixed at creation".to_string(),
            });
        }
        self.states.add_state(state)
    }

    /// Enables or disables a state.
    pub fn toggle_state(&mut self, id: StateId, enabled: bool) -> Result<(), WorkflowError> {
        self.states.toggle(id, enabled)
    }

    /// Adds one source state to an action, creating the action if it is new.
    pub fn add_action(&mut self, record: ActionRecord) -> Result<&Action, WorkflowError> {
        let compiler = ActionCompiler::new(&self.states, self.final_state_id);
        let action = compiler.extend(self.actions.get(&record.id), record)?;
        Ok(match self.actions.entry(action.id) {
            Entry::Occupied(mut slot) => {
                slot.insert(action);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(action),
        })
    }

    /// Fires an action from the current state.
    ///
    /// On success the current state moves to the action's target and the
    /// target is appended to the history. On failure nothing changes.
    pub fn execute(&mut self, action_id: ActionId) -> Result<Transition, WorkflowError> {
        let transition = self.executor().resolve(self.current_state_id, action_id)?;
        self.current_state_id = transition.to;
        self.history.push(transition.to);
        Ok(transition)
    }

    /// Actions that would succeed from the current state.
    pub fn available_actions(&self) -> impl Iterator<Item = &Action> {
        self.executor().available(self.current_state_id)
    }

    fn executor(&self) -> TransitionExecutor<'_> {
        TransitionExecutor::new(&self.states, &self.actions)
    }
}

fn normalize_flags(
    states: Vec<State>,
    initial: StateId,
    terminal: StateId,
) -> Result<StateRegistry, WorkflowError> {
    let mut registry = StateRegistry::new();
    for mut state in states {
        if state.is_initial && state.id != initial {
            return Err(WorkflowError::ConflictingStateFlags {
                state: state.id,
                details: format!("flagged initial but the workflow starts at {}", initial),
            });
        }
        if state.is_final && state.id != terminal {
            return Err(WorkflowError::ConflictingStateFlags {
                state: state.id,
                details: format!("flagged final but the workflow ends at {}", terminal),
            });
        }
        state.is_initial = state.id == initial;
        state.is_final = state.id == terminal;
        registry.add_state(state)?;
    }

    if !registry.contains(initial) {
        return Err(WorkflowError::UnknownInitialState(initial));
    }
    if !registry.contains(terminal) {
        return Err(WorkflowError::UnknownFinalState(terminal));
    }
    Ok(registry)
}

/// Builder for constructing [`Workflow`] instances.
///
/// When no initial or final state is set explicitly, the state flagged
/// `is_initial` / `is_final` is used.
#[derive(Debug)]
pub struct WorkflowBuilder {
    id: WorkflowId,
    name: String,
    states: Vec<State>,
    actions: Vec<Action>,
    records: Vec<ActionRecord>,
    initial_state: Option<StateId>,
    final_state: Option<StateId>,
}

impl WorkflowBuilder {
    /// Creates an empty builder for the given workflow id.
    pub fn new(id: impl Into<WorkflowId>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            states: Vec::new(),
            actions: Vec::new(),
            records: Vec::new(),
            initial_state: None,
            final_state: None,
        }
    }

    /// Sets the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a state.
    pub fn state(mut self, state: State) -> Self {
        self.states.push(state);
        self
    }

    /// Adds a grouped action.
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Adds a flattened action record.
    pub fn record(mut self, record: ActionRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Sets the initial state by id.
    pub fn initial_state(mut self, id: impl Into<StateId>) -> Self {
        self.initial_state = Some(id.into());
        self
    }

    /// Sets the final state by id.
    pub fn final_state(mut self, id: impl Into<StateId>) -> Self {
        self.final_state = Some(id.into());
        self
    }

    /// Assembles the definition without validating it.
    pub fn definition(self) -> Result<WorkflowDefinition, WorkflowError> {
        let initial_state_id = self
            .initial_state
            .or_else(|| self.states.iter().find(|s| s.is_initial).map(|s| s.id))
            .ok_or_else(|| {
                WorkflowError::Configuration("Initial state must be specified".to_string())
            })?;
        let final_state_id = self
            .final_state
            .or_else(|| self.states.iter().find(|s| s.is_final).map(|s| s.id))
            .ok_or_else(|| {
                WorkflowError::Configuration("Final state must be specified".to_string())
            })?;

        let mut actions = flatten(self.actions)?;
        actions.extend(self.records);

        Ok(WorkflowDefinition {
            id: self.id,
            name: self.name,
            states: self.states,
            actions,
            initial_state_id,
            final_state_id,
        })
    }

    /// Builds and validates the workflow.
    pub fn build(self) -> Result<Workflow, WorkflowError> {
        Workflow::from_definition(self.definition()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn review_builder() -> WorkflowBuilder {
        Workflow::builder(1)
            .name("Document review")
            .state(State::new(1, "Draft").initial())
            .state(State::new(2, "Review"))
            .state(State::new(3, "Done").terminal())
            .action(Action::new(10, "submit", [1], 2))
            .action(Action::new(11, "approve", [2], 3))
    }

    fn review() -> Workflow {
        review_builder().build().expect("valid workflow")
    }

    #[test]
    fn test_workflow_starts_at_initial_state() {
        let workflow = review();
        assert_eq!(workflow.current_state_id(), StateId::new(1));
        assert!(workflow.history().is_empty());
        assert!(!workflow.is_complete());
    }

    #[test]
    fn test_review_scenario() {
        let mut workflow = review();

        workflow.execute(ActionId::new(10)).expect("submit");
        assert_eq!(workflow.current_state_id(), StateId::new(2));
        assert_eq!(workflow.history(), &[StateId::new(2)]);

        workflow.execute(ActionId::new(11)).expect("approve");
        assert_eq!(workflow.current_state_id(), StateId::new(3));
        assert_eq!(workflow.history(), &[StateId::new(2), StateId::new(3)]);
        assert!(workflow.is_complete());

        let result = workflow.execute(ActionId::new(10));
        assert_eq!(
            result,
            Err(WorkflowError::ActionNotApplicable {
                action: ActionId::new(10),
                current: StateId::new(3),
            })
        );
        assert_eq!(workflow.history().len(), 2);
    }

    #[test]
    fn test_action_from_final_state_fails_creation() {
        let result = review_builder()
            .action(Action::new(12, "reopen", [3], 1))
            .build();
        assert_eq!(
            result.map(|w| w.id()),
            Err(WorkflowError::ActionFromFinalState(ActionId::new(12)))
        );
    }

    #[test]
    fn test_disabled_target_blocks_until_reenabled() {
        let mut workflow = review();
        workflow
            .toggle_state(StateId::new(2), false)
            .expect("state exists");

        assert_eq!(
            workflow.execute(ActionId::new(10)),
            Err(WorkflowError::TargetStateDisabled {
                action: ActionId::new(10),
                state: StateId::new(2),
            })
        );
        assert_eq!(workflow.current_state_id(), StateId::new(1));

        workflow
            .toggle_state(StateId::new(2), true)
            .expect("state exists");
        workflow.execute(ActionId::new(10)).expect("enabled again");
        assert_eq!(workflow.current_state_id(), StateId::new(2));
    }

    #[test]
    fn test_add_state_rejects_duplicates_and_flags() {
        let mut workflow = review();
        let before = workflow.clone();

        assert_eq!(
            workflow.add_state(State::new(2, "Second review")),
            Err(WorkflowError::DuplicateStateId(StateId::new(2)))
        );
        assert!(matches!(
            workflow.add_state(State::new(4, "Restart").initial()),
            Err(WorkflowError::ConflictingStateFlags { .. })
        ));
        assert_eq!(workflow, before);

        workflow
            .add_state(State::new(4, "Archived"))
            .expect("fresh id");
        assert_eq!(workflow.states().len(), 4);
    }

    #[test]
    fn test_add_action_extends_sources() {
        let mut workflow = review();
        workflow
            .add_state(State::new(4, "Rework"))
            .expect("fresh id");

        let action = workflow
            .add_action(ActionRecord::new(10, "submit", 4, 2))
            .expect("same target");
        assert_eq!(action.from_state_ids.len(), 2);

        let action = workflow
            .add_action(ActionRecord::new(13, "send back", 2, 4))
            .expect("new action");
        assert_eq!(action, &Action::new(13, "send back", [2], 4));

        assert_eq!(
            workflow.add_action(ActionRecord::new(10, "submit", 4, 3)),
            Err(WorkflowError::ConflictingActionDefinition(ActionId::new(10)))
        );
    }

    #[test]
    fn test_definition_requires_known_initial_and_final() {
        let result = Workflow::builder(1)
            .state(State::new(1, "Only"))
            .initial_state(1)
            .final_state(5)
            .build();
        assert_eq!(
            result.map(|w| w.id()),
            Err(WorkflowError::UnknownFinalState(StateId::new(5)))
        );

        let result = Workflow::builder(1)
            .state(State::new(1, "Only"))
            .initial_state(4)
            .final_state(1)
            .build();
        assert_eq!(
            result.map(|w| w.id()),
            Err(WorkflowError::UnknownInitialState(StateId::new(4)))
        );
    }

    #[test]
    fn test_second_initial_flag_is_rejected() {
        let result = review_builder()
            .state(State::new(4, "Another start").initial())
            .build();
        assert_eq!(
            result.map(|w| w.id()),
            Err(WorkflowError::ConflictingStateFlags {
                state: StateId::new(4),
                details: "flagged initial but the workflow starts at 1".to_string(),
            })
        );
    }

    #[test]
    fn test_declared_states_get_flags() {
        let workflow = Workflow::builder(2)
            .state(State::new(1, "Open"))
            .state(State::new(2, "Closed"))
            .initial_state(1)
            .final_state(2)
            .build()
            .expect("valid workflow");
        assert!(workflow.states().get(StateId::new(1)).is_some_and(|s| s.is_initial));
        assert!(workflow.states().get(StateId::new(2)).is_some_and(|s| s.is_final));
    }

    #[test]
    fn test_builder_requires_initial_state() {
        let result = Workflow::builder(1).state(State::new(1, "Loose")).build();
        assert_eq!(
            result.map(|w| w.id()),
            Err(WorkflowError::Configuration(
                "Initial state must be specified".to_string()
            ))
        );
    }

    #[test]
    fn test_available_actions() {
        let mut workflow = review();
        let ids: Vec<_> = workflow.available_actions().map(|a| a.id).collect();
        assert_eq!(ids, vec![ActionId::new(10)]);

        workflow.execute(ActionId::new(10)).expect("submit");
        let ids: Vec<_> = workflow.available_actions().map(|a| a.id).collect();
        assert_eq!(ids, vec![ActionId::new(11)]);
    }

    #[test]
    fn test_persisted_form() {
        let workflow = review();
        let json = serde_json::to_value(&workflow).expect("serialize");
        assert_eq!(json["currentStateId"], 1);
        assert_eq!(json["states"]["2"]["name"], "Review");
        assert_eq!(json["actions"]["10"]["fromStateIds"], serde_json::json!([1]));

        let back: Workflow = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, workflow);
    }

    proptest! {
        #[test]
        fn history_tracks_every_successful_execution(
            picks in prop::collection::vec(prop::sample::select(vec![10i64, 11, 12, 13]), 0..24),
        ) {
            let mut workflow = Workflow::builder(1)
                .state(State::new(1, "Draft").initial())
                .state(State::new(2, "Review"))
                .state(State::new(3, "Rework"))
                .state(State::new(4, "Done").terminal())
                .action(Action::new(10, "submit", [1, 3], 2))
                .action(Action::new(11, "send back", [2], 3))
                .action(Action::new(12, "approve", [2], 4))
                .action(Action::new(13, "restart", [2, 3], 1))
                .build()
                .expect("valid workflow");

            for pick in picks {
                let before = workflow.clone();
                let applicable = workflow
                    .action(ActionId::new(pick))
                    .is_some_and(|a| a.fires_from(workflow.current_state_id()));

                match workflow.execute(ActionId::new(pick)) {
                    Ok(transition) => {
                        prop_assert!(applicable);
                        prop_assert_eq!(workflow.history().len(), before.history().len() + 1);
                        prop_assert_eq!(workflow.history().last().copied(), Some(transition.to));
                        prop_assert_eq!(workflow.current_state_id(), transition.to);
                    }
                    Err(error) => {
                        prop_assert!(!applicable);
                        let is_not_applicable =
                            matches!(error, WorkflowError::ActionNotApplicable { .. });
                        prop_assert!(is_not_applicable);
                        prop_assert_eq!(&workflow, &before);
                    }
                }
            }
        }
    }
}
