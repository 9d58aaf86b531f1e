//! Guarded execution of a single transition.

use crate::action::Action;
use crate::error::WorkflowError;
use crate::ids::{ActionId, StateId};
use crate::state::StateRegistry;
use std::collections::BTreeMap;

/// A transition that passed every guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// The action that fired.
    pub action: ActionId,
    /// The state the workflow left.
    pub from: StateId,
    /// The state the workflow entered.
    pub to: StateId,
}

/// Decides whether an action may fire from a given state.
#[derive(Debug, Clone, Copy)]
pub struct TransitionExecutor<'a> {
    states: &'a StateRegistry,
    actions: &'a BTreeMap<ActionId, Action>,
}

impl<'a> TransitionExecutor<'a> {
    /// Creates an executor over a workflow's states and actions.
    pub fn new(states: &'a StateRegistry, actions: &'a BTreeMap<ActionId, Action>) -> Self {
        Self { states, actions }
    }

    /// Resolves the transition `action_id` would perform from `current`.
    ///
    /// Guards are checked in order: the action must exist, `current` must be
    /// one of its sources, and its target must be enabled.
    pub fn resolve(&self, current: StateId, action_id: ActionId) -> Result<Transition, WorkflowError> {
        let action = self
            .actions
            .get(&action_id)
            .ok_or(WorkflowError::ActionNotFound(action_id))?;

        if !action.fires_from(current) {
            return Err(WorkflowError::ActionNotApplicable {
                action: action_id,
                current,
            });
        }

        if !self.states.is_enabled(action.to_state_id) {
            return Err(WorkflowError::TargetStateDisabled {
                action: action_id,
                state: action.to_state_id,
            });
        }

        Ok(Transition {
            action: action_id,
            from: current,
            to: action.to_state_id,
        })
    }

    /// Actions that would succeed from `current`, in ascending id order.
    pub fn available(&self, current: StateId) -> impl Iterator<Item = &'a Action> + 'a {
        let states = self.states;
        self.actions
            .values()
            .filter(move |a| a.fires_from(current) && states.is_enabled(a.to_state_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::State;

    fn fixture() -> (StateRegistry, BTreeMap<ActionId, Action>) {
        let states = StateRegistry::from_states([
            State::new(1, "Draft").initial(),
            State::new(2, "Review"),
            State::new(3, "Done").terminal(),
            State::new(4, "Rejected").disabled(),
        ])
        .expect("valid states");

        let actions = [
            Action::new(10, "submit", [1], 2),
            Action::new(11, "approve", [2], 3),
            Action::new(12, "reject", [2], 4),
        ]
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

        (states, actions)
    }

    #[test]
    fn test_resolve_success() {
        let (states, actions) = fixture();
        let executor = TransitionExecutor::new(&states, &actions);
        let transition = executor
            .resolve(StateId::new(1), ActionId::new(10))
            .expect("applicable");
        assert_eq!(
            transition,
            Transition {
                action: ActionId::new(10),
                from: StateId::new(1),
                to: StateId::new(2),
            }
        );
    }

    #[test]
    fn test_resolve_guards() {
        let (states, actions) = fixture();
        let executor = TransitionExecutor::new(&states, &actions);

        assert_eq!(
            executor.resolve(StateId::new(1), ActionId::new(99)),
            Err(WorkflowError::ActionNotFound(ActionId::new(99)))
        );
        assert_eq!(
            executor.resolve(StateId::new(1), ActionId::new(11)),
            Err(WorkflowError::ActionNotApplicable {
                action: ActionId::new(11),
                current: StateId::new(1),
            })
        );
        assert_eq!(
            executor.resolve(StateId::new(2), ActionId::new(12)),
            Err(WorkflowError::TargetStateDisabled {
                action: ActionId::new(12),
                state: StateId::new(4),
            })
        );
    }

    #[test]
    fn test_available_skips_disabled_targets() {
        let (states, actions) = fixture();
        let executor = TransitionExecutor::new(&states, &actions);
        let ids: Vec<_> = executor.available(StateId::new(2)).map(|a| a.id).collect();
        assert_eq!(ids, vec![ActionId::new(11)]);
        assert_eq!(executor.available(StateId::new(3)).count(), 0);
    }
}
