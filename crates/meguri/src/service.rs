//! The owned, serialized workflow store.

use crate::error::ServiceError;
use crate::store::{WorkflowMap, WorkflowStore};
use meguri_core::{
    Action, ActionId, ActionRecord, State, StateId, Workflow, WorkflowDefinition, WorkflowError,
    WorkflowId,
};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Owns every workflow of the process and serializes access to them.
///
/// Mutations take the write lock, apply the change to a copy of the target
/// workflow, install it, and flush the whole map to the store before the lock
/// is released. Reads take the read lock and return owned snapshots, so they
/// never observe a half-applied change.
///
/// # Examples
///
/// ```
/// use meguri::{MemoryStore, WorkflowService};
/// use meguri::prelude::*;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let service = WorkflowService::open(Arc::new(MemoryStore::new())).await?;
///
/// let definition = Workflow::builder(1)
///     .state(State::new(1, "Draft").initial())
///     .state(State::new(2, "Done").terminal())
///     .action(Action::new(10, "finish", [1], 2))
///     .definition()?;
/// service.create(definition).await?;
///
/// let workflow = service.execute(1.into(), 10.into()).await?;
/// assert!(workflow.is_complete());
/// # Ok::<(), ServiceError>(())
/// # }).unwrap();
/// ```
pub struct WorkflowService {
    workflows: RwLock<WorkflowMap>,
    store: Arc<dyn WorkflowStore>,
}

impl fmt::Debug for WorkflowService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowService").finish_non_exhaustive()
    }
}

impl WorkflowService {
    /// Loads every persisted workflow from `store`.
    ///
    /// Fails if the persisted data cannot be read or decoded.
    pub async fn open(store: Arc<dyn WorkflowStore>) -> Result<Self, ServiceError> {
        let workflows = store.load_all().await?;
        info!("Workflow service opened with {} workflows", workflows.len());
        Ok(Self {
            workflows: RwLock::new(workflows),
            store,
        })
    }

    /// Validates and stores a new workflow.
    pub async fn create(&self, definition: WorkflowDefinition) -> Result<Workflow, ServiceError> {
        let mut workflows = self.workflows.write().await;

        let id = definition.id;
        if workflows.contains_key(&id) {
            warn!("Workflow {} rejected: id already exists", id);
            return Err(ServiceError::DuplicateWorkflowId(id));
        }

        let workflow = Workflow::from_definition(definition).map_err(|e| {
            warn!("Workflow {} rejected: {}", id, e);
            e
        })?;

        workflows.insert(id, workflow.clone());
        self.flush(&workflows, id).await?;

        info!(
            "Workflow {} '{}' created with {} states and {} actions",
            id,
            workflow.name(),
            workflow.states().len(),
            workflow.actions().count()
        );
        Ok(workflow)
    }

    /// Returns every workflow in ascending id order.
    pub async fn list(&self) -> Vec<Workflow> {
        self.workflows.read().await.values().cloned().collect()
    }

    /// Returns the workflow with the given id, if any.
    pub async fn get(&self, id: WorkflowId) -> Option<Workflow> {
        self.workflows.read().await.get(&id).cloned()
    }

    /// Fires `action_id` on the workflow and returns the updated workflow.
    pub async fn execute(
        &self,
        id: WorkflowId,
        action_id: ActionId,
    ) -> Result<Workflow, ServiceError> {
        self.mutate(id, "execute", |workflow| {
            let transition = workflow.execute(action_id)?;
            info!(
                "Workflow {} moved from state {} to {} via action {}",
                id, transition.from, transition.to, transition.action
            );
            Ok(())
        })
        .await
    }

    /// Adds a state to the workflow.
    pub async fn add_state(&self, id: WorkflowId, state: State) -> Result<Workflow, ServiceError> {
        self.mutate(id, "add state", |workflow| workflow.add_state(state))
            .await
    }

    /// Enables or disables one of the workflow's states.
    pub async fn toggle_state(
        &self,
        id: WorkflowId,
        state_id: StateId,
        enabled: bool,
    ) -> Result<Workflow, ServiceError> {
        self.mutate(id, "toggle state", |workflow| {
            workflow.toggle_state(state_id, enabled)
        })
        .await
    }

    /// Adds an action, or one more source state of an existing action.
    pub async fn add_action(
        &self,
        id: WorkflowId,
        record: ActionRecord,
    ) -> Result<Workflow, ServiceError> {
        self.mutate(id, "add action", |workflow| {
            workflow.add_action(record).map(|_| ())
        })
        .await
    }

    /// Actions that would currently succeed on the workflow.
    pub async fn available_actions(&self, id: WorkflowId) -> Result<Vec<Action>, ServiceError> {
        let workflows = self.workflows.read().await;
        let workflow = workflows
            .get(&id)
            .ok_or(ServiceError::WorkflowNotFound(id))?;
        Ok(workflow.available_actions().cloned().collect())
    }

    async fn mutate<F>(&self, id: WorkflowId, operation: &str, apply: F) -> Result<Workflow, ServiceError>
    where
        F: FnOnce(&mut Workflow) -> Result<(), WorkflowError>,
    {
        let mut workflows = self.workflows.write().await;

        let mut workflow = workflows
            .get(&id)
            .cloned()
            .ok_or(ServiceError::WorkflowNotFound(id))?;

        if let Err(e) = apply(&mut workflow) {
            warn!("Workflow {} {} rejected: {}", id, operation, e);
            return Err(e.into());
        }

        workflows.insert(id, workflow.clone());
        self.flush(&workflows, id).await?;
        Ok(workflow)
    }

    async fn flush(&self, workflows: &WorkflowMap, id: WorkflowId) -> Result<(), ServiceError> {
        self.store.save_all(workflows).await.map_err(|source| {
            warn!("Workflow {} change could not be persisted: {}", id, source);
            ServiceError::Unconfirmed {
                workflow: id,
                source,
            }
        })
    }
}
