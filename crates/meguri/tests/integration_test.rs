use meguri::prelude::*;
use meguri::{CreateWorkflowRequest, MemoryStore, StoreError};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn review_request() -> CreateWorkflowRequest {
    serde_json::from_value(serde_json::json!({
        "id": 1,
        "name": "Document review",
        "states": [
            { "id": 1, "name": "Draft", "isInitial": true },
            { "id": 2, "name": "Review" },
            { "id": 3, "name": "Done", "isFinal": true }
        ],
        "actions": [
            { "id": 10, "name": "submit", "fromStateIds": [1], "toStateId": 2 },
            { "id": 11, "name": "approve", "fromStateIds": [2], "toStateId": 3 }
        ],
        "initialStateId": 1,
        "finalStateId": 3
    }))
    .expect("valid request")
}

async fn open_memory() -> WorkflowService {
    WorkflowService::open(Arc::new(MemoryStore::new()))
        .await
        .expect("open service")
}

#[tokio::test]
async fn test_review_scenario() {
    let service = open_memory().await;
    let definition = review_request().into_definition().expect("definition");
    assert_ok!(service.create(definition).await);

    let id = WorkflowId::new(1);
    let workflow = assert_ok!(service.execute(id, ActionId::new(10)).await);
    assert_eq!(workflow.current_state_id(), StateId::new(2));
    assert_eq!(workflow.history(), &[StateId::new(2)]);

    let workflow = assert_ok!(service.execute(id, ActionId::new(11)).await);
    assert_eq!(workflow.current_state_id(), StateId::new(3));
    assert_eq!(workflow.history(), &[StateId::new(2), StateId::new(3)]);

    let error = assert_err!(service.execute(id, ActionId::new(10)).await);
    assert!(matches!(
        error,
        ServiceError::Workflow(WorkflowError::ActionNotApplicable { current, .. })
            if current == StateId::new(3)
    ));
}

#[tokio::test]
async fn test_extend_workflow_after_creation() {
    let service = open_memory().await;
    let definition = review_request().into_definition().expect("definition");
    assert_ok!(service.create(definition).await);
    let id = WorkflowId::new(1);

    assert_ok!(service.add_state(id, State::new(4, "Rework")).await);
    let error = assert_err!(service.add_state(id, State::new(4, "Rework again")).await);
    assert!(matches!(
        error,
        ServiceError::Workflow(WorkflowError::DuplicateStateId(_))
    ));

    assert_ok!(
        service
            .add_action(id, ActionRecord::new(12, "send back", 2, 4))
            .await
    );
    let workflow = assert_ok!(
        service
            .add_action(id, ActionRecord::new(10, "submit", 4, 2))
            .await
    );
    assert_eq!(
        workflow
            .action(ActionId::new(10))
            .map(|a| a.from_state_ids.len()),
        Some(2)
    );

    assert_ok!(service.execute(id, ActionId::new(10)).await);
    assert_ok!(service.execute(id, ActionId::new(12)).await);
    let workflow = assert_ok!(service.execute(id, ActionId::new(10)).await);
    assert_eq!(
        workflow.history(),
        &[StateId::new(2), StateId::new(4), StateId::new(2)]
    );
}

#[tokio::test]
async fn test_toggle_state_gates_execution() {
    let service = open_memory().await;
    let definition = review_request().into_definition().expect("definition");
    assert_ok!(service.create(definition).await);
    let id = WorkflowId::new(1);

    assert_ok!(service.toggle_state(id, StateId::new(2), false).await);
    let error = assert_err!(service.execute(id, ActionId::new(10)).await);
    assert!(matches!(
        error,
        ServiceError::Workflow(WorkflowError::TargetStateDisabled { .. })
    ));
    assert!(assert_ok!(service.available_actions(id).await).is_empty());

    assert_ok!(service.toggle_state(id, StateId::new(2), true).await);
    assert_ok!(service.execute(id, ActionId::new(10)).await);

    let error = assert_err!(service.toggle_state(id, StateId::new(9), true).await);
    assert!(matches!(
        error,
        ServiceError::Workflow(WorkflowError::StateNotFound(_))
    ));
}

#[tokio::test]
async fn test_json_store_survives_restart() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("workflows.json");

    {
        let service = WorkflowService::open(Arc::new(JsonFileStore::new(&path)))
            .await
            .expect("open service");
        let definition = review_request().into_definition().expect("definition");
        assert_ok!(service.create(definition).await);
        assert_ok!(service.execute(WorkflowId::new(1), ActionId::new(10)).await);
    }

    let service = WorkflowService::open(Arc::new(JsonFileStore::new(&path)))
        .await
        .expect("reopen service");
    let workflow = service.get(WorkflowId::new(1)).await.expect("persisted");
    assert_eq!(workflow.current_state_id(), StateId::new(2));
    assert_eq!(workflow.history(), &[StateId::new(2)]);
    assert_eq!(workflow.actions().count(), 2);
}

#[tokio::test]
async fn test_corrupted_store_fails_startup() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("workflows.json");
    std::fs::write(&path, "[1, 2").expect("write");

    let result = WorkflowService::open(Arc::new(JsonFileStore::new(&path))).await;
    assert!(matches!(
        result,
        Err(ServiceError::Store(StoreError::Corrupted(_)))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_executions_are_serialized() {
    let service = Arc::new(open_memory().await);
    let definition = review_request().into_definition().expect("definition");
    assert_ok!(service.create(definition).await);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .execute(WorkflowId::new(1), ActionId::new(10))
                .await
                .is_ok()
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.expect("task completed") {
            successes += 1;
        }
    }

    assert_eq!(successes, 1);
    let workflow = service.get(WorkflowId::new(1)).await.expect("stored");
    assert_eq!(workflow.history(), &[StateId::new(2)]);
}
