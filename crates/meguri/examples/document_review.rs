//! Document review workflow driven through an in-memory service.
//!
//! Demonstrates:
//! - Building a workflow with a multi-source action
//! - Rejected transitions leaving the workflow untouched
//! - Disabling a state to block transitions into it

use meguri::prelude::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let service = WorkflowService::open(Arc::new(MemoryStore::new())).await?;

    let definition = Workflow::builder(1)
        .name("Document review")
        .state(State::new(1, "Draft").initial())
        .state(State::new(2, "Review"))
        .state(State::new(3, "Rework"))
        .state(State::new(4, "Done").terminal())
        .action(Action::new(10, "submit", [1, 3], 2))
        .action(Action::new(11, "request changes", [2], 3))
        .action(Action::new(12, "approve", [2], 4))
        .definition()?;
    service.create(definition).await?;

    let id = WorkflowId::new(1);
    for action in [10, 11, 10] {
        let workflow = service.execute(id, ActionId::new(action)).await?;
        println!(
            "action {} -> state {} (history {:?})",
            action,
            workflow.current_state_id(),
            workflow.history()
        );
    }

    service.toggle_state(id, StateId::new(4), false).await?;
    match service.execute(id, ActionId::new(12)).await {
        Ok(_) => println!("approved while Done was disabled?"),
        Err(e) => println!("rejected: {}", e),
    }

    service.toggle_state(id, StateId::new(4), true).await?;
    let workflow = service.execute(id, ActionId::new(12)).await?;
    println!(
        "approved: complete = {}, history {:?}",
        workflow.is_complete(),
        workflow.history()
    );

    match service.execute(id, ActionId::new(10)).await {
        Ok(_) => println!("left the final state?"),
        Err(e) => println!("rejected: {}", e),
    }

    Ok(())
}
