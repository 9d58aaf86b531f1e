//! Service and storage error types.

use meguri_core::{WorkflowError, WorkflowId};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a [`WorkflowStore`](crate::WorkflowStore).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("Storage I/O failed at {}: {source}", .path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The workflows could not be encoded.
    #[error("Failed to serialize workflows: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Persisted data exists but cannot be decoded.
    #[error("Stored workflows are corrupted: {0}")]
    Corrupted(String),

    /// The store refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by [`WorkflowService`](crate::WorkflowService) operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ServiceError {
    /// No workflow with this id is stored.
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(WorkflowId),

    /// A workflow with this id is already stored.
    #[error("Workflow id {0} already exists")]
    DuplicateWorkflowId(WorkflowId),

    /// The request could not be turned into a workflow definition.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The request violated the workflow's structure.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Loading the persisted workflows failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The change was applied in memory but could not be persisted.
    ///
    /// The in-memory workflow reflects the change; whether it survives a
    /// restart is unknown.
    #[error("Workflow {workflow} was updated but could not be persisted: {source}")]
    Unconfirmed {
        /// The workflow whose change is unconfirmed.
        workflow: WorkflowId,
        /// Why the flush failed.
        #[source]
        source: StoreError,
    },
}
