//! Durable storage for workflows.

use crate::error::StoreError;
use async_trait::async_trait;
use meguri_core::{Workflow, WorkflowId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// Every stored workflow, keyed by id.
pub type WorkflowMap = BTreeMap<WorkflowId, Workflow>;

/// Persistence seam used by [`WorkflowService`](crate::WorkflowService).
///
/// The service loads everything once at startup and writes everything back
/// after each successful mutation.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Loads every persisted workflow. Missing data yields an empty map.
    async fn load_all(&self) -> Result<WorkflowMap, StoreError>;

    /// Replaces the persisted workflows with `workflows`.
    async fn save_all(&self, workflows: &WorkflowMap) -> Result<(), StoreError>;
}

/// Stores all workflows in a single pretty-printed JSON file.
///
/// Writes go to a sibling `.tmp` file which is then renamed over the target,
/// so an interrupted write never leaves a truncated file behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl WorkflowStore for JsonFileStore {
    async fn load_all(&self) -> Result<WorkflowMap, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No workflow file at {}, starting empty", self.path.display());
                return Ok(WorkflowMap::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        if contents.trim().is_empty() {
            return Ok(WorkflowMap::new());
        }

        let workflows: WorkflowMap =
            serde_json::from_str(&contents).map_err(|e| StoreError::Corrupted(e.to_string()))?;
        debug!(
            "Loaded {} workflows from {}",
            workflows.len(),
            self.path.display()
        );
        Ok(workflows)
    }

    async fn save_all(&self, workflows: &WorkflowMap) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(workflows).map_err(StoreError::Serialization)?;

        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!(
            "Saved {} workflows to {}",
            workflows.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Keeps the persisted copy in memory.
///
/// Saves can be made to fail with [`MemoryStore::fail_saves`], which is how
/// unconfirmed writes are exercised in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<WorkflowMap>,
    failing: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store preloaded with `workflows`.
    pub fn with_workflows(workflows: impl IntoIterator<Item = Workflow>) -> Self {
        Self {
            data: RwLock::new(workflows.into_iter().map(|w| (w.id(), w)).collect()),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes subsequent saves fail (`true`) or succeed (`false`).
    pub fn fail_saves(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns a copy of what was last saved.
    pub async fn snapshot(&self) -> WorkflowMap {
        self.data.read().await.clone()
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn load_all(&self) -> Result<WorkflowMap, StoreError> {
        Ok(self.data.read().await.clone())
    }

    async fn save_all(&self, workflows: &WorkflowMap) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("saves are disabled".to_string()));
        }
        *self.data.write().await = workflows.clone();
        Ok(())
    }
}
