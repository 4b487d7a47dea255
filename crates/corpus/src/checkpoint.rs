//! Checkpoint persistence for resumable batch stages.
//!
//! Enrichment and upload both run for hours against rate-limited services;
//! progress is persisted after every batch so a crash loses at most one
//! batch of work. The store is abstract so tests run against memory and
//! production against a JSON file.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;

use lexrag_core::{AppError, AppResult};

/// Persisted state for one resumable stage.
#[async_trait::async_trait]
pub trait CheckpointStore<S>: Send + Sync
where
    S: Serialize + DeserializeOwned + Send + Sync,
{
    /// Load the last saved state, or `None` when no checkpoint exists.
    async fn load(&self) -> AppResult<Option<S>>;

    /// Persist the current state, replacing any previous checkpoint.
    async fn save(&self, state: &S) -> AppResult<()>;
}

/// File-backed checkpoint store (JSON).
#[derive(Debug, Clone)]
pub struct FileCheckpoint<S> {
    path: PathBuf,
    _marker: PhantomData<fn() -> S>,
}

impl<S> FileCheckpoint<S> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl<S> CheckpointStore<S> for FileCheckpoint<S>
where
    S: Serialize + DeserializeOwned + Send + Sync,
{
    async fn load(&self) -> AppResult<Option<S>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path).await?;
        let state = serde_json::from_str(&data)
            .map_err(|e| AppError::Serialization(format!("Corrupt checkpoint file: {}", e)))?;
        Ok(Some(state))
    }

    async fn save(&self, state: &S) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let serialized = serde_json::to_string(state)?;
        fs::write(&self.path, serialized).await?;
        Ok(())
    }
}

/// In-memory checkpoint store for tests.
#[derive(Debug, Default)]
pub struct MemoryCheckpoint {
    slot: Mutex<Option<String>>,
}

impl MemoryCheckpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any state has been saved.
    pub fn has_state(&self) -> bool {
        self.slot.lock().expect("checkpoint lock poisoned").is_some()
    }
}

#[async_trait::async_trait]
impl<S> CheckpointStore<S> for MemoryCheckpoint
where
    S: Serialize + DeserializeOwned + Send + Sync,
{
    async fn load(&self) -> AppResult<Option<S>> {
        let slot = self.slot.lock().expect("checkpoint lock poisoned");
        match slot.as_deref() {
            Some(data) => Ok(Some(serde_json::from_str(data)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, state: &S) -> AppResult<()> {
        let serialized = serde_json::to_string(state)?;
        *self.slot.lock().expect("checkpoint lock poisoned") = Some(serialized);
        Ok(())
    }
}
