// ABOUTME: JSON file record store shared by independent processes.
// ABOUTME: Each operation locks, reads, applies and atomically replaces the file.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::deploy::Deployment;
use crate::types::DeploymentId;

use super::error::{CorruptSnafu, EncodeSnafu, ReadSnafu, WriteSnafu, WorkerSnafu};
use super::{DeploymentStore, Guard, Patch, StoreError, StoreLock, newest_first};

const FORMAT_VERSION: u32 = 1;

/// On-disk layout: a version tag and every row.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    deployments: Vec<Deployment>,
}

/// Store persisted as a single JSON document.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    lock_timeout: Duration,
    stale_lock_after: Duration,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: Duration::from_secs(5),
            stale_lock_after: Duration::from_secs(60),
        }
    }

    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn stale_lock_after(mut self, after: Duration) -> Self {
        self.stale_lock_after = after;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` against the loaded rows under the store lock.
    ///
    /// When `op` reports a change the file is rewritten before the lock is released.
    async fn with_rows<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Vec<Deployment>) -> Result<(T, bool), StoreError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            let lock = StoreLock::acquire(&store.path, store.lock_timeout, store.stale_lock_after)?;
            let mut file = store.load()?;
            let (value, changed) = op(&mut file.deployments)?;
            if changed {
                store.save(&file)?;
            }
            lock.release();
            Ok(value)
        })
        .await
        .context(WorkerSnafu)?
    }

    fn load(&self) -> Result<StoreFile, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(StoreFile {
                    version: FORMAT_VERSION,
                    deployments: Vec::new(),
                });
            }
            Err(e) => return Err(e).context(ReadSnafu { path: &self.path }),
        };

        if content.trim().is_empty() {
            return Ok(StoreFile {
                version: FORMAT_VERSION,
                deployments: Vec::new(),
            });
        }

        serde_json::from_str(&content).context(CorruptSnafu { path: &self.path })
    }

    fn save(&self, file: &StoreFile) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).context(WriteSnafu { path: &dir })?;

        let json = serde_json::to_vec_pretty(file).context(EncodeSnafu)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).context(WriteSnafu { path: &dir })?;
        tmp.write_all(&json)
            .and_then(|_| tmp.as_file().sync_all())
            .context(WriteSnafu { path: tmp.path() })?;
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .context(WriteSnafu { path: &self.path })?;

        tracing::debug!(
            "Wrote {} deployment(s) to {}",
            file.deployments.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[async_trait]
impl DeploymentStore for FileStore {
    async fn insert(&self, deployment: &Deployment) -> Result<(), StoreError> {
        let deployment = deployment.clone();
        self.with_rows(move |rows| {
            if rows.iter().any(|row| row.id == deployment.id) {
                return Err(StoreError::Duplicate { id: deployment.id });
            }
            rows.push(deployment);
            Ok(((), true))
        })
        .await
    }

    async fn get(&self, id: &DeploymentId) -> Result<Option<Deployment>, StoreError> {
        let id = *id;
        self.with_rows(move |rows| Ok((rows.iter().find(|row| row.id == id).cloned(), false)))
            .await
    }

    async fn list(&self) -> Result<Vec<Deployment>, StoreError> {
        let mut rows = self.with_rows(|rows| Ok((rows.clone(), false))).await?;
        newest_first(&mut rows);
        Ok(rows)
    }

    async fn update_if(
        &self,
        id: &DeploymentId,
        guard: &Guard,
        patch: &Patch,
    ) -> Result<Option<Deployment>, StoreError> {
        let id = *id;
        let guard = guard.clone();
        let patch = patch.clone();
        self.with_rows(move |rows| match rows.iter_mut().find(|row| row.id == id) {
            Some(row) if guard.matches(row) => {
                patch.apply(row);
                Ok((Some(row.clone()), true))
            }
            _ => Ok((None, false)),
        })
        .await
    }

    async fn delete(&self, id: &DeploymentId) -> Result<bool, StoreError> {
        let id = *id;
        self.with_rows(move |rows| {
            let before = rows.len();
            rows.retain(|row| row.id != id);
            let removed = rows.len() != before;
            Ok((removed, removed))
        })
        .await
    }
}
