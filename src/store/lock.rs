// ABOUTME: Exclusive lock file serializing writers of a file-backed store.
// ABOUTME: Uses atomic create-new with holder info stored in the lock file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use super::StoreError;

/// How long to sleep between acquisition attempts.
const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Information about who holds a store lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub acquired_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn current() -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            acquired_at: Utc::now(),
        }
    }

    /// Check if this lock is older than `stale_after`.
    pub fn is_stale(&self, stale_after: Duration) -> bool {
        let age = Utc::now() - self.acquired_at;
        age.to_std().map(|age| age >= stale_after).unwrap_or(false)
    }

    /// Path of the lock file guarding `store_path`.
    pub fn lock_path(store_path: &Path) -> PathBuf {
        let mut name = store_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        store_path.with_file_name(name)
    }
}

/// A held store lock that releases on drop.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    /// Exact contents written on acquisition. Release only removes a lock
    /// file that still carries them.
    contents: String,
}

impl StoreLock {
    /// Acquire the lock guarding `store_path`, blocking up to `timeout`.
    ///
    /// Locks older than `stale_after` are broken with a warning. A lock file
    /// whose contents can't be read yet is treated as held until its
    /// modification time is older than `stale_after`. Breaking happens under
    /// a separate `.break` guard file and only removes the exact lock that
    /// was judged stale, so a lock re-acquired in the meantime survives.
    pub fn acquire(
        store_path: &Path,
        timeout: Duration,
        stale_after: Duration,
    ) -> Result<Self, StoreError> {
        let path = LockInfo::lock_path(store_path);
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).map_err(|source| StoreError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let deadline = Instant::now() + timeout;

        loop {
            match Self::try_create(&path)? {
                Some(lock) => return Ok(lock),
                None => {
                    if let Some(observed) = Self::stale_contents(&path, stale_after)
                        && Self::break_stale(&path, &observed, stale_after)
                    {
                        continue;
                    }
                }
            }

            if Instant::now() >= deadline {
                return Err(StoreError::Lock {
                    message: Self::describe_holder(&path),
                    path,
                });
            }
            std::thread::sleep(RETRY_INTERVAL);
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock.
    pub fn release(self) {
        drop(self);
    }

    fn try_create(path: &Path) -> Result<Option<Self>, StoreError> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(None),
            Err(source) => {
                return Err(StoreError::Write {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        // The lock is already ours; holder info is advisory.
        let contents = match serde_json::to_string(&LockInfo::current()) {
            Ok(json) if file.write_all(json.as_bytes()).is_ok() => json,
            _ => String::new(),
        };

        Ok(Some(Self {
            path: path.to_path_buf(),
            contents,
        }))
    }

    /// Contents of the lock file at `path` if the lock it describes is stale.
    fn stale_contents(path: &Path, stale_after: Duration) -> Option<String> {
        let contents = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<LockInfo>(&contents) {
            Ok(info) if info.is_stale(stale_after) => {
                tracing::warn!(
                    "Breaking stale store lock held by {} (pid {}) since {}",
                    info.holder,
                    info.pid,
                    info.acquired_at
                );
                Some(contents)
            }
            Ok(_) => None,
            Err(_) => match modified_age(path) {
                Some(age) if age >= stale_after => {
                    tracing::warn!("Store lock info unreadable and stale, breaking lock");
                    Some(contents)
                }
                _ => None,
            },
        }
    }

    /// Remove the lock at `path` if it still holds `observed`.
    ///
    /// Returns true when the stale lock was removed by this call.
    fn break_stale(path: &Path, observed: &str, stale_after: Duration) -> bool {
        let guard = break_guard_path(path);
        match OpenOptions::new().write(true).create_new(true).open(&guard) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                // A breaker that died mid-break leaves its guard behind.
                if modified_age(&guard).is_some_and(|age| age >= stale_after) {
                    let _ = fs::remove_file(&guard);
                }
                return false;
            }
            Err(e) => {
                tracing::debug!("Failed to create lock break guard {}: {}", guard.display(), e);
                return false;
            }
        }

        let broken = match fs::read_to_string(path) {
            Ok(current) if current == observed => {
                tracing::debug!("Removing stale store lock at {}", path.display());
                fs::remove_file(path).is_ok()
            }
            _ => false,
        };

        let _ = fs::remove_file(&guard);
        broken
    }

    fn read_info(path: &Path) -> Option<LockInfo> {
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn describe_holder(path: &Path) -> String {
        match Self::read_info(path) {
            Some(info) => format!(
                "held by {} (pid {}) since {}",
                info.holder, info.pid, info.acquired_at
            ),
            None => "held by another process".to_string(),
        }
    }
}

fn break_guard_path(lock_path: &Path) -> PathBuf {
    let mut name = lock_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".break");
    lock_path.with_file_name(name)
}

fn modified_age(path: &Path) -> Option<Duration> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    SystemTime::now().duration_since(modified).ok()
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        match fs::read_to_string(&self.path) {
            Ok(current) if current == self.contents => {}
            Ok(_) => {
                tracing::warn!(
                    "Store lock {} was taken over by another writer, leaving it in place",
                    self.path.display()
                );
                return;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return,
            Err(_) => {}
        }
        if let Err(e) = fs::remove_file(&self.path)
            && e.kind() != ErrorKind::NotFound
        {
            tracing::warn!("Failed to release store lock {}: {}", self.path.display(), e);
        }
    }
}
