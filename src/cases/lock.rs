//! Exclusive lock file guarding the case store's read-modify-write
//!
//! The lock is a sibling file created with create-new semantics. It records
//! the owning process and acquisition time so a lock left behind by a
//! crashed session can be recognised and broken.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PcgError, Result};

const RETRY_INTERVAL: Duration = Duration::from_millis(25);

static ASIDE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Lock file content structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LockFileContent {
    pid: u32,
    acquired_at: DateTime<Utc>,
}

/// Held lock; the file is removed on drop if it is still ours
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    owner: LockFileContent,
}

impl StoreLock {
    /// Acquire the lock at `path`, waiting up to `timeout`
    ///
    /// A lock older than `stale_after` is moved aside and acquisition
    /// retried. Only the session whose rename captured the exact content it
    /// judged stale discards it; anything else is put back.
    pub fn acquire(path: &Path, timeout: Duration, stale_after: Duration) -> Result<Self> {
        let started = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    let owner = LockFileContent {
                        pid: std::process::id(),
                        acquired_at: Utc::now(),
                    };
                    record_owner(&mut file, path, &owner)?;
                    tracing::debug!(lock = %path.display(), "acquired case store lock");
                    return Ok(Self {
                        path: path.to_path_buf(),
                        owner,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    let observed = match fs::read(path) {
                        Ok(body) => body,
                        Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                        Err(e) => return Err(write_error(path, e)),
                    };
                    if lock_age(path, &observed).is_some_and(|age| age > stale_after) {
                        break_stale(path, &observed)?;
                        continue;
                    }
                    if started.elapsed() >= timeout {
                        return Err(PcgError::StoreLocked {
                            path: path.to_path_buf(),
                        });
                    }
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => return Err(write_error(path, e)),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let current = fs::read(&self.path)
            .ok()
            .and_then(|body| serde_json::from_slice::<LockFileContent>(&body).ok());
        if current.as_ref() != Some(&self.owner) {
            tracing::warn!(lock = %self.path.display(), "case store lock no longer ours, leaving it");
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(lock = %self.path.display(), error = %e, "failed to release case store lock");
        }
    }
}

fn write_error(path: &Path, source: io::Error) -> PcgError {
    PcgError::StoreWrite {
        path: path.to_path_buf(),
        source,
    }
}

/// Write the owner record into a freshly created lock file
///
/// On failure the half-written file is removed so it cannot block later
/// sessions until it turns stale.
fn record_owner<W: Write>(file: &mut W, path: &Path, owner: &LockFileContent) -> Result<()> {
    let written = serde_json::to_vec(owner)
        .map_err(PcgError::from)
        .and_then(|body| file.write_all(&body).map_err(|e| write_error(path, e)));
    if written.is_err() {
        let _ = fs::remove_file(path);
    }
    written
}

/// Move a stale lock out of the way if it still holds `observed`
///
/// The rename is atomic, so at most one session captures any given lock
/// file. A capture whose content differs from `observed` is a live lock
/// created after the inspection and is linked back without overwriting.
fn break_stale(path: &Path, observed: &[u8]) -> Result<()> {
    let aside = aside_path(path);
    match fs::rename(path, &aside) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(write_error(path, e)),
    }

    let captured = fs::read(&aside).map_err(|e| write_error(&aside, e))?;
    if captured == observed {
        tracing::warn!(lock = %path.display(), "broke stale case store lock");
    } else {
        match fs::hard_link(&aside, path) {
            Ok(()) => tracing::debug!(lock = %path.display(), "restored live case store lock"),
            Err(e) => {
                tracing::warn!(lock = %path.display(), error = %e, "could not restore live case store lock")
            }
        }
    }
    fs::remove_file(&aside).map_err(|e| write_error(&aside, e))
}

/// Unique sibling name for a lock being moved aside
fn aside_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(
        ".stale-{}-{}",
        std::process::id(),
        ASIDE_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    path.with_file_name(name)
}

/// Age of a lock from its recorded time, or else the file's mtime
fn lock_age(path: &Path, body: &[u8]) -> Option<Duration> {
    if let Ok(content) = serde_json::from_slice::<LockFileContent>(body) {
        return (Utc::now() - content.acquired_at).to_std().ok();
    }
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
}
