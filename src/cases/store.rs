//! Append-only case repository backed by a single JSON file
//!
//! The file holds a JSON array of case records in save order. Every append
//! is a read-modify-write performed under the sibling `<store>.lock` file,
//! and the new contents replace the old by renaming a temporary file written
//! in the same directory, so readers never see a half-written store.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::lock::StoreLock;
use super::record::CaseRecord;
use crate::error::{PcgError, Result};

/// Default time to wait for another session's lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(5000);

/// Locks older than this are assumed abandoned
pub const STALE_LOCK_AGE: Duration = Duration::from_secs(30);

/// Persistent collection of case records
pub trait CaseRepository {
    /// Add a record to the end of the collection
    fn append(&self, record: CaseRecord) -> Result<()>;

    /// All records, most recent first
    fn list_all(&self) -> Result<Vec<CaseRecord>>;
}

/// File-backed [`CaseRepository`]
#[derive(Debug, Clone)]
pub struct JsonCaseStore {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl JsonCaseStore {
    /// Open the store at `path`, creating an empty collection if missing
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut lock_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        lock_name.push(".lock");
        let store = Self {
            lock_path: path.with_file_name(lock_name),
            path,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        };

        if !store.path.exists() {
            let dir = store.directory();
            fs::create_dir_all(&dir).map_err(|e| PcgError::StoreWrite {
                path: dir.clone(),
                source: e,
            })?;
            let _lock = store.lock()?;
            if !store.path.exists() {
                store.persist(&[])?;
                tracing::info!(store = %store.path.display(), "created empty case store");
            }
        }

        Ok(store)
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    fn directory(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn lock(&self) -> Result<StoreLock> {
        StoreLock::acquire(&self.lock_path, self.lock_timeout, STALE_LOCK_AGE)
    }

    /// Read the stored array in save order
    fn load(&self) -> Result<Vec<CaseRecord>> {
        let body = match fs::read_to_string(&self.path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PcgError::StoreRead {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&body).map_err(|e| PcgError::StoreCorrupt {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Atomically replace the store with `records`
    fn persist(&self, records: &[CaseRecord]) -> Result<()> {
        let write_err = |source| PcgError::StoreWrite {
            path: self.path.clone(),
            source,
        };
        let body = serde_json::to_vec_pretty(records)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".cases")
            .suffix(".tmp")
            .tempfile_in(self.directory())
            .map_err(write_err)?;
        tmp.write_all(&body).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

impl CaseRepository for JsonCaseStore {
    fn append(&self, record: CaseRecord) -> Result<()> {
        let _lock = self.lock()?;
        let mut records = self.load()?;
        records.push(record);
        self.persist(&records)?;
        tracing::info!(
            store = %self.path.display(),
            total = records.len(),
            "saved case"
        );
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<CaseRecord>> {
        let mut records = self.load()?;
        records.reverse();
        Ok(records)
    }
}
