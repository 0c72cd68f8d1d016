use crate::definition::QName;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Journal error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Journal error: malformed journal: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Journal error: journal task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// An active deployable and the contribution providing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub deployable: QName,
    pub contribution: String,
    pub recorded_at: DateTime<Utc>,
}

/// Durable record of active deployables, replayed at restart
///
/// Implementations may block. The domain calls them on the blocking pool.
pub trait DomainJournal: Send + Sync {
    /// Record `deployable` as active, replacing an earlier entry for it
    fn record(&self, deployable: &QName, contribution: &str) -> Result<(), JournalError>;

    fn forget(&self, deployable: &QName) -> Result<(), JournalError>;

    /// Entries in recording order
    fn load_all(&self) -> Result<Vec<JournalEntry>, JournalError>;
}

fn upsert(entries: &mut Vec<JournalEntry>, deployable: &QName, contribution: &str) {
    entries.retain(|e| &e.deployable != deployable);
    entries.push(JournalEntry {
        deployable: deployable.clone(),
        contribution: contribution.to_string(),
        recorded_at: Utc::now(),
    });
}

#[derive(Debug, Default)]
pub struct InMemoryJournal {
    entries: Mutex<Vec<JournalEntry>>,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainJournal for InMemoryJournal {
    fn record(&self, deployable: &QName, contribution: &str) -> Result<(), JournalError> {
        upsert(&mut self.entries.lock(), deployable, contribution);
        Ok(())
    }

    fn forget(&self, deployable: &QName) -> Result<(), JournalError> {
        self.entries.lock().retain(|e| &e.deployable != deployable);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<JournalEntry>, JournalError> {
        Ok(self.entries.lock().clone())
    }
}

/// Journal persisted as a JSON array
///
/// Every change rewrites the file through a temporary sibling and a rename,
/// so a crash leaves either the old or the new journal.
#[derive(Debug)]
pub struct FileJournal {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<JournalEntry>, JournalError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write(&self, entries: &[JournalEntry]) -> Result<(), JournalError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp = self.path.with_extension("tmp");
        fs::write(&temp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&temp, &self.path)?;
        debug!(path = %self.path.display(), entries = entries.len(), "Wrote domain journal");
        Ok(())
    }
}

impl DomainJournal for FileJournal {
    fn record(&self, deployable: &QName, contribution: &str) -> Result<(), JournalError> {
        let _guard = self.lock.lock();
        let mut entries = self.read()?;
        upsert(&mut entries, deployable, contribution);
        self.write(&entries)
    }

    fn forget(&self, deployable: &QName) -> Result<(), JournalError> {
        let _guard = self.lock.lock();
        let mut entries = self.read()?;
        let before = entries.len();
        entries.retain(|e| &e.deployable != deployable);
        if entries.len() == before {
            return Ok(());
        }
        self.write(&entries)
    }

    fn load_all(&self) -> Result<Vec<JournalEntry>, JournalError> {
        let _guard = self.lock.lock();
        self.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn name(local: &str) -> QName {
        QName::new("urn:test", local)
    }

    #[test]
    fn test_in_memory_record_replaces() {
        let journal = InMemoryJournal::new();
        journal.record(&name("bar"), "test").unwrap();
        journal.record(&name("baz"), "test").unwrap();
        journal.record(&name("bar"), "other").unwrap();

        let entries = journal.load_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].deployable, name("bar"));
        assert_eq!(entries[1].contribution, "other");

        journal.forget(&name("bar")).unwrap();
        assert_eq!(journal.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_file_journal_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("journal.json");

        let journal = FileJournal::new(&path);
        assert!(journal.load_all().unwrap().is_empty());
        journal.record(&name("bar"), "test").unwrap();
        journal.record(&name("baz"), "test").unwrap();
        journal.forget(&name("baz")).unwrap();

        let reopened = FileJournal::new(&path);
        let entries = reopened.load_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].deployable, name("bar"));
        assert_eq!(entries[0].contribution, "test");
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileJournal::new(&path).load_all(),
            Err(JournalError::Serialization(_))
        ));
    }
}
