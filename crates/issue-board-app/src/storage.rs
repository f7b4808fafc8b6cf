//! Persistence of the last filter set chosen for each view.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use issue_board_core::filter::PartialIssueFilters;
use issue_board_core::id::ProjectId;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::StoreError;

/// Kind of view a filter set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// Project issue list.
    Project,
    /// Cycle issue list.
    Cycle,
    /// Module issue list.
    Module,
    /// Saved project view.
    ProjectView,
    /// Issues on a member profile.
    Profile,
}

/// Slot a filter set is remembered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalFilterKey {
    /// View kind.
    pub view: ViewKind,
    /// Workspace slug.
    pub workspace: String,
    /// Project, absent for workspace-level views.
    #[serde(default)]
    pub project: Option<ProjectId>,
    /// User the filters belong to.
    pub user: String,
}

/// One remembered filter set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedFilters {
    /// Slot key.
    pub key: LocalFilterKey,
    /// Filters as chosen by the user.
    pub filters: PartialIssueFilters,
}

/// Key-value slot holding every remembered filter set.
pub trait FilterStorage: Send + Sync {
    /// Read every remembered filter set.
    ///
    /// # Errors
    /// Returns [`StoreError::Storage`] when the slot cannot be read.
    fn load(&self) -> Result<Vec<PersistedFilters>, StoreError>;

    /// Replace the slot content.
    ///
    /// # Errors
    /// Returns [`StoreError::Storage`] when the slot cannot be written.
    fn save(&self, entries: &[PersistedFilters]) -> Result<(), StoreError>;
}

/// In-memory slot.
#[derive(Debug, Default)]
pub struct MemoryFilterStorage {
    entries: Mutex<Vec<PersistedFilters>>,
}

impl MemoryFilterStorage {
    /// Slot pre-filled with `entries`.
    #[must_use]
    pub fn with_entries(entries: Vec<PersistedFilters>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    fn guard(&self) -> MutexGuard<'_, Vec<PersistedFilters>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FilterStorage for MemoryFilterStorage {
    fn load(&self) -> Result<Vec<PersistedFilters>, StoreError> {
        Ok(self.guard().clone())
    }

    fn save(&self, entries: &[PersistedFilters]) -> Result<(), StoreError> {
        *self.guard() = entries.to_vec();
        Ok(())
    }
}

/// Slot backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileFilterStorage {
    path: PathBuf,
}

impl JsonFileFilterStorage {
    /// Use the file at `path`; it is created on the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FilterStorage for JsonFileFilterStorage {
    fn load(&self) -> Result<Vec<PersistedFilters>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, entries: &[PersistedFilters]) -> Result<(), StoreError> {
        let dir = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, entries)?;
        file.write_all(b"\n")?;
        file.persist(&self.path).map_err(|err| StoreError::from(err.error))?;
        debug!(path = %self.path.display(), entries = entries.len(), "saved filters");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use issue_board_core::filter::{Layout, PartialDisplayFilters};

    fn ok<T>(result: Result<T, StoreError>, context: &str) -> T {
        result.unwrap_or_else(|err| panic!("{context}: {err}"))
    }

    fn entry() -> PersistedFilters {
        PersistedFilters {
            key: LocalFilterKey {
                view: ViewKind::Project,
                workspace: "acme".into(),
                project: Some(ProjectId::new()),
                user: "alice".into(),
            },
            filters: PartialIssueFilters {
                display_filters: PartialDisplayFilters {
                    layout: Some(Layout::Kanban),
                    ..PartialDisplayFilters::default()
                },
                ..PartialIssueFilters::default()
            },
        }
    }

    #[test]
    fn json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let storage = JsonFileFilterStorage::new(dir.path().join("nested").join("filters.json"));
        assert!(ok(storage.load(), "load missing").is_empty());

        let entries = vec![entry()];
        ok(storage.save(&entries), "save");
        assert_eq!(ok(storage.load(), "load"), entries);
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let path = dir.path().join("filters.json");
        fs::write(&path, "{not json").unwrap_or_else(|err| panic!("write: {err}"));
        let err = JsonFileFilterStorage::new(path).load().err();
        assert!(matches!(err, Some(StoreError::Storage(_))));
    }

    #[test]
    fn memory_storage_replaces_content() {
        let storage = MemoryFilterStorage::with_entries(vec![entry()]);
        ok(storage.save(&[]), "save");
        assert!(ok(storage.load(), "load").is_empty());
    }
}
