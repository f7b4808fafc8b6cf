//! JSON-document-backed endpoint binding for issue boards.
//!
//! The document stands in for the remote API: every scope of the board reads
//! and writes the same file.

pub mod error;

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use anyhow::{Context, Result};
use issue_board_app::{IssueEndpoint, IssuePatch, IssueScope, ScopeKind};
use issue_board_core::catalog::GroupCatalog;
use issue_board_core::filter::IssueTypeFilter;
use issue_board_core::id::{BridgeId, IssueId};
use issue_board_core::issue::{Issue, IssueDraft};
use issue_board_core::order::OrderBy;
use issue_board_core::params::{IssueParam, QueryParams};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub use error::JsonStoreError;

/// Content of an issue document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueDocument {
    /// Known states, labels, members and projects.
    #[serde(default)]
    pub catalog: GroupCatalog,
    /// Every issue of the board.
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl IssueDocument {
    fn find_mut(&mut self, scope: &IssueScope, issue: IssueId) -> Result<&mut Issue, JsonStoreError> {
        self.issues
            .iter_mut()
            .find(|candidate| candidate.id == issue && in_scope(candidate, scope))
            .ok_or(JsonStoreError::IssueNotFound(issue))
    }
}

/// Issue document stored as a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonIssueStore {
    path: PathBuf,
    write_lock: Arc<StdMutex<()>>,
}

impl JsonIssueStore {
    /// Open an existing document.
    ///
    /// # Errors
    /// Returns an error if the file does not exist or is not a valid document.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let store = Self {
            path,
            write_lock: Arc::new(StdMutex::new(())),
        };
        store
            .load()
            .with_context(|| format!("Failed to open issue document {}", store.path.display()))?;
        Ok(store)
    }

    /// Write `document` to `path` and open it.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn create(path: impl AsRef<Path>, document: &IssueDocument) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Arc::new(StdMutex::new(())),
        };
        store
            .save(document)
            .with_context(|| format!("Failed to create issue document {}", store.path.display()))?;
        Ok(store)
    }

    /// Location of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read or parsed.
    pub fn load(&self) -> Result<IssueDocument, JsonStoreError> {
        let contents = fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents).map_err(|err| JsonStoreError::ParseError(err.to_string()))
    }

    /// Replace the whole document atomically.
    ///
    /// # Errors
    /// Returns an error when the file cannot be written.
    pub fn save(&self, document: &IssueDocument) -> Result<(), JsonStoreError> {
        let dir = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, document)
            .map_err(|err| JsonStoreError::SerializeError(err.to_string()))?;
        file.write_all(b"\n")?;
        file.persist(&self.path).map_err(|err| JsonStoreError::IoError(err.error))?;
        Ok(())
    }

    /// Load, mutate and save under the write lock.
    fn modify<T>(&self, f: impl FnOnce(&mut IssueDocument) -> Result<T, JsonStoreError>) -> Result<T, JsonStoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut document = self.load()?;
        let out = f(&mut document)?;
        self.save(&document)?;
        Ok(out)
    }

    /// Issues of `scope` matching `params`, in the requested order.
    ///
    /// # Errors
    /// Returns an error when the document cannot be read.
    pub fn list(&self, scope: &IssueScope, params: &QueryParams) -> Result<Vec<Issue>, JsonStoreError> {
        let document = self.load()?;
        let filters = params.to_filter_options();
        let issue_type = params
            .text(IssueParam::Type)
            .and_then(|text| [IssueTypeFilter::Active, IssueTypeFilter::Backlog].into_iter().find(|t| t.as_str() == text));
        let hide_sub_issues = params.flag(IssueParam::SubIssue) == Some(false);
        let dated_only = params.flag(IssueParam::StartTargetDate) == Some(true);

        let mut issues: Vec<Issue> = document
            .issues
            .into_iter()
            .filter(|issue| in_scope(issue, scope))
            .filter(|issue| filters.matches(issue, &document.catalog))
            .filter(|issue| !(hide_sub_issues && issue.is_sub_issue()))
            .filter(|issue| !dated_only || (issue.start_date.is_some() && issue.target_date.is_some()))
            .filter(|issue| {
                issue_type.is_none_or(|filter| {
                    issue
                        .state
                        .and_then(|state| document.catalog.state_group(state))
                        .is_some_and(|group| filter.admits(group))
                })
            })
            .collect();

        if let Some(order_by) = params.text(IssueParam::OrderBy).and_then(|text| text.parse::<OrderBy>().ok()) {
            issues.sort_by(|a, b| order_by.compare(a, b));
        }
        Ok(issues)
    }

    /// Create an issue inside `scope`.
    ///
    /// # Errors
    /// Returns an error when the document cannot be read or written.
    pub fn create_issue(&self, scope: &IssueScope, draft: IssueDraft) -> Result<Issue, JsonStoreError> {
        self.modify(|document| {
            let mut issue = draft.into_issue(IssueId::new(), scope.project, &scope.workspace);
            match scope.kind {
                ScopeKind::Cycle(cycle) => {
                    issue.cycle = Some(cycle);
                    issue.bridge_id = Some(BridgeId::new());
                }
                ScopeKind::Module(module) => {
                    issue.module = Some(module);
                    issue.bridge_id = Some(BridgeId::new());
                }
                ScopeKind::Project | ScopeKind::View(_) => {}
            }
            document.issues.push(issue.clone());
            Ok(issue)
        })
    }

    /// Apply `patch` to an issue of `scope`.
    ///
    /// # Errors
    /// Returns [`JsonStoreError::IssueNotFound`] when the scope does not list
    /// the issue.
    pub fn update_issue(&self, scope: &IssueScope, issue: IssueId, patch: &IssuePatch) -> Result<Issue, JsonStoreError> {
        self.modify(|document| {
            let current = document.find_mut(scope, issue)?;
            patch.apply(current);
            current.updated_at = OffsetDateTime::now_utc();
            Ok(current.clone())
        })
    }

    /// Delete an issue of `scope`.
    ///
    /// # Errors
    /// Returns [`JsonStoreError::IssueNotFound`] when the scope does not list
    /// the issue.
    pub fn delete_issue(&self, scope: &IssueScope, issue: IssueId) -> Result<(), JsonStoreError> {
        self.modify(|document| {
            document.find_mut(scope, issue)?;
            document.issues.retain(|candidate| candidate.id != issue);
            Ok(())
        })
    }

    /// Detach an issue from a cycle or module.
    ///
    /// # Errors
    /// Returns [`JsonStoreError::Unsupported`] for scopes without bridges and
    /// [`JsonStoreError::BridgeMismatch`] when `bridge` does not link the issue.
    pub fn remove_bridge(&self, scope: &IssueScope, issue: IssueId, bridge: BridgeId) -> Result<(), JsonStoreError> {
        if !scope.uses_bridge() {
            return Err(JsonStoreError::Unsupported(format!("{scope} has no bridge records")));
        }
        self.modify(|document| {
            let current = document.find_mut(scope, issue)?;
            if current.bridge_id != Some(bridge) {
                return Err(JsonStoreError::BridgeMismatch { issue, bridge });
            }
            match scope.kind {
                ScopeKind::Cycle(_) => current.cycle = None,
                ScopeKind::Module(_) => current.module = None,
                ScopeKind::Project | ScopeKind::View(_) => {}
            }
            current.bridge_id = None;
            current.updated_at = OffsetDateTime::now_utc();
            Ok(())
        })
    }
}

fn in_scope(issue: &Issue, scope: &IssueScope) -> bool {
    if issue.project != scope.project {
        return false;
    }
    match scope.kind {
        ScopeKind::Project | ScopeKind::View(_) => true,
        ScopeKind::Cycle(cycle) => issue.cycle == Some(cycle),
        ScopeKind::Module(module) => issue.module == Some(module),
    }
}

/// Async endpoint binding over a [`JsonIssueStore`].
///
/// File I/O runs on the blocking pool; the lock is only held to clone the
/// store handle.
#[derive(Debug, Clone)]
pub struct JsonFileEndpoint {
    store: Arc<Mutex<JsonIssueStore>>,
}

impl JsonFileEndpoint {
    /// Wrap an opened store.
    #[must_use]
    pub fn new(store: JsonIssueStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Open the document at `path`.
    ///
    /// # Errors
    /// Returns an error if the document cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        JsonIssueStore::open(path).map(Self::new)
    }

    async fn run<T, F>(&self, op: F) -> Result<T, JsonStoreError>
    where
        T: Send + 'static,
        F: FnOnce(JsonIssueStore) -> Result<T, JsonStoreError> + Send + 'static,
    {
        let guard = self.store.lock().await;
        // Clone the store to avoid holding the lock during blocking I/O
        let store = guard.clone();
        drop(guard);

        tokio::task::spawn_blocking(move || op(store))
            .await
            .map_err(|e| JsonStoreError::Other(format!("Task join error: {e}")))?
    }
}

impl IssueEndpoint for JsonFileEndpoint {
    type Error = JsonStoreError;

    async fn list_issues(&self, scope: &IssueScope, params: &QueryParams) -> Result<Vec<Issue>, Self::Error> {
        let scope_owned = scope.clone();
        let params = params.clone();
        let issues = self.run(move |store| store.list(&scope_owned, &params)).await?;
        info!(%scope, count = issues.len(), "listed issues from document");
        Ok(issues)
    }

    async fn create_issue(&self, scope: &IssueScope, draft: &IssueDraft) -> Result<Issue, Self::Error> {
        let scope = scope.clone();
        let draft = draft.clone();
        let issue = self.run(move |store| store.create_issue(&scope, draft)).await?;
        debug!(issue = %issue.id, "created issue in document");
        Ok(issue)
    }

    async fn update_issue(
        &self,
        scope: &IssueScope,
        issue: IssueId,
        patch: &IssuePatch,
    ) -> Result<Issue, Self::Error> {
        let scope = scope.clone();
        let patch = patch.clone();
        let updated = self.run(move |store| store.update_issue(&scope, issue, &patch)).await?;
        debug!(%issue, "updated issue in document");
        Ok(updated)
    }

    async fn delete_issue(&self, scope: &IssueScope, issue: IssueId) -> Result<(), Self::Error> {
        let scope = scope.clone();
        self.run(move |store| store.delete_issue(&scope, issue)).await?;
        debug!(%issue, "deleted issue from document");
        Ok(())
    }

    async fn remove_bridge(&self, scope: &IssueScope, issue: IssueId, bridge: BridgeId) -> Result<(), Self::Error> {
        let scope = scope.clone();
        self.run(move |store| store.remove_bridge(&scope, issue, bridge)).await?;
        debug!(%issue, %bridge, "detached issue in document");
        Ok(())
    }
}
