//! Generic issue collection store with optimistic mutations.
//!
//! One [`IssueStore`] serves every scope kind; the remote binding is the
//! [`IssueEndpoint`] it is parameterized with. Local mutations are applied to
//! the cached collection before the remote call starts. A failed remote call
//! re-fetches the scope and reports the error. Every mutation takes a ticket
//! from a store-wide [`RevisionTracker`], and responses carrying a superseded
//! ticket are discarded. Fetches of one scope are numbered, and a response
//! older than the last applied fetch is dropped.

use std::collections::HashMap;
use std::sync::Arc;

use issue_board_core::catalog::GroupCatalog;
use issue_board_core::filter::{DisplayFilters, IssueFilters};
use issue_board_core::id::IssueId;
use issue_board_core::issue::{Issue, IssueDraft};
use issue_board_core::params::{QueryParams, params_for_layout};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

use crate::collection::IssueCollection;
use crate::endpoint::{IssueEndpoint, IssueScope};
use crate::error::StoreError;
use crate::kanban::{DragMove, plan_move};
use crate::memo::Memo;
use crate::patch::IssuePatch;
use crate::projection::{IssueProjection, project};
use crate::revision::{Revision, RevisionTracker};

const EVENT_CAPACITY: usize = 64;

/// Why a fetch was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadKind {
    /// First load of a view; the whole view shows a loader.
    InitLoader,
    /// Refresh after a mutation or filter change.
    Mutation,
}

/// Fetch status of a scope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchState {
    /// Nothing in flight.
    #[default]
    Idle,
    /// A fetch is running.
    Loading(LoadKind),
    /// The last fetch failed.
    Failed(String),
}

/// Notification broadcast to views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// The cached collection of a scope changed.
    Changed {
        /// Affected scope.
        scope: IssueScope,
        /// Collection version after the change.
        version: u64,
    },
    /// A transient message for the user.
    Notice {
        /// Affected scope.
        scope: IssueScope,
        /// Message text.
        message: String,
    },
}

type ProjectionKey = (u64, DisplayFilters, GroupCatalog);

#[derive(Default)]
struct ScopeState {
    fetch_state: FetchState,
    fetch_seq: u64,
    applied_fetch: u64,
    collection: IssueCollection,
    last_params: QueryParams,
    projection: Memo<ProjectionKey, IssueProjection>,
}

impl ScopeState {
    fn projection(&mut self, display: &DisplayFilters, catalog: &GroupCatalog) -> Arc<IssueProjection> {
        let key = (self.collection.version(), *display, catalog.clone());
        let collection = &self.collection;
        self.projection
            .get_or_compute(key, || project(collection.iter(), display, catalog))
    }
}

#[derive(Default)]
struct StoreState {
    scopes: HashMap<IssueScope, ScopeState>,
    revisions: RevisionTracker,
}

impl StoreState {
    fn scope(&mut self, scope: &IssueScope) -> &mut ScopeState {
        self.scopes.entry(scope.clone()).or_default()
    }
}

/// Issue collections of every scope served by one endpoint binding.
pub struct IssueStore<E> {
    endpoint: E,
    state: Mutex<StoreState>,
    events: broadcast::Sender<StoreEvent>,
}

impl<E: IssueEndpoint> IssueStore<E> {
    /// Create a store over `endpoint`.
    pub fn new(endpoint: E) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            endpoint,
            state: Mutex::new(StoreState::default()),
            events,
        }
    }

    /// Access the endpoint binding.
    pub const fn endpoint(&self) -> &E {
        &self.endpoint
    }

    /// Receive change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        // No subscriber is not an error.
        let _ = self.events.send(event);
    }

    fn changed(&self, scope: &IssueScope, version: u64) {
        self.emit(StoreEvent::Changed {
            scope: scope.clone(),
            version,
        });
    }

    /// Fetch the scope with the parameters derived from `filters`.
    ///
    /// Issues mutated locally while the request was in flight keep their
    /// local copy. A response that lands after a newer fetch of the scope was
    /// applied is returned but not applied.
    ///
    /// # Errors
    /// Returns the endpoint error; the cached collection is left untouched.
    pub async fn fetch_issues(
        &self,
        scope: &IssueScope,
        filters: &IssueFilters,
        load_kind: LoadKind,
    ) -> Result<Vec<Issue>, StoreError> {
        let params = params_for_layout(&filters.filters, &filters.display_filters);
        self.fetch_with_params(scope, params, load_kind).await
    }

    async fn fetch_with_params(
        &self,
        scope: &IssueScope,
        params: QueryParams,
        load_kind: LoadKind,
    ) -> Result<Vec<Issue>, StoreError> {
        let (ticket, watermark) = {
            let mut state = self.state.lock().await;
            let watermark = state.revisions.open_fetch();
            let entry = state.scope(scope);
            entry.fetch_seq += 1;
            entry.fetch_state = FetchState::Loading(load_kind);
            entry.last_params = params.clone();
            (entry.fetch_seq, watermark)
        };
        info!(%scope, ?load_kind, ticket, params = params.len(), "fetching issues");

        let response = self.endpoint.list_issues(scope, &params).await.map_err(Into::<StoreError>::into);
        let mut state = self.state.lock().await;
        let StoreState { scopes, revisions } = &mut *state;
        let entry = scopes.entry(scope.clone()).or_default();
        let latest = ticket == entry.fetch_seq;

        let issues = match response {
            Ok(issues) => issues,
            Err(err) => {
                warn!(%scope, ticket, error = %err, "fetch failed");
                if latest {
                    entry.fetch_state = FetchState::Failed(err.to_string());
                }
                revisions.close_fetch(watermark);
                return Err(err);
            }
        };

        if ticket < entry.applied_fetch {
            debug!(%scope, ticket, applied = entry.applied_fetch, "discarding superseded fetch");
            revisions.close_fetch(watermark);
            return Ok(issues);
        }

        let mut merged: HashMap<IssueId, Issue> = issues
            .iter()
            .filter(|issue| !revisions.changed_since(issue.id, watermark))
            .map(|issue| (issue.id, issue.clone()))
            .collect();
        for id in revisions.changed_after(watermark) {
            if let Some(local) = entry.collection.get(id) {
                debug!(issue = %id, "keeping local copy newer than fetch");
                merged.insert(id, local.clone());
            }
        }
        revisions.close_fetch(watermark);
        entry.collection.replace_all(merged.into_values());
        entry.applied_fetch = ticket;
        if latest {
            entry.fetch_state = FetchState::Idle;
        }
        let version = entry.collection.version();
        drop(state);

        info!(%scope, ticket, count = issues.len(), "fetched issues");
        self.changed(scope, version);
        Ok(issues)
    }

    async fn refetch(&self, scope: &IssueScope) {
        let params = self.state.lock().await.scope(scope).last_params.clone();
        if let Err(err) = self.fetch_with_params(scope, params, LoadKind::Mutation).await {
            warn!(%scope, error = %err, "re-fetch after failed mutation also failed");
        }
    }

    /// Re-fetch the scope, notify the user and hand the error back.
    async fn roll_back(&self, scope: &IssueScope, err: StoreError) -> StoreError {
        warn!(%scope, error = %err, "remote mutation failed, re-fetching");
        self.refetch(scope).await;
        self.emit(StoreEvent::Notice {
            scope: scope.clone(),
            message: err.describe_user_facing(),
        });
        err
    }

    /// Apply a server copy unless a newer local mutation superseded it.
    async fn reconcile(&self, scope: &IssueScope, issue: &Issue, revision: Revision) {
        let mut state = self.state.lock().await;
        let stale = state.revisions.is_stale(issue.id, revision);
        state.revisions.settle(issue.id);
        if stale {
            debug!(issue = %issue.id, revision = revision.get(), "discarding stale response");
            return;
        }
        let entry = state.scope(scope);
        entry.collection.upsert(issue.clone());
        let version = entry.collection.version();
        drop(state);
        self.changed(scope, version);
    }

    async fn settle(&self, issue: IssueId) {
        self.state.lock().await.revisions.settle(issue);
    }

    /// Create an issue remotely, then insert the server copy.
    ///
    /// # Errors
    /// Returns the endpoint error after re-fetching the scope.
    pub async fn create_issue(&self, scope: &IssueScope, draft: &IssueDraft) -> Result<Issue, StoreError> {
        match self.endpoint.create_issue(scope, draft).await.map_err(Into::<StoreError>::into) {
            Ok(issue) => {
                let mut state = self.state.lock().await;
                let revision = state.revisions.begin(issue.id);
                drop(state);
                self.reconcile(scope, &issue, revision).await;
                Ok(issue)
            }
            Err(err) => Err(self.roll_back(scope, err).await),
        }
    }

    /// Insert the draft under a temporary id, create it remotely, then swap in
    /// the server copy.
    ///
    /// # Errors
    /// Returns the endpoint error after re-fetching the scope.
    pub async fn quick_add_issue(&self, scope: &IssueScope, draft: &IssueDraft) -> Result<Issue, StoreError> {
        let temporary = IssueId::new();
        {
            let mut state = self.state.lock().await;
            state.revisions.begin(temporary);
            let entry = state.scope(scope);
            entry
                .collection
                .upsert(draft.clone().into_issue(temporary, scope.project, &scope.workspace));
            let version = entry.collection.version();
            drop(state);
            self.changed(scope, version);
        }
        debug!(%scope, issue = %temporary, "quick-added issue");

        match self.endpoint.create_issue(scope, draft).await.map_err(Into::<StoreError>::into) {
            Ok(issue) => {
                let mut state = self.state.lock().await;
                state.revisions.settle(temporary);
                let revision = state.revisions.begin(issue.id);
                state.scope(scope).collection.remove(temporary);
                drop(state);
                self.reconcile(scope, &issue, revision).await;
                Ok(issue)
            }
            Err(err) => {
                let mut state = self.state.lock().await;
                state.revisions.settle(temporary);
                state.scope(scope).collection.remove(temporary);
                drop(state);
                Err(self.roll_back(scope, err).await)
            }
        }
    }

    /// Patch an issue locally, then remotely.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] for an issue missing from the scope,
    /// or the endpoint error after re-fetching the scope.
    pub async fn update_issue(
        &self,
        scope: &IssueScope,
        issue: IssueId,
        patch: &IssuePatch,
    ) -> Result<Issue, StoreError> {
        let revision = {
            let mut state = self.state.lock().await;
            if !state.scope(scope).collection.contains(issue) {
                return Err(StoreError::NotFound(issue));
            }
            let revision = state.revisions.begin(issue);
            let entry = state.scope(scope);
            entry.collection.patch(issue, patch);
            let version = entry.collection.version();
            drop(state);
            self.changed(scope, version);
            revision
        };
        debug!(%scope, %issue, revision = revision.get(), "optimistic update");

        match self.endpoint.update_issue(scope, issue, patch).await.map_err(Into::<StoreError>::into) {
            Ok(updated) => {
                self.reconcile(scope, &updated, revision).await;
                Ok(updated)
            }
            Err(err) => {
                self.settle(issue).await;
                Err(self.roll_back(scope, err).await)
            }
        }
    }

    /// Delete an issue locally, then remotely.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] for an issue missing from the scope,
    /// or the endpoint error after re-fetching the scope.
    pub async fn remove_issue(&self, scope: &IssueScope, issue: IssueId) -> Result<(), StoreError> {
        self.remove_locally(scope, issue).await?;
        let result = self.endpoint.delete_issue(scope, issue).await.map_err(Into::<StoreError>::into);
        self.settle(issue).await;
        match result {
            Ok(()) => Ok(()),
            Err(err) => Err(self.roll_back(scope, err).await),
        }
    }

    /// Detach an issue from a cycle or module without deleting it.
    ///
    /// # Errors
    /// Returns [`StoreError::Validation`] for project or view scopes and for
    /// issues without a bridge record, or the endpoint error after
    /// re-fetching the scope.
    pub async fn remove_from_scope(&self, scope: &IssueScope, issue: IssueId) -> Result<(), StoreError> {
        if !scope.uses_bridge() {
            return Err(StoreError::validation(
                "only cycle and module scopes can detach issues",
            ));
        }
        let bridge = {
            let mut state = self.state.lock().await;
            let cached = state
                .scope(scope)
                .collection
                .get(issue)
                .ok_or(StoreError::NotFound(issue))?;
            cached
                .bridge_id
                .ok_or_else(|| StoreError::validation(format!("issue {issue} has no bridge record")))?
        };
        self.remove_locally(scope, issue).await?;
        let result = self
            .endpoint
            .remove_bridge(scope, issue, bridge)
            .await
            .map_err(Into::<StoreError>::into);
        self.settle(issue).await;
        match result {
            Ok(()) => Ok(()),
            Err(err) => Err(self.roll_back(scope, err).await),
        }
    }

    async fn remove_locally(&self, scope: &IssueScope, issue: IssueId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if !state.scope(scope).collection.contains(issue) {
            return Err(StoreError::NotFound(issue));
        }
        state.revisions.begin(issue);
        let entry = state.scope(scope);
        entry.collection.remove(issue);
        let version = entry.collection.version();
        drop(state);
        debug!(%scope, %issue, "optimistic removal");
        self.changed(scope, version);
        Ok(())
    }

    /// Apply a drag within the scope's current projection.
    ///
    /// Returns `None` when the drag changes nothing.
    ///
    /// # Errors
    /// Returns the planning error, or the update error after re-fetching.
    pub async fn move_issue(
        &self,
        scope: &IssueScope,
        drag: &DragMove,
        display: &DisplayFilters,
        catalog: &GroupCatalog,
    ) -> Result<Option<Issue>, StoreError> {
        let patch = {
            let mut state = self.state.lock().await;
            let entry = state.scope(scope);
            let projection = entry.projection(display, catalog);
            plan_move(drag, &entry.collection, &projection, display)?
        };
        if patch.is_empty() {
            debug!(%scope, issue = %drag.issue, "drag is a no-op");
            return Ok(None);
        }
        self.update_issue(scope, drag.issue, &patch).await.map(Some)
    }

    /// Grouped ids of the scope for `display`, memoized on the collection
    /// version, the display filters and the catalog.
    pub async fn projection(
        &self,
        scope: &IssueScope,
        display: &DisplayFilters,
        catalog: &GroupCatalog,
    ) -> Arc<IssueProjection> {
        self.state.lock().await.scope(scope).projection(display, catalog)
    }

    /// Cached copy of an issue.
    pub async fn issue(&self, scope: &IssueScope, issue: IssueId) -> Option<Issue> {
        self.state
            .lock()
            .await
            .scopes
            .get(scope)
            .and_then(|entry| entry.collection.get(issue).cloned())
    }

    /// Every cached issue of the scope, in id order.
    pub async fn issues(&self, scope: &IssueScope) -> Vec<Issue> {
        self.state
            .lock()
            .await
            .scopes
            .get(scope)
            .map(|entry| entry.collection.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Fetch status of the scope.
    pub async fn fetch_state(&self, scope: &IssueScope) -> FetchState {
        self.state
            .lock()
            .await
            .scopes
            .get(scope)
            .map(|entry| entry.fetch_state.clone())
            .unwrap_or_default()
    }

    /// Number of issues with a local mutation still tracked.
    pub async fn tracked_revisions(&self) -> usize {
        self.state.lock().await.revisions.len()
    }

    /// Collection version of the scope.
    pub async fn version(&self, scope: &IssueScope) -> u64 {
        self.state
            .lock()
            .await
            .scopes
            .get(scope)
            .map_or(0, |entry| entry.collection.version())
    }
}
