use anyhow::{Context, Result};
use issue_board_core::filter::IssueFilters;

use crate::config::BoardConfig;
use crate::endpoint::{IssueEndpoint, IssueScope, ScopeKind};
use crate::filter_store::{FilterStore, FilterUpdate};
use crate::storage::{FilterStorage, LocalFilterKey, ViewKind};
use crate::store::{IssueStore, LoadKind};

/// Service façade wiring the issue store to the per-view filter state.
pub struct BoardService<E, S> {
    issues: IssueStore<E>,
    filters: FilterStore<S>,
    config: BoardConfig,
}

impl<E: IssueEndpoint, S: FilterStorage> BoardService<E, S> {
    /// Compose a service; `config.display` seeds views without stored filters.
    pub fn new(endpoint: E, storage: S, config: BoardConfig) -> Self {
        Self {
            issues: IssueStore::new(endpoint),
            filters: FilterStore::new(storage).with_defaults(config.display.clone()),
            config,
        }
    }

    /// Issue store shared by every view.
    pub const fn issues(&self) -> &IssueStore<E> {
        &self.issues
    }

    /// Filter state of every view.
    pub const fn filters(&self) -> &FilterStore<S> {
        &self.filters
    }

    /// Loaded configuration.
    pub const fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Slot the filters of `scope` are remembered under.
    #[must_use]
    pub fn filter_key(&self, scope: &IssueScope) -> LocalFilterKey {
        LocalFilterKey {
            view: view_kind(scope),
            workspace: scope.workspace.clone(),
            project: Some(scope.project),
            user: self.config.workspace.user.clone(),
        }
    }

    /// Mount a view: restore its filters and run the initial fetch.
    ///
    /// # Errors
    /// Returns an error when the stored filters cannot be read or the fetch fails.
    pub async fn open_view(&self, scope: &IssueScope) -> Result<IssueFilters> {
        let key = self.filter_key(scope);
        let filters = self
            .filters
            .load(&key)
            .with_context(|| format!("failed to load filters for {scope}"))?;
        self.issues
            .fetch_issues(scope, &filters, LoadKind::InitLoader)
            .await
            .with_context(|| format!("failed to fetch issues for {scope}"))?;
        Ok(filters)
    }

    /// Change the filters of a view and re-fetch it.
    ///
    /// # Errors
    /// Returns an error when the update is rejected or the fetch fails.
    pub async fn apply_filters(&self, scope: &IssueScope, update: FilterUpdate) -> Result<IssueFilters> {
        let key = self.filter_key(scope);
        let filters = self
            .filters
            .update(&key, update)
            .with_context(|| format!("failed to update filters for {scope}"))?;
        self.issues
            .fetch_issues(scope, &filters, LoadKind::Mutation)
            .await
            .with_context(|| format!("failed to refresh issues for {scope}"))?;
        Ok(filters)
    }
}

const fn view_kind(scope: &IssueScope) -> ViewKind {
    match scope.kind {
        ScopeKind::Project => ViewKind::Project,
        ScopeKind::Cycle(_) => ViewKind::Cycle,
        ScopeKind::Module(_) => ViewKind::Module,
        ScopeKind::View(_) => ViewKind::ProjectView,
    }
}
