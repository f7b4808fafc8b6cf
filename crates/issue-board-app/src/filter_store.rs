//! Per-view filter state backed by a [`FilterStorage`] slot.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use issue_board_core::filter::{
    IssueFilters, Layout, PartialDisplayFilters, PartialDisplayProperties, PartialFilterOptions,
    PartialIssueFilters, normalize_issue_filters,
};
use tracing::debug;

use crate::error::StoreError;
use crate::storage::{FilterStorage, LocalFilterKey, PersistedFilters};

/// Change applied to one of the three filter groups of a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    /// Merge predicate fields.
    Filters(PartialFilterOptions),
    /// Merge layout settings.
    DisplayFilters(PartialDisplayFilters),
    /// Merge attribute chips.
    DisplayProperties(PartialDisplayProperties),
}

/// Remembers the filters of every mounted view.
pub struct FilterStore<S> {
    storage: S,
    defaults: PartialDisplayFilters,
    views: Mutex<HashMap<LocalFilterKey, PartialIssueFilters>>,
}

impl<S: FilterStorage> FilterStore<S> {
    /// Create a store over `storage`.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            defaults: PartialDisplayFilters::default(),
            views: Mutex::new(HashMap::new()),
        }
    }

    /// Display filters applied to views that never stored their own.
    #[must_use]
    pub fn with_defaults(mut self, defaults: PartialDisplayFilters) -> Self {
        self.defaults = defaults;
        self
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<LocalFilterKey, PartialIssueFilters>> {
        self.views.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the filters remembered for `key` (view mount).
    ///
    /// # Errors
    /// Returns [`StoreError::Storage`] when the slot cannot be read.
    pub fn load(&self, key: &LocalFilterKey) -> Result<IssueFilters, StoreError> {
        let stored = self
            .storage
            .load()?
            .into_iter()
            .find(|entry| &entry.key == key)
            .map(|entry| entry.filters);
        let mut partial = stored.unwrap_or_default();
        partial.display_filters = sanitize(self.defaults.clone().merged(partial.display_filters));
        let filters = normalize_issue_filters(&partial);
        self.guard().insert(key.clone(), partial);
        Ok(filters)
    }

    /// Filters of a view loaded earlier, without touching storage.
    #[must_use]
    pub fn current(&self, key: &LocalFilterKey) -> Option<IssueFilters> {
        self.guard().get(key).map(normalize_issue_filters)
    }

    /// Merge `update` into the view's filters and write them to storage.
    ///
    /// # Errors
    /// Returns [`StoreError::Storage`] when the slot cannot be read or
    /// written, and [`StoreError::Validation`] when the resulting display
    /// filters cannot be rendered.
    pub fn update(&self, key: &LocalFilterKey, update: FilterUpdate) -> Result<IssueFilters, StoreError> {
        let cached = self.guard().get(key).cloned();
        let mut partial = match cached {
            Some(partial) => partial,
            None => {
                self.load(key)?;
                self.guard().get(key).cloned().unwrap_or_default()
            }
        };

        match update {
            FilterUpdate::Filters(filters) => {
                partial.filters = merge_filter_options(partial.filters, filters);
            }
            FilterUpdate::DisplayFilters(display) => {
                partial.display_filters = sanitize(partial.display_filters.merged(display));
            }
            FilterUpdate::DisplayProperties(properties) => {
                partial.display_properties = merge_display_properties(partial.display_properties, properties);
            }
        }

        let normalized = normalize_issue_filters(&partial);
        normalized
            .display_filters
            .validate()
            .map_err(|err| StoreError::validation(err.to_string()))?;

        let mut entries = self.storage.load()?;
        match entries.iter_mut().find(|entry| &entry.key == key) {
            Some(entry) => entry.filters = partial.clone(),
            None => entries.push(PersistedFilters {
                key: key.clone(),
                filters: partial.clone(),
            }),
        }
        self.storage.save(&entries)?;
        debug!(view = ?key.view, workspace = %key.workspace, "stored view filters");

        self.guard().insert(key.clone(), partial);
        Ok(normalized)
    }
}

/// Drop swimlanes the layout cannot render.
fn sanitize(mut display: PartialDisplayFilters) -> PartialDisplayFilters {
    let layout = display.layout.unwrap_or_default();
    let group_by = display.group_by.flatten();
    let sub_group_by = display.sub_group_by.flatten();
    if sub_group_by.is_some() && (layout != Layout::Kanban || group_by.is_none() || group_by == sub_group_by) {
        display.sub_group_by = Some(None);
    }
    display
}

fn merge_filter_options(base: PartialFilterOptions, over: PartialFilterOptions) -> PartialFilterOptions {
    PartialFilterOptions {
        priority: over.priority.or(base.priority),
        state: over.state.or(base.state),
        state_group: over.state_group.or(base.state_group),
        assignees: over.assignees.or(base.assignees),
        mentions: over.mentions.or(base.mentions),
        created_by: over.created_by.or(base.created_by),
        labels: over.labels.or(base.labels),
        start_date: over.start_date.or(base.start_date),
        target_date: over.target_date.or(base.target_date),
        project: over.project.or(base.project),
        subscriber: over.subscriber.or(base.subscriber),
    }
}

const fn merge_display_properties(
    base: PartialDisplayProperties,
    over: PartialDisplayProperties,
) -> PartialDisplayProperties {
    PartialDisplayProperties {
        assignee: or(over.assignee, base.assignee),
        start_date: or(over.start_date, base.start_date),
        due_date: or(over.due_date, base.due_date),
        labels: or(over.labels, base.labels),
        priority: or(over.priority, base.priority),
        state: or(over.state, base.state),
        sub_issue_count: or(over.sub_issue_count, base.sub_issue_count),
        attachment_count: or(over.attachment_count, base.attachment_count),
        estimate: or(over.estimate, base.estimate),
        link: or(over.link, base.link),
        key: or(over.key, base.key),
        created_on: or(over.created_on, base.created_on),
        updated_on: or(over.updated_on, base.updated_on),
    }
}

const fn or(over: Option<bool>, base: Option<bool>) -> Option<bool> {
    match over {
        Some(value) => Some(value),
        None => base,
    }
}
