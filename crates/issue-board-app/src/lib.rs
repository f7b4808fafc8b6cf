//! Application layer for issue boards.
//!
//! This crate owns the cached issue collections, the optimistic mutation
//! flow against a remote endpoint, the layout projections and the per-view
//! filter state shared by every front end.

/// Calendar grid projection.
pub mod calendar;
/// Versioned issue map of one scope.
pub mod collection;
/// Board configuration file.
pub mod config;
/// Remote endpoint binding and scopes.
pub mod endpoint;
/// Error taxonomy.
pub mod error;
/// Per-view filter state.
pub mod filter_store;
/// Kanban board projection and drag planning.
pub mod kanban;
/// Single-slot memoization.
pub mod memo;
/// Partial issue updates.
pub mod patch;
/// Grouped issue ids per layout.
pub mod projection;
/// Per-issue mutation tickets.
pub mod revision;
/// Service composition root.
pub mod services;
/// Filter persistence slots.
pub mod storage;
/// Generic optimistic issue store.
pub mod store;

// Re-exports for convenience
pub use calendar::{CalendarDay, CalendarView, CalendarWeek};
pub use collection::IssueCollection;
pub use config::{BoardConfig, StorageConfig, WorkspaceConfig};
pub use endpoint::{IssueEndpoint, IssueScope, ScopeKind};
pub use error::{ErrorKind, StoreError};
pub use filter_store::{FilterStore, FilterUpdate};
pub use kanban::{DragMove, DragSource, DropTarget, KanbanBoard, KanbanColumn, KanbanLane, plan_move};
pub use memo::Memo;
pub use patch::IssuePatch;
pub use projection::{IssueProjection, project};
pub use revision::{Revision, RevisionTracker};
pub use services::BoardService;
pub use storage::{FilterStorage, JsonFileFilterStorage, LocalFilterKey, MemoryFilterStorage, PersistedFilters, ViewKind};
pub use store::{FetchState, IssueStore, LoadKind, StoreEvent};
