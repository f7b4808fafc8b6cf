//! Domain types, filter normalization and grouping for issue boards.
//!
//! Nothing in this crate performs I/O; every function is a pure transformation
//! over issue records and filter settings.

/// Known values for each grouping dimension.
pub mod catalog;
/// Filter options, display filters and their normalizers.
pub mod filter;
/// Grouping engine.
pub mod grouping;
/// Identifier types.
pub mod id;
/// Issue records.
pub mod issue;
/// Ordering keys and comparator.
pub mod order;
/// Query parameter serialization.
pub mod params;
/// Manual sort-order arithmetic.
pub mod sort_order;

pub use catalog::{GroupCatalog, StateInfo};
pub use filter::{
    CalendarDisplay, CalendarLayout, DisplayFilterError, DisplayFilters, DisplayProperties, FilterOptions,
    IssueFilters, IssueTypeFilter, Layout, PartialCalendarDisplay, PartialDisplayFilters,
    PartialDisplayProperties, PartialFilterOptions, PartialIssueFilters, normalize_display_filters,
    normalize_display_properties, normalize_filters, normalize_issue_filters,
};
pub use grouping::{
    GroupBy, GroupKey, GroupedIssues, SubGroupedIssues, group_keys, grouped_issues, issue_group_keys,
    sub_grouped_issues, ungrouped_issues,
};
pub use id::{BridgeId, CycleId, IssueId, LabelId, MemberId, ModuleId, ProjectId, StateId, ViewId};
pub use issue::{Issue, IssueDraft, Priority, StateGroup, UnknownVariant};
pub use order::{OrderBy, OrderKey};
pub use params::{
    IssueParam, ParamError, ParamValue, QueryParams, acceptable_params, filtered_params, params_for_layout,
};
