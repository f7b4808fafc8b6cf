//! Layout-specific projections of an issue collection.

use issue_board_core::catalog::GroupCatalog;
use issue_board_core::filter::{DisplayFilters, Layout};
use issue_board_core::grouping::{
    GroupBy, GroupKey, GroupedIssues, SubGroupedIssues, group_keys, grouped_issues, sub_grouped_issues,
    ungrouped_issues,
};
use issue_board_core::id::IssueId;
use issue_board_core::issue::Issue;
use issue_board_core::order::OrderBy;
use serde::Serialize;

/// Ordered issue ids as consumed by a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "groups", rename_all = "snake_case")]
pub enum IssueProjection {
    /// One level of groups.
    Grouped(GroupedIssues),
    /// Swimlanes of groups.
    SubGrouped(SubGroupedIssues),
    /// Flat list.
    Ungrouped(Vec<IssueId>),
}

impl IssueProjection {
    /// Ids of a group; for sub-grouped projections `sub_group` selects the swimlane.
    #[must_use]
    pub fn group(&self, group: &GroupKey, sub_group: Option<&GroupKey>) -> Option<&[IssueId]> {
        match (self, sub_group) {
            (Self::Grouped(groups), None) => groups.get(group).map(Vec::as_slice),
            (Self::SubGrouped(lanes), Some(lane)) => lanes.get(lane)?.get(group).map(Vec::as_slice),
            _ => None,
        }
    }

    /// Every id in the projection, in rendering order, each listed once.
    #[must_use]
    pub fn issue_ids(&self) -> Vec<IssueId> {
        let mut seen = std::collections::HashSet::new();
        let all: Box<dyn Iterator<Item = &IssueId>> = match self {
            Self::Grouped(groups) => Box::new(groups.values().flatten()),
            Self::SubGrouped(lanes) => Box::new(lanes.values().flat_map(|lane| lane.values().flatten())),
            Self::Ungrouped(ids) => Box::new(ids.iter()),
        };
        all.filter(|id| seen.insert(**id)).copied().collect()
    }

    /// Whether the issue is rendered anywhere.
    #[must_use]
    pub fn contains(&self, issue: IssueId) -> bool {
        match self {
            Self::Grouped(groups) => groups.values().any(|ids| ids.contains(&issue)),
            Self::SubGrouped(lanes) => lanes
                .values()
                .any(|lane| lane.values().any(|ids| ids.contains(&issue))),
            Self::Ungrouped(ids) => ids.contains(&issue),
        }
    }
}

/// Dimension that partitions the layout into groups, if any.
///
/// Kanban always groups; without an explicit choice it groups by state.
#[must_use]
pub fn effective_group_by(display: &DisplayFilters) -> Option<GroupBy> {
    match display.layout {
        Layout::List => display.group_by,
        Layout::Kanban => Some(display.group_by.unwrap_or(GroupBy::State)),
        Layout::Calendar => Some(GroupBy::TargetDate),
        Layout::Spreadsheet | Layout::Gantt => None,
    }
}

/// Swimlane dimension, only for a valid kanban configuration.
#[must_use]
pub fn effective_sub_group_by(display: &DisplayFilters) -> Option<GroupBy> {
    let group_by = effective_group_by(display)?;
    let sub_group_by = display.sub_group_by?;
    (display.layout == Layout::Kanban && sub_group_by != group_by).then_some(sub_group_by)
}

/// Ordering used by the layout.
#[must_use]
pub fn effective_order_by(display: &DisplayFilters) -> OrderBy {
    match display.layout {
        Layout::Calendar => OrderBy::TARGET_DATE,
        _ => display.order_by,
    }
}

/// Apply the display-filter passes that run before grouping.
#[must_use]
pub fn visible_issues<'a, I>(issues: I, display: &DisplayFilters, catalog: &GroupCatalog) -> Vec<&'a Issue>
where
    I: IntoIterator<Item = &'a Issue>,
{
    issues
        .into_iter()
        .filter(|issue| display.sub_issue || !issue.is_sub_issue())
        .filter(|issue| {
            display.issue_type.is_none_or(|kind| {
                issue
                    .state
                    .and_then(|state| catalog.state_group(state))
                    .is_some_and(|group| kind.admits(group))
            })
        })
        .filter(|issue| {
            display.layout != Layout::Gantt
                || !display.start_target_date
                || (issue.start_date.is_some() && issue.target_date.is_some())
        })
        .collect()
}

/// Project a collection for the layout selected in `display`.
#[must_use]
pub fn project<'a, I>(issues: I, display: &DisplayFilters, catalog: &GroupCatalog) -> IssueProjection
where
    I: IntoIterator<Item = &'a Issue>,
{
    let visible = visible_issues(issues, display, catalog);
    let order_by = effective_order_by(display);
    let Some(group_by) = effective_group_by(display) else {
        return IssueProjection::Ungrouped(ungrouped_issues(order_by, visible));
    };

    if let Some(sub_group_by) = effective_sub_group_by(display) {
        let mut lanes = sub_grouped_issues(sub_group_by, group_by, order_by, visible, catalog);
        if display.show_empty_groups {
            for lane in group_keys(sub_group_by, catalog) {
                lanes.entry(lane).or_default();
            }
            for lane in lanes.values_mut() {
                seed_empty_groups(lane, group_by, catalog);
            }
        }
        return IssueProjection::SubGrouped(lanes);
    }

    let mut groups = grouped_issues(group_by, order_by, visible, catalog);
    if display.show_empty_groups {
        seed_empty_groups(&mut groups, group_by, catalog);
    }
    IssueProjection::Grouped(groups)
}

fn seed_empty_groups(groups: &mut GroupedIssues, group_by: GroupBy, catalog: &GroupCatalog) {
    for key in group_keys(group_by, catalog) {
        groups.entry(key).or_default();
    }
}
