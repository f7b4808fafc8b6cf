//! Filter options, display filters and display properties.
//!
//! Each comes in a partial shape (what callers and storage provide, any field
//! may be missing) and a normalized shape where every field holds a concrete
//! value. The `normalize_*` functions convert between the two without
//! touching their input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use time::Date;

use crate::catalog::GroupCatalog;
use crate::grouping::GroupBy;
use crate::issue::{Issue, StateGroup, UnknownVariant, parse_date};
use crate::order::OrderBy;

/// Visual layout of an issue view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Vertical list, optionally grouped.
    #[default]
    List,
    /// Board of columns, optionally with swimlanes.
    Kanban,
    /// Month or week calendar keyed by due date.
    Calendar,
    /// Flat table.
    Spreadsheet,
    /// Timeline chart.
    #[serde(rename = "gantt_chart")]
    Gantt,
}

impl Layout {
    /// Every layout.
    pub const ALL: [Self; 5] = [Self::List, Self::Kanban, Self::Calendar, Self::Spreadsheet, Self::Gantt];

    /// Wire name of the layout.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Kanban => "kanban",
            Self::Calendar => "calendar",
            Self::Spreadsheet => "spreadsheet",
            Self::Gantt => "gantt_chart",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layout {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|layout| layout.as_str() == token || (token == "gantt" && *layout == Self::Gantt))
            .ok_or_else(|| UnknownVariant::new("layout", s))
    }
}

/// Calendar granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CalendarLayout {
    /// Every week touching the active month.
    #[default]
    Month,
    /// The week containing the active date.
    Week,
}

/// Restrict a view to active or backlog work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueTypeFilter {
    /// Unstarted or started states.
    Active,
    /// Backlog states.
    Backlog,
}

impl IssueTypeFilter {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Backlog => "backlog",
        }
    }

    /// Whether an issue in `group` passes the filter.
    #[must_use]
    pub const fn admits(self, group: StateGroup) -> bool {
        match self {
            Self::Active => group.is_active(),
            Self::Backlog => matches!(group, StateGroup::Backlog),
        }
    }
}

/// Sparse predicate fields as provided by callers or storage.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialFilterOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_group: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriber: Option<Vec<String>>,
}

/// Normalized predicate fields. An empty list means "not filtered".
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterOptions {
    pub priority: Vec<String>,
    pub state: Vec<String>,
    pub state_group: Vec<String>,
    pub assignees: Vec<String>,
    pub mentions: Vec<String>,
    pub created_by: Vec<String>,
    pub labels: Vec<String>,
    pub start_date: Vec<String>,
    pub target_date: Vec<String>,
    pub project: Vec<String>,
    pub subscriber: Vec<String>,
}

/// Calendar settings as provided by callers.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialCalendarDisplay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_weekends: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<CalendarLayout>,
}

/// Normalized calendar settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarDisplay {
    /// Render Saturday and Sunday columns.
    pub show_weekends: bool,
    /// Month or week view.
    pub layout: CalendarLayout,
}

/// Layout and ordering settings as provided by callers or storage.
///
/// Nullable fields use a nested option: `Some(None)` explicitly clears the
/// value, `None` leaves it untouched when merging.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialDisplayFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    #[serde(deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub group_by: Option<Option<GroupBy>>,
    #[serde(deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub sub_group_by: Option<Option<GroupBy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    #[serde(
        rename = "type",
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub issue_type: Option<Option<IssueTypeFilter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_issue: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_empty_groups: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_target_date: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar: Option<PartialCalendarDisplay>,
}

fn explicit_null<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

impl PartialDisplayFilters {
    /// Overlay `other` on top of `self`; fields set in `other` win.
    #[must_use]
    pub fn merged(self, other: Self) -> Self {
        let calendar = match (self.calendar, other.calendar) {
            (Some(base), Some(over)) => Some(PartialCalendarDisplay {
                show_weekends: over.show_weekends.or(base.show_weekends),
                layout: over.layout.or(base.layout),
            }),
            (base, over) => over.or(base),
        };
        Self {
            layout: other.layout.or(self.layout),
            group_by: other.group_by.or(self.group_by),
            sub_group_by: other.sub_group_by.or(self.sub_group_by),
            order_by: other.order_by.or(self.order_by),
            issue_type: other.issue_type.or(self.issue_type),
            sub_issue: other.sub_issue.or(self.sub_issue),
            show_empty_groups: other.show_empty_groups.or(self.show_empty_groups),
            start_target_date: other.start_target_date.or(self.start_target_date),
            calendar,
        }
    }
}

/// Normalized layout and ordering settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayFilters {
    /// Active layout.
    pub layout: Layout,
    /// First-level grouping.
    pub group_by: Option<GroupBy>,
    /// Swimlane grouping (kanban only).
    pub sub_group_by: Option<GroupBy>,
    /// Ordering inside every group.
    pub order_by: OrderBy,
    /// Active/backlog restriction.
    #[serde(rename = "type")]
    pub issue_type: Option<IssueTypeFilter>,
    /// Include sub-issues.
    pub sub_issue: bool,
    /// Render groups that contain no issue.
    pub show_empty_groups: bool,
    /// Only issues that have both a start and a due date (gantt).
    pub start_target_date: bool,
    /// Calendar settings.
    pub calendar: CalendarDisplay,
}

impl Default for DisplayFilters {
    fn default() -> Self {
        normalize_display_filters(&PartialDisplayFilters::default())
    }
}

/// Reasons a display filter combination is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayFilterError {
    /// Swimlanes only exist on the kanban layout.
    #[error("sub_group_by is only supported by the kanban layout (got {0})")]
    SubGroupOutsideKanban(Layout),
    /// Swimlanes need a column grouping.
    #[error("sub_group_by requires group_by")]
    SubGroupWithoutGroup,
    /// Swimlanes and columns cannot share a dimension.
    #[error("sub_group_by must differ from group_by ({0})")]
    SubGroupEqualsGroup(GroupBy),
}

impl DisplayFilters {
    /// Check combinations the layouts cannot render.
    ///
    /// # Errors
    /// Returns the first invalid combination found.
    pub fn validate(&self) -> Result<(), DisplayFilterError> {
        let Some(sub_group_by) = self.sub_group_by else {
            return Ok(());
        };
        if self.layout != Layout::Kanban {
            return Err(DisplayFilterError::SubGroupOutsideKanban(self.layout));
        }
        match self.group_by {
            None => Err(DisplayFilterError::SubGroupWithoutGroup),
            Some(group_by) if group_by == sub_group_by => {
                Err(DisplayFilterError::SubGroupEqualsGroup(group_by))
            }
            Some(_) => Ok(()),
        }
    }

    /// Convert back into the partial shape used for persistence.
    #[must_use]
    pub const fn to_partial(&self) -> PartialDisplayFilters {
        PartialDisplayFilters {
            layout: Some(self.layout),
            group_by: Some(self.group_by),
            sub_group_by: Some(self.sub_group_by),
            order_by: Some(self.order_by),
            issue_type: Some(self.issue_type),
            sub_issue: Some(self.sub_issue),
            show_empty_groups: Some(self.show_empty_groups),
            start_target_date: Some(self.start_target_date),
            calendar: Some(PartialCalendarDisplay {
                show_weekends: Some(self.calendar.show_weekends),
                layout: Some(self.calendar.layout),
            }),
        }
    }
}

/// Attribute chips as provided by callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct PartialDisplayProperties {
    pub assignee: Option<bool>,
    pub start_date: Option<bool>,
    pub due_date: Option<bool>,
    pub labels: Option<bool>,
    pub priority: Option<bool>,
    pub state: Option<bool>,
    pub sub_issue_count: Option<bool>,
    pub attachment_count: Option<bool>,
    pub estimate: Option<bool>,
    pub link: Option<bool>,
    pub key: Option<bool>,
    pub created_on: Option<bool>,
    pub updated_on: Option<bool>,
}

/// Which issue attributes render on cards and rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs, clippy::struct_excessive_bools)]
pub struct DisplayProperties {
    pub assignee: bool,
    pub start_date: bool,
    pub due_date: bool,
    pub labels: bool,
    pub priority: bool,
    pub state: bool,
    pub sub_issue_count: bool,
    pub attachment_count: bool,
    pub estimate: bool,
    pub link: bool,
    pub key: bool,
    pub created_on: bool,
    pub updated_on: bool,
}

impl DisplayProperties {
    /// Convert back into the partial shape used for persistence.
    #[must_use]
    pub const fn to_partial(&self) -> PartialDisplayProperties {
        PartialDisplayProperties {
            assignee: Some(self.assignee),
            start_date: Some(self.start_date),
            due_date: Some(self.due_date),
            labels: Some(self.labels),
            priority: Some(self.priority),
            state: Some(self.state),
            sub_issue_count: Some(self.sub_issue_count),
            attachment_count: Some(self.attachment_count),
            estimate: Some(self.estimate),
            link: Some(self.link),
            key: Some(self.key),
            created_on: Some(self.created_on),
            updated_on: Some(self.updated_on),
        }
    }
}

/// The three filter groups of a view, partial shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialIssueFilters {
    /// Predicate fields.
    pub filters: PartialFilterOptions,
    /// Layout settings.
    #[serde(rename = "displayFilters", alias = "display_filters")]
    pub display_filters: PartialDisplayFilters,
    /// Attribute chips.
    #[serde(rename = "displayProperties", alias = "display_properties")]
    pub display_properties: PartialDisplayProperties,
}

/// The three filter groups of a view, normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueFilters {
    /// Predicate fields.
    pub filters: FilterOptions,
    /// Layout settings.
    pub display_filters: DisplayFilters,
    /// Attribute chips.
    pub display_properties: DisplayProperties,
}

impl IssueFilters {
    /// Convert back into the partial shape used for persistence.
    #[must_use]
    pub fn to_partial(&self) -> PartialIssueFilters {
        PartialIssueFilters {
            filters: self.filters.to_partial(),
            display_filters: self.display_filters.to_partial(),
            display_properties: self.display_properties.to_partial(),
        }
    }
}

fn normalize_list(values: Option<&Vec<String>>) -> Vec<String> {
    values
        .map(|values| {
            values
                .iter()
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Fill every predicate field; missing or empty lists become "not filtered".
#[must_use]
pub fn normalize_filters(filters: &PartialFilterOptions) -> FilterOptions {
    FilterOptions {
        priority: normalize_list(filters.priority.as_ref()),
        state: normalize_list(filters.state.as_ref()),
        state_group: normalize_list(filters.state_group.as_ref()),
        assignees: normalize_list(filters.assignees.as_ref()),
        mentions: normalize_list(filters.mentions.as_ref()),
        created_by: normalize_list(filters.created_by.as_ref()),
        labels: normalize_list(filters.labels.as_ref()),
        start_date: normalize_list(filters.start_date.as_ref()),
        target_date: normalize_list(filters.target_date.as_ref()),
        project: normalize_list(filters.project.as_ref()),
        subscriber: normalize_list(filters.subscriber.as_ref()),
    }
}

/// Fill every display filter with its documented default.
#[must_use]
pub fn normalize_display_filters(display: &PartialDisplayFilters) -> DisplayFilters {
    let calendar = display.calendar.unwrap_or_default();
    DisplayFilters {
        layout: display.layout.unwrap_or_default(),
        group_by: display.group_by.flatten(),
        sub_group_by: display.sub_group_by.flatten(),
        order_by: display.order_by.unwrap_or_default(),
        issue_type: display.issue_type.flatten(),
        sub_issue: display.sub_issue.unwrap_or(false),
        show_empty_groups: display.show_empty_groups.unwrap_or(false),
        start_target_date: display.start_target_date.unwrap_or(false),
        calendar: CalendarDisplay {
            show_weekends: calendar.show_weekends.unwrap_or(false),
            layout: calendar.layout.unwrap_or_default(),
        },
    }
}

/// Fill every display property; all default to hidden.
#[must_use]
pub fn normalize_display_properties(props: &PartialDisplayProperties) -> DisplayProperties {
    DisplayProperties {
        assignee: props.assignee.unwrap_or(false),
        start_date: props.start_date.unwrap_or(false),
        due_date: props.due_date.unwrap_or(false),
        labels: props.labels.unwrap_or(false),
        priority: props.priority.unwrap_or(false),
        state: props.state.unwrap_or(false),
        sub_issue_count: props.sub_issue_count.unwrap_or(false),
        attachment_count: props.attachment_count.unwrap_or(false),
        estimate: props.estimate.unwrap_or(false),
        link: props.link.unwrap_or(false),
        key: props.key.unwrap_or(false),
        created_on: props.created_on.unwrap_or(false),
        updated_on: props.updated_on.unwrap_or(false),
    }
}

/// Normalize all three filter groups.
#[must_use]
pub fn normalize_issue_filters(filters: &PartialIssueFilters) -> IssueFilters {
    IssueFilters {
        filters: normalize_filters(&filters.filters),
        display_filters: normalize_display_filters(&filters.display_filters),
        display_properties: normalize_display_properties(&filters.display_properties),
    }
}

/// Bound parsed from a date filter token such as `2024-01-31;after`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateBound {
    After(Date),
    Before(Date),
}

impl DateBound {
    fn parse(token: &str) -> Option<Self> {
        let (date, direction) = token.split_once(';')?;
        let date = parse_date(date).ok()?;
        match direction.split(';').next()?.trim() {
            "after" => Some(Self::After(date)),
            "before" => Some(Self::Before(date)),
            _ => None,
        }
    }

    fn admits(self, value: Date) -> bool {
        match self {
            Self::After(bound) => value >= bound,
            Self::Before(bound) => value <= bound,
        }
    }
}

fn date_matches(tokens: &[String], value: Option<Date>) -> bool {
    let bounds: Vec<DateBound> = tokens.iter().filter_map(|t| DateBound::parse(t)).collect();
    if bounds.is_empty() {
        return true;
    }
    value.is_some_and(|value| bounds.iter().all(|bound| bound.admits(value)))
}

fn any_matches(filter: &[String], values: impl IntoIterator<Item = String>) -> bool {
    if filter.is_empty() {
        return true;
    }
    values.into_iter().any(|value| filter.contains(&value))
}

impl FilterOptions {
    /// True when no predicate is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Evaluate the predicate locally.
    ///
    /// Values inside a field are OR-ed, fields are AND-ed. `mentions` and
    /// `subscriber` depend on server-side data and are not evaluated here.
    #[must_use]
    pub fn matches(&self, issue: &Issue, catalog: &GroupCatalog) -> bool {
        any_matches(&self.priority, [issue.priority.as_str().to_owned()])
            && any_matches(&self.state, issue.state.map(|s| s.to_string()))
            && any_matches(
                &self.state_group,
                issue
                    .state
                    .and_then(|s| catalog.state_group(s))
                    .map(|g| g.as_str().to_owned()),
            )
            && any_matches(&self.assignees, issue.assignees.iter().map(ToString::to_string))
            && any_matches(&self.created_by, issue.created_by.map(|m| m.to_string()))
            && any_matches(&self.labels, issue.labels.iter().map(ToString::to_string))
            && any_matches(&self.project, [issue.project.to_string()])
            && date_matches(&self.start_date, issue.start_date)
            && date_matches(&self.target_date, issue.target_date)
    }

    /// Convert back into the partial shape used for persistence.
    #[must_use]
    pub fn to_partial(&self) -> PartialFilterOptions {
        let some = |values: &Vec<String>| (!values.is_empty()).then(|| values.clone());
        PartialFilterOptions {
            priority: some(&self.priority),
            state: some(&self.state),
            state_group: some(&self.state_group),
            assignees: some(&self.assignees),
            mentions: some(&self.mentions),
            created_by: some(&self.created_by),
            labels: some(&self.labels),
            start_date: some(&self.start_date),
            target_date: some(&self.target_date),
            project: some(&self.project),
            subscriber: some(&self.subscriber),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StateInfo;
    use crate::id::{IssueId, LabelId, ProjectId, StateId};
    use crate::issue::Priority;
    use crate::order::OrderKey;
    use time::macros::date;

    fn ok<T, E: fmt::Display>(result: Result<T, E>, context: &str) -> T {
        result.unwrap_or_else(|err| panic!("{context}: {err}"))
    }

    #[test]
    fn missing_layout_defaults_to_list() {
        let display = normalize_display_filters(&PartialDisplayFilters::default());
        assert_eq!(display.layout, Layout::List);
        assert_eq!(display.order_by, OrderBy::SORT_ORDER);
        assert_eq!(display.group_by, None);
        assert_eq!(display.calendar.layout, CalendarLayout::Month);
        assert!(!display.calendar.show_weekends);
        assert!(!display.show_empty_groups);
        assert!(!display.sub_issue);
        assert!(!display.start_target_date);
    }

    #[test]
    fn display_properties_default_to_hidden() {
        let props = normalize_display_properties(&PartialDisplayProperties {
            labels: Some(true),
            ..PartialDisplayProperties::default()
        });
        assert!(props.labels);
        assert!(!props.assignee);
        assert!(!props.due_date);
        assert!(!props.updated_on);
    }

    #[test]
    fn normalizing_does_not_mutate_input() {
        let partial = PartialDisplayFilters {
            layout: Some(Layout::Kanban),
            ..PartialDisplayFilters::default()
        };
        let snapshot = partial.clone();
        let _ = normalize_display_filters(&partial);
        assert_eq!(partial, snapshot);
    }

    #[test]
    fn unknown_fields_are_dropped() {
        let json = r#"{
            "filters": {"priority": ["urgent"], "bogus": ["x"]},
            "displayFilters": {"layout": "kanban", "group_by": "state", "colour": "red"},
            "displayProperties": {"labels": true, "sparkles": true}
        }"#;
        let partial: PartialIssueFilters = ok(serde_json::from_str(json), "deserialize filters");
        let normalized = normalize_issue_filters(&partial);
        assert_eq!(normalized.filters.priority, vec!["urgent".to_owned()]);
        assert_eq!(normalized.display_filters.layout, Layout::Kanban);
        assert_eq!(normalized.display_filters.group_by, Some(GroupBy::State));
        assert!(normalized.display_properties.labels);

        let value = ok(serde_json::to_value(&normalized), "serialize filters");
        assert!(value["filters"].get("bogus").is_none());
        assert!(value["display_filters"].get("colour").is_none());
    }

    #[test]
    fn empty_lists_normalize_to_unfiltered() {
        let filters = normalize_filters(&PartialFilterOptions {
            labels: Some(vec![]),
            state: Some(vec![" ".into()]),
            ..PartialFilterOptions::default()
        });
        assert!(filters.is_empty());
    }

    #[test]
    fn merge_can_clear_nullable_fields() {
        let base = PartialDisplayFilters {
            group_by: Some(Some(GroupBy::Priority)),
            order_by: Some(OrderBy::desc(OrderKey::CreatedAt)),
            ..PartialDisplayFilters::default()
        };
        let update: PartialDisplayFilters = ok(serde_json::from_str(r#"{"group_by": null}"#), "parse update");
        let merged = base.merged(update);
        assert_eq!(merged.group_by, Some(None));
        assert_eq!(merged.order_by, Some(OrderBy::desc(OrderKey::CreatedAt)));
        assert_eq!(normalize_display_filters(&merged).group_by, None);
    }

    #[test]
    fn partial_roundtrip_preserves_normalized_values() {
        let display = DisplayFilters {
            layout: Layout::Calendar,
            calendar: CalendarDisplay {
                show_weekends: true,
                layout: CalendarLayout::Week,
            },
            ..DisplayFilters::default()
        };
        assert_eq!(normalize_display_filters(&display.to_partial()), display);
    }

    #[test]
    fn validate_rejects_bad_swimlanes() {
        let mut display = DisplayFilters {
            layout: Layout::Kanban,
            group_by: Some(GroupBy::State),
            sub_group_by: Some(GroupBy::State),
            ..DisplayFilters::default()
        };
        assert_eq!(
            display.validate(),
            Err(DisplayFilterError::SubGroupEqualsGroup(GroupBy::State))
        );
        display.sub_group_by = Some(GroupBy::Priority);
        assert_eq!(display.validate(), Ok(()));
        display.layout = Layout::List;
        assert!(display.validate().is_err());
    }

    #[test]
    fn matches_combines_fields_with_and() {
        let todo = StateId::new();
        let bug = LabelId::new();
        let catalog = GroupCatalog::permissive().with_states([StateInfo::new(
            todo,
            "Todo",
            StateGroup::Unstarted,
            1.0,
        )]);
        let mut issue = Issue::new(IssueId::new(), ProjectId::new(), "crash");
        issue.priority = Priority::High;
        issue.state = Some(todo);
        issue.labels = vec![bug];
        issue.target_date = Some(date!(2025 - 06 - 15));

        let filters = normalize_filters(&PartialFilterOptions {
            priority: Some(vec!["urgent".into(), "high".into()]),
            state_group: Some(vec!["unstarted".into()]),
            labels: Some(vec![bug.to_string()]),
            target_date: Some(vec!["2025-06-01;after".into(), "2025-06-30;before".into()]),
            ..PartialFilterOptions::default()
        });
        assert!(filters.matches(&issue, &catalog));

        issue.priority = Priority::Low;
        assert!(!filters.matches(&issue, &catalog));
    }

    #[test]
    fn date_filters_ignore_relative_tokens() {
        let issue = Issue::new(IssueId::new(), ProjectId::new(), "undated");
        let filters = normalize_filters(&PartialFilterOptions {
            start_date: Some(vec!["1_weeks;after;fromnow".into()]),
            ..PartialFilterOptions::default()
        });
        assert!(filters.matches(&issue, &GroupCatalog::permissive()));
    }

    #[test]
    fn layout_parses_gantt_alias() {
        assert_eq!(ok("gantt".parse::<Layout>(), "parse"), Layout::Gantt);
        assert_eq!(ok("gantt_chart".parse::<Layout>(), "parse"), Layout::Gantt);
        assert!("grid".parse::<Layout>().is_err());
    }
}
