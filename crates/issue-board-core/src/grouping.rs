//! Partitioning of issue collections into ordered groups.
//!
//! Every function here is pure: the same collection, dimension and ordering
//! always produce the same sequences, so callers can memoize on their inputs.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::Date;

use crate::catalog::GroupCatalog;
use crate::id::IssueId;
use crate::issue::{Issue, Priority, StateGroup, UnknownVariant, format_date, parse_date};
use crate::order::OrderBy;

/// Issue attribute used to partition issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupBy {
    /// Workflow state.
    #[serde(rename = "state")]
    State,
    /// Group of the workflow state.
    #[serde(rename = "state_detail.group")]
    StateGroup,
    /// Priority.
    #[serde(rename = "priority")]
    Priority,
    /// Labels (multi-valued).
    #[serde(rename = "labels")]
    Labels,
    /// Assignees (multi-valued).
    #[serde(rename = "assignees")]
    Assignees,
    /// Creator.
    #[serde(rename = "created_by")]
    CreatedBy,
    /// Owning project.
    #[serde(rename = "project")]
    Project,
    /// Due date, one bucket per day.
    #[serde(rename = "target_date")]
    TargetDate,
}

impl GroupBy {
    const ALL: [Self; 8] = [
        Self::State,
        Self::StateGroup,
        Self::Priority,
        Self::Labels,
        Self::Assignees,
        Self::CreatedBy,
        Self::Project,
        Self::TargetDate,
    ];

    /// Wire name of the dimension.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::StateGroup => "state_detail.group",
            Self::Priority => "priority",
            Self::Labels => "labels",
            Self::Assignees => "assignees",
            Self::CreatedBy => "created_by",
            Self::Project => "project",
            Self::TargetDate => "target_date",
        }
    }

    /// Whether an issue can carry several values for this dimension.
    #[must_use]
    pub const fn is_multi_valued(self) -> bool {
        matches!(self, Self::Labels | Self::Assignees)
    }

    /// Whether moving an issue between groups of this dimension can be expressed as an edit.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(
            self,
            Self::State | Self::Priority | Self::Labels | Self::Assignees | Self::TargetDate
        )
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|group| group.as_str() == token)
            .ok_or_else(|| UnknownVariant::new("group_by", s))
    }
}

/// Key of a single group.
///
/// `None` is the reserved bucket for issues without a (valid) value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    /// No value, or a value that no longer exists.
    None,
    /// Attribute value rendered as its wire string.
    Value(String),
    /// Calendar day.
    Date(Date),
}

impl GroupKey {
    /// Label used for the reserved bucket.
    pub const NONE_LABEL: &'static str = "None";

    /// Build a value key.
    pub fn value(value: impl fmt::Display) -> Self {
        Self::Value(value.to_string())
    }

    /// Parse a key as rendered by [`Display`](fmt::Display).
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed == Self::NONE_LABEL || trimmed.is_empty() {
            return Self::None;
        }
        parse_date(trimmed).map_or_else(|_| Self::Value(trimmed.to_owned()), Self::Date)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str(Self::NONE_LABEL),
            Self::Value(value) => f.write_str(value),
            Self::Date(date) => f.write_str(&format_date(*date)),
        }
    }
}

impl Serialize for GroupKey {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GroupKey {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        Ok(Self::parse(&s))
    }
}

/// Group key -> ordered issue ids.
pub type GroupedIssues = BTreeMap<GroupKey, Vec<IssueId>>;

/// Sub-group key (swimlane) -> group key (column) -> ordered issue ids.
pub type SubGroupedIssues = BTreeMap<GroupKey, GroupedIssues>;

/// Resolve the group keys an issue belongs to along `group_by`.
///
/// Values unknown to `catalog` are dropped; an issue left without any value
/// belongs to [`GroupKey::None`] only.
#[must_use]
pub fn issue_group_keys(issue: &Issue, group_by: GroupBy, catalog: &GroupCatalog) -> Vec<GroupKey> {
    let keys: Vec<GroupKey> = match group_by {
        GroupBy::State => issue
            .state
            .filter(|state| catalog.knows_state(*state))
            .map(GroupKey::value)
            .into_iter()
            .collect(),
        GroupBy::StateGroup => issue
            .state
            .and_then(|state| catalog.state_group(state))
            .map(|group| GroupKey::value(group.as_str()))
            .into_iter()
            .collect(),
        GroupBy::Priority => vec![GroupKey::value(issue.priority.as_str())],
        GroupBy::Labels => issue
            .labels
            .iter()
            .filter(|label| catalog.knows_label(**label))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(GroupKey::value)
            .collect(),
        GroupBy::Assignees => issue
            .assignees
            .iter()
            .filter(|member| catalog.knows_member(**member))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(GroupKey::value)
            .collect(),
        GroupBy::CreatedBy => issue
            .created_by
            .filter(|member| catalog.knows_member(*member))
            .map(GroupKey::value)
            .into_iter()
            .collect(),
        GroupBy::Project => Some(issue.project)
            .filter(|project| catalog.knows_project(*project))
            .map(GroupKey::value)
            .into_iter()
            .collect(),
        GroupBy::TargetDate => issue.target_date.map(GroupKey::Date).into_iter().collect(),
    };

    if keys.is_empty() {
        vec![GroupKey::None]
    } else {
        keys
    }
}

/// Every key the dimension can take according to `catalog`, in display order.
///
/// Returns an empty list for dimensions the catalog does not enumerate.
#[must_use]
pub fn group_keys(group_by: GroupBy, catalog: &GroupCatalog) -> Vec<GroupKey> {
    match group_by {
        GroupBy::State => catalog
            .states()
            .unwrap_or_default()
            .iter()
            .map(|state| GroupKey::value(state.id))
            .collect(),
        GroupBy::StateGroup => StateGroup::ALL
            .into_iter()
            .map(|group| GroupKey::value(group.as_str()))
            .collect(),
        GroupBy::Priority => Priority::ALL
            .into_iter()
            .map(|priority| GroupKey::value(priority.as_str()))
            .collect(),
        GroupBy::Labels => catalog.labels().unwrap_or_default().iter().map(GroupKey::value).collect(),
        GroupBy::Assignees | GroupBy::CreatedBy => {
            catalog.members().unwrap_or_default().iter().map(GroupKey::value).collect()
        }
        GroupBy::Project => catalog.projects().unwrap_or_default().iter().map(GroupKey::value).collect(),
        GroupBy::TargetDate => Vec::new(),
    }
}

/// Partition issues by `group_by`, ordering each group by `order_by`.
#[must_use]
pub fn grouped_issues<'a, I>(
    group_by: GroupBy,
    order_by: OrderBy,
    issues: I,
    catalog: &GroupCatalog,
) -> GroupedIssues
where
    I: IntoIterator<Item = &'a Issue>,
{
    let mut grouped = GroupedIssues::new();
    for issue in sorted(order_by, issues) {
        for key in issue_group_keys(issue, group_by, catalog) {
            grouped.entry(key).or_default().push(issue.id);
        }
    }
    grouped
}

/// Partition issues two levels deep: swimlanes by `sub_group_by`, columns by `group_by`.
#[must_use]
pub fn sub_grouped_issues<'a, I>(
    sub_group_by: GroupBy,
    group_by: GroupBy,
    order_by: OrderBy,
    issues: I,
    catalog: &GroupCatalog,
) -> SubGroupedIssues
where
    I: IntoIterator<Item = &'a Issue>,
{
    let mut grouped = SubGroupedIssues::new();
    for issue in sorted(order_by, issues) {
        let columns = issue_group_keys(issue, group_by, catalog);
        for lane in issue_group_keys(issue, sub_group_by, catalog) {
            let lane_entry = grouped.entry(lane).or_default();
            for column in &columns {
                lane_entry.entry(column.clone()).or_default().push(issue.id);
            }
        }
    }
    grouped
}

/// Flat ordered list of issue ids.
#[must_use]
pub fn ungrouped_issues<'a, I>(order_by: OrderBy, issues: I) -> Vec<IssueId>
where
    I: IntoIterator<Item = &'a Issue>,
{
    sorted(order_by, issues).into_iter().map(|issue| issue.id).collect()
}

fn sorted<'a, I>(order_by: OrderBy, issues: I) -> Vec<&'a Issue>
where
    I: IntoIterator<Item = &'a Issue>,
{
    let mut seen = HashSet::new();
    let mut list: Vec<&Issue> = issues.into_iter().filter(|issue| seen.insert(issue.id)).collect();
    list.sort_by(|a, b| order_by.compare(a, b));
    list
}
