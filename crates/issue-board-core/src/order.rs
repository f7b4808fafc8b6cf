//! Order-by keys and the comparator shared by every grouping mode.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::issue::{Issue, UnknownVariant};

/// Attribute an issue list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderKey {
    /// Manual ordering.
    SortOrder,
    /// Creation timestamp.
    CreatedAt,
    /// Last update timestamp.
    UpdatedAt,
    /// Start date.
    StartDate,
    /// Due date.
    TargetDate,
    /// Priority, most urgent first.
    Priority,
    /// Number of sub-issues.
    SubIssuesCount,
    /// Estimate points.
    EstimatePoint,
    /// Number of links.
    LinkCount,
    /// Number of attachments.
    AttachmentCount,
}

impl OrderKey {
    const ALL: [Self; 10] = [
        Self::SortOrder,
        Self::CreatedAt,
        Self::UpdatedAt,
        Self::StartDate,
        Self::TargetDate,
        Self::Priority,
        Self::SubIssuesCount,
        Self::EstimatePoint,
        Self::LinkCount,
        Self::AttachmentCount,
    ];

    /// Wire name of the key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SortOrder => "sort_order",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::StartDate => "start_date",
            Self::TargetDate => "target_date",
            Self::Priority => "priority",
            Self::SubIssuesCount => "sub_issues_count",
            Self::EstimatePoint => "estimate_point",
            Self::LinkCount => "link_count",
            Self::AttachmentCount => "attachment_count",
        }
    }
}

/// Ordering applied inside every group: a key and a direction.
///
/// Serialized as the key name, prefixed with `-` when descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderBy {
    /// Attribute compared.
    pub key: OrderKey,
    /// Reverse the natural order of the key.
    pub descending: bool,
}

impl OrderBy {
    /// Manual sort order, ascending.
    pub const SORT_ORDER: Self = Self::asc(OrderKey::SortOrder);
    /// Newest issues first.
    pub const NEWEST: Self = Self::desc(OrderKey::CreatedAt);
    /// Due date, earliest first.
    pub const TARGET_DATE: Self = Self::asc(OrderKey::TargetDate);

    /// Ascending order on `key`.
    #[must_use]
    pub const fn asc(key: OrderKey) -> Self {
        Self {
            key,
            descending: false,
        }
    }

    /// Descending order on `key`.
    #[must_use]
    pub const fn desc(key: OrderKey) -> Self {
        Self {
            key,
            descending: true,
        }
    }

    /// Whether the order follows manual sort order, which allows reordering by drag.
    #[must_use]
    pub const fn is_manual(self) -> bool {
        matches!(self.key, OrderKey::SortOrder)
    }

    /// Compare two issues; ties fall back to the issue id so results are deterministic.
    #[must_use]
    pub fn compare(self, a: &Issue, b: &Issue) -> Ordering {
        self.compare_key(a, b).then_with(|| a.id.cmp(&b.id))
    }

    fn compare_key(self, a: &Issue, b: &Issue) -> Ordering {
        let directed = |ord: Ordering| if self.descending { ord.reverse() } else { ord };
        match self.key {
            OrderKey::SortOrder => directed(a.sort_order.total_cmp(&b.sort_order)),
            OrderKey::CreatedAt => directed(a.created_at.cmp(&b.created_at)),
            OrderKey::UpdatedAt => directed(a.updated_at.cmp(&b.updated_at)),
            OrderKey::StartDate => missing_last(a.start_date, b.start_date, directed),
            OrderKey::TargetDate => missing_last(a.target_date, b.target_date, directed),
            OrderKey::Priority => directed(a.priority.cmp(&b.priority)),
            OrderKey::SubIssuesCount => directed(a.sub_issues_count.cmp(&b.sub_issues_count)),
            OrderKey::EstimatePoint => missing_last(a.estimate_point, b.estimate_point, directed),
            OrderKey::LinkCount => directed(a.link_count.cmp(&b.link_count)),
            OrderKey::AttachmentCount => directed(a.attachment_count.cmp(&b.attachment_count)),
        }
    }
}

impl Default for OrderBy {
    fn default() -> Self {
        Self::SORT_ORDER
    }
}

fn missing_last<T: Ord>(a: Option<T>, b: Option<T>, directed: impl Fn(Ordering) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => directed(a.cmp(&b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            f.write_str("-")?;
        }
        f.write_str(self.key.as_str())
    }
}

impl FromStr for OrderBy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (descending, name) = trimmed
            .strip_prefix('-')
            .map_or((false, trimmed), |rest| (true, rest));
        OrderKey::ALL
            .into_iter()
            .find(|key| key.as_str() == name)
            .map(|key| Self { key, descending })
            .ok_or_else(|| UnknownVariant::new("order_by", s))
    }
}

impl TryFrom<String> for OrderBy {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderBy> for String {
    fn from(value: OrderBy) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{IssueId, ProjectId};
    use crate::issue::Priority;
    use time::macros::date;
    use uuid::Uuid;

    fn issue(n: u128) -> Issue {
        Issue::new(IssueId(Uuid::from_u128(n)), ProjectId(Uuid::from_u128(0)), format!("issue {n}"))
    }

    fn ok<T, E: fmt::Display>(result: Result<T, E>, context: &str) -> T {
        result.unwrap_or_else(|err| panic!("{context}: {err}"))
    }

    #[test]
    fn parses_descending_prefix() {
        let order: OrderBy = ok("-created_at".parse(), "parse order");
        assert_eq!(order, OrderBy::NEWEST);
        assert_eq!(order.to_string(), "-created_at");
        assert!("-bogus".parse::<OrderBy>().is_err());
    }

    #[test]
    fn serde_uses_wire_string() {
        let json = ok(serde_json::to_string(&OrderBy::desc(OrderKey::Priority)), "serialize");
        assert_eq!(json, "\"-priority\"");
        let back: OrderBy = ok(serde_json::from_str("\"target_date\""), "deserialize");
        assert_eq!(back, OrderBy::TARGET_DATE);
    }

    #[test]
    fn ties_break_on_issue_id() {
        let a = issue(1);
        let b = issue(2);
        assert_eq!(OrderBy::SORT_ORDER.compare(&a, &b), Ordering::Less);
        assert_eq!(OrderBy::desc(OrderKey::SortOrder).compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn missing_dates_sort_last_in_both_directions() {
        let mut dated = issue(2);
        dated.target_date = Some(date!(2025 - 01 - 01));
        let undated = issue(1);
        assert_eq!(OrderBy::TARGET_DATE.compare(&dated, &undated), Ordering::Less);
        assert_eq!(
            OrderBy::desc(OrderKey::TargetDate).compare(&dated, &undated),
            Ordering::Less
        );
    }

    #[test]
    fn priority_orders_urgent_first() {
        let mut urgent = issue(2);
        urgent.priority = Priority::Urgent;
        let mut low = issue(1);
        low.priority = Priority::Low;
        assert_eq!(OrderBy::asc(OrderKey::Priority).compare(&urgent, &low), Ordering::Less);
        assert_eq!(OrderBy::desc(OrderKey::Priority).compare(&urgent, &low), Ordering::Greater);
    }
}
