//! Partial issue updates.

use issue_board_core::id::{IssueId, LabelId, MemberId, StateId};
use issue_board_core::issue::{Issue, Priority};
use time::Date;

/// Partial update applied to an issue.
///
/// Outer `None` leaves a field untouched. For nullable fields the inner
/// `None` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssuePatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New workflow state.
    pub state: Option<Option<StateId>>,
    /// New priority.
    pub priority: Option<Priority>,
    /// Replacement assignee set.
    pub assignees: Option<Vec<MemberId>>,
    /// Replacement label set.
    pub labels: Option<Vec<LabelId>>,
    /// New start date.
    pub start_date: Option<Option<Date>>,
    /// New due date.
    pub target_date: Option<Option<Date>>,
    /// New manual sort order.
    pub sort_order: Option<f64>,
    /// New parent issue.
    pub parent: Option<Option<IssueId>>,
}

impl IssuePatch {
    /// Patch that only renames the issue.
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Returns true when the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.state.is_none()
            && self.priority.is_none()
            && self.assignees.is_none()
            && self.labels.is_none()
            && self.start_date.is_none()
            && self.target_date.is_none()
            && self.sort_order.is_none()
            && self.parent.is_none()
    }

    /// Apply the patch in place.
    pub fn apply(&self, issue: &mut Issue) {
        if let Some(title) = &self.title {
            issue.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            issue.description.clone_from(description);
        }
        if let Some(state) = self.state {
            issue.state = state;
        }
        if let Some(priority) = self.priority {
            issue.priority = priority;
        }
        if let Some(assignees) = &self.assignees {
            issue.assignees.clone_from(assignees);
        }
        if let Some(labels) = &self.labels {
            issue.labels.clone_from(labels);
        }
        if let Some(start_date) = self.start_date {
            issue.start_date = start_date;
        }
        if let Some(target_date) = self.target_date {
            issue.target_date = target_date;
        }
        if let Some(sort_order) = self.sort_order {
            issue.sort_order = sort_order;
        }
        if let Some(parent) = self.parent {
            issue.parent = parent;
        }
    }

    /// Return a copy of `issue` with the patch applied.
    #[must_use]
    pub fn applied_to(&self, issue: &Issue) -> Issue {
        let mut next = issue.clone();
        self.apply(&mut next);
        next
    }

    /// Drop every field whose value already matches `issue`.
    #[must_use]
    pub fn changes_against(mut self, issue: &Issue) -> Self {
        if self.title.as_ref() == Some(&issue.title) {
            self.title = None;
        }
        if self.description.as_ref() == Some(&issue.description) {
            self.description = None;
        }
        if self.state == Some(issue.state) {
            self.state = None;
        }
        if self.priority == Some(issue.priority) {
            self.priority = None;
        }
        if self
            .assignees
            .as_ref()
            .is_some_and(|assignees| same_members(assignees, &issue.assignees))
        {
            self.assignees = None;
        }
        if self
            .labels
            .as_ref()
            .is_some_and(|labels| same_members(labels, &issue.labels))
        {
            self.labels = None;
        }
        if self.start_date == Some(issue.start_date) {
            self.start_date = None;
        }
        if self.target_date == Some(issue.target_date) {
            self.target_date = None;
        }
        if self
            .sort_order
            .is_some_and(|sort_order| sort_order.total_cmp(&issue.sort_order).is_eq())
        {
            self.sort_order = None;
        }
        if self.parent == Some(issue.parent) {
            self.parent = None;
        }
        self
    }
}

fn same_members<T: Ord + Copy>(a: &[T], b: &[T]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    a.dedup();
    b.sort_unstable();
    b.dedup();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use issue_board_core::id::ProjectId;
    use time::macros::date;

    fn issue() -> Issue {
        Issue::new(IssueId::new(), ProjectId::new(), "original")
    }

    #[test]
    fn apply_sets_and_clears_fields() {
        let mut issue = issue();
        issue.target_date = Some(date!(2025 - 01 - 10));
        let state = StateId::new();
        let patch = IssuePatch {
            title: Some("renamed".into()),
            state: Some(Some(state)),
            target_date: Some(None),
            ..IssuePatch::default()
        };
        patch.apply(&mut issue);
        assert_eq!(issue.title, "renamed");
        assert_eq!(issue.state, Some(state));
        assert_eq!(issue.target_date, None);
    }

    #[test]
    fn changes_against_drops_noops() {
        let issue = issue();
        let label = LabelId::new();
        let patch = IssuePatch {
            title: Some("original".into()),
            priority: Some(Priority::None),
            labels: Some(vec![label]),
            ..IssuePatch::default()
        }
        .changes_against(&issue);
        assert_eq!(
            patch,
            IssuePatch {
                labels: Some(vec![label]),
                ..IssuePatch::default()
            }
        );
    }

    #[test]
    fn label_order_does_not_count_as_change() {
        let mut issue = issue();
        let a = LabelId::new();
        let b = LabelId::new();
        issue.labels = vec![a, b];
        let patch = IssuePatch {
            labels: Some(vec![b, a]),
            ..IssuePatch::default()
        };
        assert!(patch.changes_against(&issue).is_empty());
    }
}
