//! Cached issue collection for a single scope.

use std::collections::BTreeMap;

use issue_board_core::id::IssueId;
use issue_board_core::issue::Issue;

use crate::patch::IssuePatch;

/// Issues of one scope keyed by id.
///
/// Every mutation bumps [`version`](Self::version) so derived projections can
/// be memoized on it.
#[derive(Debug, Default, Clone)]
pub struct IssueCollection {
    issues: BTreeMap<IssueId, Issue>,
    version: u64,
}

impl IssueCollection {
    /// Build a collection from a server response.
    pub fn from_issues(issues: impl IntoIterator<Item = Issue>) -> Self {
        let mut collection = Self::default();
        collection.replace_all(issues);
        collection
    }

    /// Monotonic counter bumped by every mutation.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Number of cached issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// True when no issue is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Look up an issue.
    #[must_use]
    pub fn get(&self, id: IssueId) -> Option<&Issue> {
        self.issues.get(&id)
    }

    /// Whether the issue is cached.
    #[must_use]
    pub fn contains(&self, id: IssueId) -> bool {
        self.issues.contains_key(&id)
    }

    /// Iterate over cached issues in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.issues.values()
    }

    /// Insert or replace an issue, returning the previous copy.
    pub fn upsert(&mut self, issue: Issue) -> Option<Issue> {
        let previous = self.issues.insert(issue.id, issue);
        self.touch();
        previous
    }

    /// Remove an issue, returning it when it was cached.
    pub fn remove(&mut self, id: IssueId) -> Option<Issue> {
        let removed = self.issues.remove(&id);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Apply a patch in place, returning the copy before the patch.
    pub fn patch(&mut self, id: IssueId, patch: &IssuePatch) -> Option<Issue> {
        let issue = self.issues.get_mut(&id)?;
        let previous = issue.clone();
        patch.apply(issue);
        self.touch();
        Some(previous)
    }

    /// Replace the whole collection.
    pub fn replace_all(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues = issues.into_iter().map(|issue| (issue.id, issue)).collect();
        self.touch();
    }

    fn touch(&mut self) {
        self.version += 1;
    }
}
