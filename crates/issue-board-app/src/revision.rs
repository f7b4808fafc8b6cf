//! Per-issue revision counters used to discard out-of-order responses.

use std::collections::{BTreeMap, HashMap};

use issue_board_core::id::IssueId;

/// Ticket handed out for each local mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Revision(u64);

impl Revision {
    /// Raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    revision: Revision,
    pending: u32,
}

/// Store-wide monotonic counter plus the latest ticket taken for each issue.
///
/// An entry is forgotten once every mutation of the issue has settled and no
/// fetch that started before the latest one is still open.
#[derive(Debug, Default)]
pub struct RevisionTracker {
    last: Revision,
    current: HashMap<IssueId, Entry>,
    open_fetches: BTreeMap<Revision, usize>,
}

impl RevisionTracker {
    /// Take a new ticket for `issue` and make it the issue's current revision.
    pub fn begin(&mut self, issue: IssueId) -> Revision {
        self.last = Revision(self.last.0 + 1);
        let entry = self.current.entry(issue).or_insert(Entry {
            revision: self.last,
            pending: 0,
        });
        entry.revision = self.last;
        entry.pending += 1;
        self.last
    }

    /// Mark one mutation of `issue` as finished, applied or not.
    ///
    /// Every [`begin`](Self::begin) is settled exactly once.
    pub fn settle(&mut self, issue: IssueId) {
        if let Some(entry) = self.current.get_mut(&issue) {
            entry.pending = entry.pending.saturating_sub(1);
            if entry.pending == 0 {
                self.prune();
            }
        }
    }

    /// Latest ticket handed out for any issue.
    #[must_use]
    pub const fn watermark(&self) -> Revision {
        self.last
    }

    /// Register a fetch starting now and return its watermark.
    pub fn open_fetch(&mut self) -> Revision {
        *self.open_fetches.entry(self.last).or_default() += 1;
        self.last
    }

    /// Unregister a fetch opened with `watermark`.
    pub fn close_fetch(&mut self, watermark: Revision) {
        if let Some(count) = self.open_fetches.get_mut(&watermark) {
            *count -= 1;
            if *count == 0 {
                self.open_fetches.remove(&watermark);
            }
        }
        self.prune();
    }

    fn prune(&mut self) {
        let oldest_fetch = self.open_fetches.keys().next().copied();
        self.current
            .retain(|_, entry| entry.pending > 0 || oldest_fetch.is_some_and(|watermark| entry.revision > watermark));
    }

    /// Current revision of an issue while it is tracked.
    #[must_use]
    pub fn current(&self, issue: IssueId) -> Option<Revision> {
        self.current.get(&issue).map(|entry| entry.revision)
    }

    /// Number of tracked issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.current.len()
    }

    /// True when no issue is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Whether a response carrying `revision` was superseded by a newer mutation.
    #[must_use]
    pub fn is_stale(&self, issue: IssueId, revision: Revision) -> bool {
        self.current(issue).is_some_and(|current| current > revision)
    }

    /// Whether the issue was mutated locally after `watermark` was taken.
    #[must_use]
    pub fn changed_since(&self, issue: IssueId, watermark: Revision) -> bool {
        self.current(issue).is_some_and(|current| current > watermark)
    }

    /// Issues mutated locally after `watermark` was taken.
    pub fn changed_after(&self, watermark: Revision) -> impl Iterator<Item = IssueId> + '_ {
        self.current
            .iter()
            .filter(move |(_, entry)| entry.revision > watermark)
            .map(|(issue, _)| *issue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_supersedes_older() {
        let mut tracker = RevisionTracker::default();
        let issue = IssueId::new();
        let first = tracker.begin(issue);
        let second = tracker.begin(issue);
        assert!(tracker.is_stale(issue, first));
        assert!(!tracker.is_stale(issue, second));
    }

    #[test]
    fn tickets_are_store_wide() {
        let mut tracker = RevisionTracker::default();
        let a = tracker.begin(IssueId::new());
        let b = tracker.begin(IssueId::new());
        assert!(b > a);
        assert_eq!(tracker.watermark(), b);
    }

    #[test]
    fn changed_since_compares_against_watermark() {
        let mut tracker = RevisionTracker::default();
        let issue = IssueId::new();
        let untouched = IssueId::new();
        let watermark = tracker.watermark();
        tracker.begin(issue);
        assert!(tracker.changed_since(issue, watermark));
        assert!(!tracker.changed_since(untouched, watermark));
        assert!(!tracker.changed_since(issue, tracker.watermark()));
        assert_eq!(tracker.changed_after(watermark).collect::<Vec<_>>(), vec![issue]);
    }

    #[test]
    fn settled_mutations_are_forgotten() {
        let mut tracker = RevisionTracker::default();
        let issue = IssueId::new();
        tracker.begin(issue);
        tracker.settle(issue);
        assert!(tracker.current(issue).is_none());
        assert!(tracker.is_empty());
    }

    #[test]
    fn entry_outlives_overlapping_mutations() {
        let mut tracker = RevisionTracker::default();
        let issue = IssueId::new();
        let first = tracker.begin(issue);
        let second = tracker.begin(issue);

        // The newer response lands first; the older one must still read as stale.
        tracker.settle(issue);
        assert!(tracker.is_stale(issue, first));
        assert_eq!(tracker.current(issue), Some(second));

        tracker.settle(issue);
        assert!(tracker.is_empty());
    }

    #[test]
    fn open_fetch_holds_later_mutations_until_it_closes() {
        let mut tracker = RevisionTracker::default();
        let before = IssueId::new();
        let after = IssueId::new();
        tracker.begin(before);
        let watermark = tracker.open_fetch();
        tracker.begin(after);

        tracker.settle(before);
        tracker.settle(after);
        assert!(tracker.current(before).is_none());
        assert!(tracker.changed_since(after, watermark));

        tracker.close_fetch(watermark);
        assert!(tracker.is_empty());
    }
}
