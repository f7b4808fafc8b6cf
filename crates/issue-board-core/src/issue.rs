//! Issue records as returned by the remote API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::id::{BridgeId, CycleId, IssueId, LabelId, MemberId, ModuleId, ProjectId, StateId};
use crate::sort_order::DEFAULT_SORT_ORDER;

time::serde::format_description!(date_format, Date, "[year]-[month]-[day]");

/// Issue priority, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Needs attention right now.
    Urgent,
    /// Important.
    High,
    /// Normal.
    Medium,
    /// Can wait.
    Low,
    /// Not prioritized.
    #[default]
    None,
}

impl Priority {
    /// Every priority in display order.
    pub const ALL: [Self; 5] = [Self::Urgent, Self::High, Self::Medium, Self::Low, Self::None];

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == token)
            .ok_or_else(|| UnknownVariant::new("priority", s))
    }
}

/// Classification shared by every workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateGroup {
    /// Not yet triaged.
    Backlog,
    /// Ready to start.
    Unstarted,
    /// In progress.
    Started,
    /// Finished.
    Completed,
    /// Abandoned.
    Cancelled,
}

impl StateGroup {
    /// Every state group in workflow order.
    pub const ALL: [Self; 5] = [
        Self::Backlog,
        Self::Unstarted,
        Self::Started,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Unstarted => "unstarted",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the group counts as active work.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Unstarted | Self::Started)
    }
}

impl fmt::Display for StateGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateGroup {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == token)
            .ok_or_else(|| UnknownVariant::new("state group", s))
    }
}

/// Error returned when a token does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {token}")]
pub struct UnknownVariant {
    /// What was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub token: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, token: &str) -> Self {
        Self {
            kind,
            token: token.to_owned(),
        }
    }
}

/// Issue record owned by the issue store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Identifier of the issue.
    pub id: IssueId,
    /// Owning project.
    pub project: ProjectId,
    /// Workspace slug.
    #[serde(default)]
    pub workspace: String,
    /// Human-readable title.
    #[serde(rename = "name")]
    pub title: String,
    /// Optional description body.
    #[serde(default)]
    pub description: Option<String>,
    /// Current workflow state.
    #[serde(default)]
    pub state: Option<StateId>,
    /// Priority.
    #[serde(default)]
    pub priority: Priority,
    /// Assigned members.
    #[serde(default)]
    pub assignees: Vec<MemberId>,
    /// Attached labels.
    #[serde(default)]
    pub labels: Vec<LabelId>,
    /// Member who created the issue.
    #[serde(default)]
    pub created_by: Option<MemberId>,
    /// Planned start.
    #[serde(default, with = "date_format::option")]
    pub start_date: Option<Date>,
    /// Due date.
    #[serde(default, with = "date_format::option")]
    pub target_date: Option<Date>,
    /// Manual ordering value.
    #[serde(default = "default_sort_order")]
    pub sort_order: f64,
    /// Parent issue when this is a sub-issue.
    #[serde(default)]
    pub parent: Option<IssueId>,
    /// Cycle the issue belongs to.
    #[serde(default)]
    pub cycle: Option<CycleId>,
    /// Module the issue belongs to.
    #[serde(default)]
    pub module: Option<ModuleId>,
    /// Join record linking the issue to the cycle or module being viewed.
    #[serde(default)]
    pub bridge_id: Option<BridgeId>,
    /// Number of sub-issues.
    #[serde(default)]
    pub sub_issues_count: u32,
    /// Number of attachments.
    #[serde(default)]
    pub attachment_count: u32,
    /// Number of links.
    #[serde(default)]
    pub link_count: u32,
    /// Estimate points.
    #[serde(default)]
    pub estimate_point: Option<u32>,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Last update timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const fn default_sort_order() -> f64 {
    DEFAULT_SORT_ORDER
}

impl Issue {
    /// Create a bare issue with default attributes.
    #[must_use]
    pub fn new(id: IssueId, project: ProjectId, title: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id,
            project,
            workspace: String::new(),
            title: title.into(),
            description: None,
            state: None,
            priority: Priority::None,
            assignees: Vec::new(),
            labels: Vec::new(),
            created_by: None,
            start_date: None,
            target_date: None,
            sort_order: DEFAULT_SORT_ORDER,
            parent: None,
            cycle: None,
            module: None,
            bridge_id: None,
            sub_issues_count: 0,
            attachment_count: 0,
            link_count: 0,
            estimate_point: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the issue is a sub-issue of another issue.
    #[must_use]
    pub const fn is_sub_issue(&self) -> bool {
        self.parent.is_some()
    }
}

/// Payload used to create an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueDraft {
    /// Title of the new issue.
    #[serde(rename = "name")]
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Initial workflow state.
    #[serde(default)]
    pub state: Option<StateId>,
    /// Initial priority.
    #[serde(default)]
    pub priority: Priority,
    /// Initial assignees.
    #[serde(default)]
    pub assignees: Vec<MemberId>,
    /// Initial labels.
    #[serde(default)]
    pub labels: Vec<LabelId>,
    /// Planned start.
    #[serde(default, with = "date_format::option")]
    pub start_date: Option<Date>,
    /// Due date.
    #[serde(default, with = "date_format::option")]
    pub target_date: Option<Date>,
    /// Parent issue.
    #[serde(default)]
    pub parent: Option<IssueId>,
    /// Explicit sort order; the server picks one when absent.
    #[serde(default)]
    pub sort_order: Option<f64>,
}

impl IssueDraft {
    /// Draft with only a title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Materialize the draft into an issue record.
    #[must_use]
    pub fn into_issue(self, id: IssueId, project: ProjectId, workspace: &str) -> Issue {
        let mut issue = Issue::new(id, project, self.title);
        issue.workspace = workspace.to_owned();
        issue.description = self.description;
        issue.state = self.state;
        issue.priority = self.priority;
        issue.assignees = self.assignees;
        issue.labels = self.labels;
        issue.start_date = self.start_date;
        issue.target_date = self.target_date;
        issue.parent = self.parent;
        issue.sort_order = self.sort_order.unwrap_or(DEFAULT_SORT_ORDER);
        issue
    }
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
/// Returns an error when the input is not a calendar date in that format.
pub fn parse_date(input: &str) -> Result<Date, time::error::Parse> {
    Date::parse(
        input.trim(),
        time::macros::format_description!("[year]-[month]-[day]"),
    )
}

/// Format a date as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
