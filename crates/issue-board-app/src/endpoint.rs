//! Remote endpoint binding used by [`IssueStore`](crate::store::IssueStore).

use std::fmt;

use issue_board_core::id::{BridgeId, CycleId, IssueId, ModuleId, ProjectId, ViewId};
use issue_board_core::issue::{Issue, IssueDraft};
use issue_board_core::params::QueryParams;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::patch::IssuePatch;

/// Entity an issue collection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ScopeKind {
    /// Every issue of the project.
    Project,
    /// Issues attached to a cycle.
    Cycle(CycleId),
    /// Issues attached to a module.
    Module(ModuleId),
    /// Issues matched by a saved view.
    View(ViewId),
}

/// Workspace/project path plus the entity whose issues are listed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueScope {
    /// Workspace slug.
    pub workspace: String,
    /// Project identifier.
    pub project: ProjectId,
    /// Entity within the project.
    pub kind: ScopeKind,
}

impl IssueScope {
    /// Scope listing every issue of a project.
    pub fn project(workspace: impl Into<String>, project: ProjectId) -> Self {
        Self {
            workspace: workspace.into(),
            project,
            kind: ScopeKind::Project,
        }
    }

    /// Scope listing the issues of a cycle.
    pub fn cycle(workspace: impl Into<String>, project: ProjectId, cycle: CycleId) -> Self {
        Self {
            workspace: workspace.into(),
            project,
            kind: ScopeKind::Cycle(cycle),
        }
    }

    /// Scope listing the issues of a module.
    pub fn module(workspace: impl Into<String>, project: ProjectId, module: ModuleId) -> Self {
        Self {
            workspace: workspace.into(),
            project,
            kind: ScopeKind::Module(module),
        }
    }

    /// Scope listing the issues matched by a saved view.
    pub fn view(workspace: impl Into<String>, project: ProjectId, view: ViewId) -> Self {
        Self {
            workspace: workspace.into(),
            project,
            kind: ScopeKind::View(view),
        }
    }

    /// Whether issues are attached to the scope through a bridge record.
    #[must_use]
    pub const fn uses_bridge(&self) -> bool {
        matches!(self.kind, ScopeKind::Cycle(_) | ScopeKind::Module(_))
    }

    /// Relative API path of the issue listing.
    #[must_use]
    pub fn path(&self) -> String {
        let base = format!("workspaces/{}/projects/{}", self.workspace, self.project);
        match self.kind {
            ScopeKind::Project => format!("{base}/issues"),
            ScopeKind::Cycle(cycle) => format!("{base}/cycles/{cycle}/cycle-issues"),
            ScopeKind::Module(module) => format!("{base}/modules/{module}/module-issues"),
            ScopeKind::View(view) => format!("{base}/views/{view}/issues"),
        }
    }
}

impl fmt::Display for IssueScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Remote operations an issue store needs for one kind of scope.
///
/// One implementation serves every scope; the scope is passed to each call so
/// the binding can pick the matching path.
#[allow(async_fn_in_trait)]
pub trait IssueEndpoint: Send + Sync {
    /// Error type bubbled up from the transport.
    type Error: Into<StoreError> + Send;

    /// List the issues of a scope matching `params`.
    ///
    /// # Errors
    /// Returns a transport-specific error when the request fails.
    async fn list_issues(&self, scope: &IssueScope, params: &QueryParams) -> Result<Vec<Issue>, Self::Error>;

    /// Create an issue inside the scope.
    ///
    /// # Errors
    /// Returns a transport-specific error when the request fails.
    async fn create_issue(&self, scope: &IssueScope, draft: &IssueDraft) -> Result<Issue, Self::Error>;

    /// Apply a partial update and return the server copy.
    ///
    /// # Errors
    /// Returns a transport-specific error when the request fails.
    async fn update_issue(
        &self,
        scope: &IssueScope,
        issue: IssueId,
        patch: &IssuePatch,
    ) -> Result<Issue, Self::Error>;

    /// Delete an issue.
    ///
    /// # Errors
    /// Returns a transport-specific error when the request fails.
    async fn delete_issue(&self, scope: &IssueScope, issue: IssueId) -> Result<(), Self::Error>;

    /// Detach an issue from a cycle or module without deleting it.
    ///
    /// # Errors
    /// Returns a transport-specific error when the request fails.
    async fn remove_bridge(&self, scope: &IssueScope, issue: IssueId, bridge: BridgeId) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_scope_kind() {
        let project = ProjectId::new();
        let cycle = CycleId::new();
        assert_eq!(
            IssueScope::project("acme", project).path(),
            format!("workspaces/acme/projects/{project}/issues")
        );
        let scope = IssueScope::cycle("acme", project, cycle);
        assert!(scope.path().ends_with(&format!("cycles/{cycle}/cycle-issues")));
        assert!(scope.uses_bridge());
        assert!(!IssueScope::view("acme", project, ViewId::new()).uses_bridge());
    }
}
