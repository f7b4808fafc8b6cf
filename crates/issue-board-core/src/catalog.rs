//! Known group values (states, labels, members, projects).

use serde::{Deserialize, Serialize};

use crate::id::{LabelId, MemberId, ProjectId, StateId};
use crate::issue::StateGroup;

/// Workflow state definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateInfo {
    /// State identifier.
    pub id: StateId,
    /// Display name.
    pub name: String,
    /// Group the state belongs to.
    pub group: StateGroup,
    /// Position within the workflow.
    #[serde(default)]
    pub sequence: f64,
}

impl StateInfo {
    /// Create a state definition.
    pub fn new(id: StateId, name: impl Into<String>, group: StateGroup, sequence: f64) -> Self {
        Self {
            id,
            name: name.into(),
            group,
            sequence,
        }
    }
}

/// Catalog of values that currently exist for each groupable dimension.
///
/// A dimension that was never populated is permissive: any value is accepted.
/// Once populated, values missing from it are treated as deleted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupCatalog {
    #[serde(default)]
    states: Option<Vec<StateInfo>>,
    #[serde(default)]
    labels: Option<Vec<LabelId>>,
    #[serde(default)]
    members: Option<Vec<MemberId>>,
    #[serde(default)]
    projects: Option<Vec<ProjectId>>,
}

impl GroupCatalog {
    /// Catalog that accepts every value.
    #[must_use]
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Register workflow states, ordered by their sequence.
    #[must_use]
    pub fn with_states(mut self, states: impl IntoIterator<Item = StateInfo>) -> Self {
        let mut states: Vec<StateInfo> = states.into_iter().collect();
        states.sort_by(|a, b| a.sequence.total_cmp(&b.sequence).then(a.id.cmp(&b.id)));
        self.states = Some(states);
        self
    }

    /// Register existing labels in display order.
    #[must_use]
    pub fn with_labels(mut self, labels: impl IntoIterator<Item = LabelId>) -> Self {
        self.labels = Some(labels.into_iter().collect());
        self
    }

    /// Register workspace members in display order.
    #[must_use]
    pub fn with_members(mut self, members: impl IntoIterator<Item = MemberId>) -> Self {
        self.members = Some(members.into_iter().collect());
        self
    }

    /// Register projects in display order.
    #[must_use]
    pub fn with_projects(mut self, projects: impl IntoIterator<Item = ProjectId>) -> Self {
        self.projects = Some(projects.into_iter().collect());
        self
    }

    /// Registered states, if the dimension is populated.
    #[must_use]
    pub fn states(&self) -> Option<&[StateInfo]> {
        self.states.as_deref()
    }

    /// Registered labels, if the dimension is populated.
    #[must_use]
    pub fn labels(&self) -> Option<&[LabelId]> {
        self.labels.as_deref()
    }

    /// Registered members, if the dimension is populated.
    #[must_use]
    pub fn members(&self) -> Option<&[MemberId]> {
        self.members.as_deref()
    }

    /// Registered projects, if the dimension is populated.
    #[must_use]
    pub fn projects(&self) -> Option<&[ProjectId]> {
        self.projects.as_deref()
    }

    /// Look up a state definition.
    #[must_use]
    pub fn state(&self, id: StateId) -> Option<&StateInfo> {
        self.states.as_ref()?.iter().find(|state| state.id == id)
    }

    /// Resolve the state group for a state id.
    #[must_use]
    pub fn state_group(&self, id: StateId) -> Option<StateGroup> {
        self.state(id).map(|state| state.group)
    }

    /// Whether the state is still defined.
    #[must_use]
    pub fn knows_state(&self, id: StateId) -> bool {
        self.states
            .as_ref()
            .is_none_or(|states| states.iter().any(|state| state.id == id))
    }

    /// Whether the label is still defined.
    #[must_use]
    pub fn knows_label(&self, id: LabelId) -> bool {
        self.labels.as_ref().is_none_or(|labels| labels.contains(&id))
    }

    /// Whether the member is still part of the workspace.
    #[must_use]
    pub fn knows_member(&self, id: MemberId) -> bool {
        self.members.as_ref().is_none_or(|members| members.contains(&id))
    }

    /// Whether the project is still defined.
    #[must_use]
    pub fn knows_project(&self, id: ProjectId) -> bool {
        self.projects.as_ref().is_none_or(|projects| projects.contains(&id))
    }
}
