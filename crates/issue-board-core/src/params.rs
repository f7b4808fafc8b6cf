//! Conversion of filters into the query parameters accepted by the remote API.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::filter::{DisplayFilters, FilterOptions, Layout, PartialFilterOptions, normalize_filters};

/// Error raised while handling query parameter names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// The name is not a parameter the API understands.
    #[error("unknown issue parameter: {0}")]
    UnknownParam(String),
}

/// Query parameter understood by the issue listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum IssueParam {
    Priority,
    StateGroup,
    State,
    Assignees,
    Mentions,
    CreatedBy,
    Labels,
    StartDate,
    TargetDate,
    Project,
    Subscriber,
    GroupBy,
    SubGroupBy,
    OrderBy,
    Type,
    SubIssue,
    StartTargetDate,
}

impl IssueParam {
    /// Every parameter.
    pub const ALL: [Self; 17] = [
        Self::Priority,
        Self::StateGroup,
        Self::State,
        Self::Assignees,
        Self::Mentions,
        Self::CreatedBy,
        Self::Labels,
        Self::StartDate,
        Self::TargetDate,
        Self::Project,
        Self::Subscriber,
        Self::GroupBy,
        Self::SubGroupBy,
        Self::OrderBy,
        Self::Type,
        Self::SubIssue,
        Self::StartTargetDate,
    ];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::StateGroup => "state_group",
            Self::State => "state",
            Self::Assignees => "assignees",
            Self::Mentions => "mentions",
            Self::CreatedBy => "created_by",
            Self::Labels => "labels",
            Self::StartDate => "start_date",
            Self::TargetDate => "target_date",
            Self::Project => "project",
            Self::Subscriber => "subscriber",
            Self::GroupBy => "group_by",
            Self::SubGroupBy => "sub_group_by",
            Self::OrderBy => "order_by",
            Self::Type => "type",
            Self::SubIssue => "sub_issue",
            Self::StartTargetDate => "start_target_date",
        }
    }
}

impl fmt::Display for IssueParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueParam {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|param| param.as_str() == token)
            .ok_or_else(|| ParamError::UnknownParam(s.to_owned()))
    }
}

impl Serialize for IssueParam {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(self.as_str())
    }
}

/// Parse a list of parameter names.
///
/// # Errors
/// Returns an error for the first name that is not a known parameter.
pub fn parse_params<S: AsRef<str>>(names: &[S]) -> Result<Vec<IssueParam>, ParamError> {
    names.iter().map(|name| name.as_ref().parse()).collect()
}

/// Wire-ready parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Scalar or comma-joined list.
    Text(String),
    /// Boolean toggle.
    Flag(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

/// Parameters selected for one request, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<IssueParam, ParamValue>);

impl QueryParams {
    /// Value of a parameter.
    #[must_use]
    pub fn get(&self, param: IssueParam) -> Option<&ParamValue> {
        self.0.get(&param)
    }

    /// Whether the parameter is present.
    #[must_use]
    pub fn contains(&self, param: IssueParam) -> bool {
        self.0.contains_key(&param)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (IssueParam, &ParamValue)> {
        self.0.iter().map(|(param, value)| (*param, value))
    }

    /// Insert a value, replacing any previous one.
    pub fn insert(&mut self, param: IssueParam, value: ParamValue) {
        self.0.insert(param, value);
    }

    /// Boolean value of a toggle parameter.
    #[must_use]
    pub fn flag(&self, param: IssueParam) -> Option<bool> {
        match self.get(param)? {
            ParamValue::Flag(flag) => Some(*flag),
            ParamValue::Text(text) => text.parse().ok(),
        }
    }

    /// Text value of a scalar parameter.
    #[must_use]
    pub fn text(&self, param: IssueParam) -> Option<&str> {
        match self.get(param)? {
            ParamValue::Text(text) => Some(text),
            ParamValue::Flag(_) => None,
        }
    }

    /// Render `(name, value)` pairs for an HTTP query string.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.iter()
            .map(|(param, value)| (param.as_str(), value.to_string()))
            .collect()
    }

    /// Rebuild the predicate fields encoded in these parameters.
    #[must_use]
    pub fn to_filter_options(&self) -> FilterOptions {
        let list = |param| self.text(param).map(|text| text.split(',').map(str::to_owned).collect());
        normalize_filters(&PartialFilterOptions {
            priority: list(IssueParam::Priority),
            state: list(IssueParam::State),
            state_group: list(IssueParam::StateGroup),
            assignees: list(IssueParam::Assignees),
            mentions: list(IssueParam::Mentions),
            created_by: list(IssueParam::CreatedBy),
            labels: list(IssueParam::Labels),
            start_date: list(IssueParam::StartDate),
            target_date: list(IssueParam::TargetDate),
            project: list(IssueParam::Project),
            subscriber: list(IssueParam::Subscriber),
        })
    }
}

const PREDICATES: [IssueParam; 11] = [
    IssueParam::Priority,
    IssueParam::StateGroup,
    IssueParam::State,
    IssueParam::Assignees,
    IssueParam::Mentions,
    IssueParam::CreatedBy,
    IssueParam::Labels,
    IssueParam::StartDate,
    IssueParam::TargetDate,
    IssueParam::Project,
    IssueParam::Subscriber,
];

const LIST_PARAMS: [IssueParam; 15] = concat_params(
    PREDICATES,
    [
        IssueParam::GroupBy,
        IssueParam::OrderBy,
        IssueParam::Type,
        IssueParam::SubIssue,
    ],
);

const KANBAN_PARAMS: [IssueParam; 16] = concat_params(
    PREDICATES,
    [
        IssueParam::GroupBy,
        IssueParam::SubGroupBy,
        IssueParam::OrderBy,
        IssueParam::Type,
        IssueParam::SubIssue,
    ],
);

const CALENDAR_PARAMS: [IssueParam; 13] = concat_params(PREDICATES, [IssueParam::Type, IssueParam::SubIssue]);

const SPREADSHEET_PARAMS: [IssueParam; 14] = concat_params(
    PREDICATES,
    [IssueParam::OrderBy, IssueParam::Type, IssueParam::SubIssue],
);

const GANTT_PARAMS: [IssueParam; 15] = concat_params(
    PREDICATES,
    [
        IssueParam::OrderBy,
        IssueParam::Type,
        IssueParam::SubIssue,
        IssueParam::StartTargetDate,
    ],
);

const fn concat_params<const A: usize, const B: usize, const C: usize>(
    head: [IssueParam; A],
    tail: [IssueParam; B],
) -> [IssueParam; C] {
    assert!(A + B == C, "parameter list length mismatch");
    let mut out = [IssueParam::Priority; C];
    let mut i = 0;
    while i < A {
        out[i] = head[i];
        i += 1;
    }
    let mut j = 0;
    while j < B {
        out[A + j] = tail[j];
        j += 1;
    }
    out
}

/// Parameters the API accepts for a layout.
#[must_use]
pub const fn acceptable_params(layout: Layout) -> &'static [IssueParam] {
    match layout {
        Layout::List => &LIST_PARAMS,
        Layout::Kanban => &KANBAN_PARAMS,
        Layout::Calendar => &CALENDAR_PARAMS,
        Layout::Spreadsheet => &SPREADSHEET_PARAMS,
        Layout::Gantt => &GANTT_PARAMS,
    }
}

fn joined(values: &[String]) -> Option<ParamValue> {
    (!values.is_empty()).then(|| ParamValue::Text(values.join(",")))
}

/// Serialize filters into query parameters, keeping only `acceptable` names.
///
/// Lists are comma-joined and omitted when empty; unset nullable display
/// filters are omitted; booleans pass through.
#[must_use]
pub fn filtered_params(
    filters: &FilterOptions,
    display: &DisplayFilters,
    acceptable: &[IssueParam],
) -> QueryParams {
    let text = |value: &str| Some(ParamValue::Text(value.to_owned()));
    let candidates: [(IssueParam, Option<ParamValue>); 17] = [
        (IssueParam::Priority, joined(&filters.priority)),
        (IssueParam::StateGroup, joined(&filters.state_group)),
        (IssueParam::State, joined(&filters.state)),
        (IssueParam::Assignees, joined(&filters.assignees)),
        (IssueParam::Mentions, joined(&filters.mentions)),
        (IssueParam::CreatedBy, joined(&filters.created_by)),
        (IssueParam::Labels, joined(&filters.labels)),
        (IssueParam::StartDate, joined(&filters.start_date)),
        (IssueParam::TargetDate, joined(&filters.target_date)),
        (IssueParam::Project, joined(&filters.project)),
        (IssueParam::Subscriber, joined(&filters.subscriber)),
        (
            IssueParam::GroupBy,
            display.group_by.and_then(|group| text(group.as_str())),
        ),
        (
            IssueParam::SubGroupBy,
            display.sub_group_by.and_then(|group| text(group.as_str())),
        ),
        (IssueParam::OrderBy, text(&display.order_by.to_string())),
        (
            IssueParam::Type,
            display.issue_type.and_then(|kind| text(kind.as_str())),
        ),
        (IssueParam::SubIssue, Some(ParamValue::Flag(display.sub_issue))),
        (
            IssueParam::StartTargetDate,
            Some(ParamValue::Flag(display.start_target_date)),
        ),
    ];

    let mut params = QueryParams::default();
    for (param, value) in candidates {
        if let Some(value) = value
            && acceptable.contains(&param)
        {
            params.insert(param, value);
        }
    }
    params
}

/// Serialize filters with the parameter list of the active layout.
#[must_use]
pub fn params_for_layout(filters: &FilterOptions, display: &DisplayFilters) -> QueryParams {
    filtered_params(filters, display, acceptable_params(display.layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{PartialDisplayFilters, normalize_display_filters};
    use crate::grouping::GroupBy;

    fn ok<T, E: fmt::Display>(result: Result<T, E>, context: &str) -> T {
        result.unwrap_or_else(|err| panic!("{context}: {err}"))
    }

    fn kanban() -> DisplayFilters {
        normalize_display_filters(&PartialDisplayFilters {
            layout: Some(Layout::Kanban),
            ..PartialDisplayFilters::default()
        })
    }

    #[test]
    fn joins_arrays_and_respects_acceptable_list() {
        let filters = normalize_filters(&PartialFilterOptions {
            priority: Some(vec!["urgent".into(), "high".into()]),
            labels: Some(vec!["bug".into()]),
            ..PartialFilterOptions::default()
        });
        let acceptable = ok(parse_params(&["priority", "group_by"]), "parse params");

        let params = filtered_params(&filters, &kanban(), &acceptable);

        assert_eq!(
            params.get(IssueParam::Priority),
            Some(&ParamValue::Text("urgent,high".into()))
        );
        assert_eq!(params.len(), 1);
        assert!(params.iter().all(|(param, _)| acceptable.contains(&param)));
    }

    #[test]
    fn empty_arrays_are_omitted() {
        let filters = normalize_filters(&PartialFilterOptions {
            priority: Some(vec![]),
            ..PartialFilterOptions::default()
        });
        let params = filtered_params(&filters, &kanban(), &IssueParam::ALL);
        assert!(!params.contains(IssueParam::Priority));
    }

    #[test]
    fn booleans_pass_through_and_nulls_are_omitted() {
        let mut display = kanban();
        display.sub_issue = true;
        display.group_by = Some(GroupBy::State);
        let params = filtered_params(&FilterOptions::default(), &display, &IssueParam::ALL);
        assert_eq!(params.flag(IssueParam::SubIssue), Some(true));
        assert_eq!(params.text(IssueParam::GroupBy), Some("state"));
        assert_eq!(params.text(IssueParam::OrderBy), Some("sort_order"));
        assert!(!params.contains(IssueParam::SubGroupBy));
        assert!(!params.contains(IssueParam::Type));
    }

    #[test]
    fn layout_lists_restrict_output() {
        let display = normalize_display_filters(&PartialDisplayFilters {
            layout: Some(Layout::Calendar),
            group_by: Some(Some(GroupBy::Priority)),
            ..PartialDisplayFilters::default()
        });
        let params = params_for_layout(&FilterOptions::default(), &display);
        assert!(!params.contains(IssueParam::GroupBy));
        assert!(!params.contains(IssueParam::StartTargetDate));
        assert!(params.contains(IssueParam::SubIssue));
        assert!(acceptable_params(Layout::Gantt).contains(&IssueParam::StartTargetDate));
    }

    #[test]
    fn unknown_param_names_are_rejected() {
        assert_eq!(
            parse_params(&["priority", "colour"]),
            Err(ParamError::UnknownParam("colour".into()))
        );
    }

    #[test]
    fn query_pairs_roundtrip_into_filter_options() {
        let filters = normalize_filters(&PartialFilterOptions {
            priority: Some(vec!["urgent".into(), "high".into()]),
            target_date: Some(vec!["2025-01-01;after".into()]),
            ..PartialFilterOptions::default()
        });
        let params = filtered_params(&filters, &kanban(), &IssueParam::ALL);
        let pairs = params.query_pairs();
        assert!(pairs.contains(&("priority", "urgent,high".to_owned())));
        assert!(pairs.contains(&("sub_issue", "false".to_owned())));
        assert_eq!(params.to_filter_options(), filters);
    }

    #[test]
    fn serializes_as_flat_object() {
        let filters = normalize_filters(&PartialFilterOptions {
            state: Some(vec!["a".into(), "b".into()]),
            ..PartialFilterOptions::default()
        });
        let params = filtered_params(&filters, &kanban(), &[IssueParam::State, IssueParam::SubIssue]);
        let value = ok(serde_json::to_value(&params), "serialize params");
        assert_eq!(value, serde_json::json!({"state": "a,b", "sub_issue": false}));
    }
}
