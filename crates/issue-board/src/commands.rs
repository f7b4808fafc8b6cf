use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use issue_board_app::{
    BoardConfig, BoardService, CalendarView, DragMove, DragSource, DropTarget, FilterUpdate, IssuePatch,
    IssueProjection, IssueScope, JsonFileFilterStorage, KanbanBoard,
};
use issue_board_core::catalog::GroupCatalog;
use issue_board_core::filter::{
    Layout, PartialDisplayFilters, PartialFilterOptions, normalize_display_filters, normalize_filters,
};
use issue_board_core::grouping::{GroupBy, GroupKey, GroupedIssues};
use issue_board_core::id::{IssueId, ProjectId, StateId};
use issue_board_core::issue::{Priority, parse_date};
use issue_board_core::order::OrderBy;
use issue_board_core::params::params_for_layout;
use issue_board_store_json::{JsonFileEndpoint, JsonIssueStore};
use serde::Serialize;
use time::{Date, OffsetDateTime};
use tracing::info;

use crate::Command;

type Service = BoardService<JsonFileEndpoint, JsonFileFilterStorage>;

/// An opened board: the document, its scope and the composed service.
struct Session {
    service: Service,
    document: JsonIssueStore,
    scope: IssueScope,
}

impl Session {
    fn open(workdir: &Path, file: &Path, project: Option<&str>) -> Result<Self> {
        let config = BoardConfig::from_workdir(workdir)?;
        let document = JsonIssueStore::open(file)?;
        let project = resolve_project(&document, project)?;
        let scope = IssueScope::project(config.workspace.slug.clone(), project);
        let storage = JsonFileFilterStorage::new(config.filters_path());
        let service = BoardService::new(JsonFileEndpoint::new(document.clone()), storage, config);
        Ok(Self {
            service,
            document,
            scope,
        })
    }

    fn catalog(&self) -> Result<GroupCatalog> {
        Ok(self.document.load()?.catalog)
    }
}

fn resolve_project(document: &JsonIssueStore, explicit: Option<&str>) -> Result<ProjectId> {
    if let Some(project) = explicit {
        return project
            .parse()
            .with_context(|| format!("invalid project id: {project}"));
    }
    let projects: BTreeSet<ProjectId> = document.load()?.issues.iter().map(|issue| issue.project).collect();
    let mut iter = projects.iter();
    match (iter.next(), iter.next()) {
        (Some(project), None) => Ok(*project),
        (None, _) => bail!("the document has no issues; pass --project"),
        (Some(_), Some(_)) => bail!("the document spans {} projects; pass --project", projects.len()),
    }
}

pub fn run(workdir: &Path, project: Option<&str>, command: Command) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    match command {
        Command::Show {
            file,
            layout,
            group_by,
            sub_group_by,
            order_by,
            date,
        } => {
            let session = Session::open(workdir, &file, project)?;
            let update = display_update(
                layout.as_deref(),
                group_by.as_deref(),
                sub_group_by.as_deref(),
                order_by.as_deref(),
            )?;
            let active = date.as_deref().map(parse_date).transpose()?;
            runtime.block_on(handle_show(&session, update, active))
        }
        Command::Params { filters, layout } => handle_params(&filters, layout.as_deref()),
        Command::Update {
            file,
            issue,
            title,
            priority,
            state,
        } => {
            let session = Session::open(workdir, &file, project)?;
            let issue = parse_issue(&issue)?;
            let patch = build_patch(title, priority.as_deref(), state.as_deref())?;
            runtime.block_on(handle_update(&session, issue, patch))
        }
        Command::Move {
            file,
            issue,
            group,
            from,
            lane,
            index,
        } => {
            let session = Session::open(workdir, &file, project)?;
            let drag = DragMove {
                issue: parse_issue(&issue)?,
                source: from.map(|from| DragSource {
                    group: GroupKey::parse(&from),
                    sub_group: None,
                }),
                destination: DropTarget {
                    group: GroupKey::parse(&group),
                    sub_group: lane.as_deref().map(GroupKey::parse),
                    index,
                },
            };
            runtime.block_on(handle_move(&session, &drag))
        }
        Command::Rm { file, issue } => {
            let session = Session::open(workdir, &file, project)?;
            let issue = parse_issue(&issue)?;
            runtime.block_on(handle_rm(&session, issue))
        }
    }
}

fn parse_issue(input: &str) -> Result<IssueId> {
    input.parse().with_context(|| format!("invalid issue id: {input}"))
}

fn display_update(
    layout: Option<&str>,
    group_by: Option<&str>,
    sub_group_by: Option<&str>,
    order_by: Option<&str>,
) -> Result<Option<PartialDisplayFilters>> {
    let update = PartialDisplayFilters {
        layout: layout.map(str::parse::<Layout>).transpose()?,
        group_by: group_by.map(parse_group_by).transpose()?,
        sub_group_by: sub_group_by.map(parse_group_by).transpose()?,
        order_by: order_by.map(str::parse::<OrderBy>).transpose()?,
        ..PartialDisplayFilters::default()
    };
    Ok((update != PartialDisplayFilters::default()).then_some(update))
}

/// `none` clears the grouping.
fn parse_group_by(input: &str) -> Result<Option<GroupBy>> {
    if input.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    Ok(Some(input.parse()?))
}

fn build_patch(title: Option<String>, priority: Option<&str>, state: Option<&str>) -> Result<IssuePatch> {
    let patch = IssuePatch {
        title,
        priority: priority.map(str::parse::<Priority>).transpose()?,
        state: state
            .map(|state| match GroupKey::parse(state) {
                GroupKey::None => Ok(None),
                _ => state
                    .parse::<StateId>()
                    .map(Some)
                    .with_context(|| format!("invalid state id: {state}")),
            })
            .transpose()?,
        ..IssuePatch::default()
    };
    if patch.is_empty() {
        bail!("nothing to update; pass --title, --priority or --state");
    }
    Ok(patch)
}

#[derive(Serialize)]
struct ShowOutput {
    layout: Layout,
    view: serde_json::Value,
    titles: BTreeMap<IssueId, String>,
}

async fn handle_show(session: &Session, update: Option<PartialDisplayFilters>, active: Option<Date>) -> Result<()> {
    let service = &session.service;
    let scope = &session.scope;
    let mut filters = service.open_view(scope).await?;
    if let Some(update) = update {
        filters = service
            .apply_filters(scope, FilterUpdate::DisplayFilters(update))
            .await?;
    }

    let catalog = session.catalog()?;
    let display = filters.display_filters;
    let projection = service.issues().projection(scope, &display, &catalog).await;
    let view = match display.layout {
        Layout::Kanban => serde_json::to_value(KanbanBoard::build(&projection, &display, &catalog))?,
        Layout::Calendar => {
            let groups = match projection.as_ref() {
                IssueProjection::Grouped(groups) => groups.clone(),
                _ => GroupedIssues::new(),
            };
            let active = active.unwrap_or_else(|| OffsetDateTime::now_utc().date());
            serde_json::to_value(CalendarView::build(active, display.calendar, &groups))?
        }
        Layout::List | Layout::Spreadsheet | Layout::Gantt => serde_json::to_value(projection.as_ref())?,
    };
    let titles = service
        .issues()
        .issues(scope)
        .await
        .into_iter()
        .filter(|issue| projection.contains(issue.id))
        .map(|issue| (issue.id, issue.title))
        .collect();

    let output = ShowOutput {
        layout: display.layout,
        view,
        titles,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn handle_params(filters: &str, layout: Option<&str>) -> Result<()> {
    let filters: PartialFilterOptions = serde_json::from_str(filters).context("failed to parse --filters")?;
    let display = normalize_display_filters(&PartialDisplayFilters {
        layout: layout.map(str::parse::<Layout>).transpose()?,
        ..PartialDisplayFilters::default()
    });
    let params = params_for_layout(&normalize_filters(&filters), &display);
    println!("{}", serde_json::to_string_pretty(&params)?);
    Ok(())
}

async fn handle_update(session: &Session, issue: IssueId, patch: IssuePatch) -> Result<()> {
    let service = &session.service;
    service.open_view(&session.scope).await?;
    let updated = service
        .issues()
        .update_issue(&session.scope, issue, &patch)
        .await
        .with_context(|| format!("failed to update issue {issue}"))?;
    info!(%issue, "issue updated");
    println!("{}", serde_json::to_string_pretty(&updated)?);
    Ok(())
}

/// Where a card sits after a move.
#[derive(Debug, PartialEq, Eq, Serialize)]
struct Placement {
    lane: Option<GroupKey>,
    group: GroupKey,
    index: usize,
}

#[derive(Serialize)]
struct MoveOutput {
    issue: IssueId,
    moved: bool,
    placements: Vec<Placement>,
}

fn placements(board: &KanbanBoard, issue: IssueId) -> Vec<Placement> {
    board
        .positions(issue)
        .into_iter()
        .map(|(lane, group, index)| Placement { lane, group, index })
        .collect()
}

async fn handle_move(session: &Session, drag: &DragMove) -> Result<()> {
    let service = &session.service;
    let filters = service.open_view(&session.scope).await?;
    let catalog = session.catalog()?;
    let display = filters.display_filters;
    let moved = service
        .issues()
        .move_issue(&session.scope, drag, &display, &catalog)
        .await
        .with_context(|| format!("failed to move issue {}", drag.issue))?;
    if moved.is_none() {
        info!(issue = %drag.issue, "issue already in place");
    }

    let projection = service.issues().projection(&session.scope, &display, &catalog).await;
    let board = KanbanBoard::build(&projection, &display, &catalog);
    let output = MoveOutput {
        issue: drag.issue,
        moved: moved.is_some(),
        placements: placements(&board, drag.issue),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn handle_rm(session: &Session, issue: IssueId) -> Result<()> {
    let service = &session.service;
    service.open_view(&session.scope).await?;
    service
        .issues()
        .remove_issue(&session.scope, issue)
        .await
        .with_context(|| format!("failed to remove issue {issue}"))?;
    println!("removed {issue}");
    Ok(())
}
