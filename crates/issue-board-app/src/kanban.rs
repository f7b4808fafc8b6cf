//! Kanban board layout and drag-and-drop planning.

use std::collections::BTreeSet;

use issue_board_core::catalog::GroupCatalog;
use issue_board_core::filter::DisplayFilters;
use issue_board_core::grouping::{GroupBy, GroupKey, GroupedIssues, group_keys};
use issue_board_core::id::{IssueId, LabelId, MemberId, StateId};
use issue_board_core::issue::{Issue, Priority};
use issue_board_core::order::OrderBy;
use issue_board_core::sort_order::sort_order_at;
use serde::Serialize;

use crate::collection::IssueCollection;
use crate::error::StoreError;
use crate::patch::IssuePatch;
use crate::projection::{IssueProjection, effective_group_by, effective_order_by, effective_sub_group_by};

/// One column of the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KanbanColumn {
    /// Group key of the column.
    pub key: GroupKey,
    /// Cards in display order.
    pub issues: Vec<IssueId>,
}

/// A swimlane. Boards without swimlanes have a single lane keyed `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KanbanLane {
    /// Swimlane key, absent when the board has no swimlanes.
    pub key: Option<GroupKey>,
    /// Columns, identical in every lane.
    pub columns: Vec<KanbanColumn>,
}

/// Kanban board ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KanbanBoard {
    /// Column dimension.
    pub group_by: GroupBy,
    /// Swimlane dimension.
    pub sub_group_by: Option<GroupBy>,
    /// Lanes in display order.
    pub lanes: Vec<KanbanLane>,
}

impl KanbanBoard {
    /// Arrange a projection into lanes and columns.
    ///
    /// Columns and lanes follow catalog order, then any remaining keys, with
    /// the `None` bucket last.
    #[must_use]
    pub fn build(projection: &IssueProjection, display: &DisplayFilters, catalog: &GroupCatalog) -> Self {
        let group_by = effective_group_by(display).unwrap_or(GroupBy::State);
        let sub_group_by = effective_sub_group_by(display);

        let lanes = match projection {
            IssueProjection::Grouped(groups) => vec![KanbanLane {
                key: None,
                columns: columns(groups, &ordered_keys(groups.keys(), group_by, catalog)),
            }],
            IssueProjection::SubGrouped(lanes) => {
                let column_keys = ordered_keys(lanes.values().flat_map(|lane| lane.keys()), group_by, catalog);
                let lane_keys = sub_group_by.map_or_else(
                    || lanes.keys().cloned().collect(),
                    |sub_group_by| ordered_keys(lanes.keys(), sub_group_by, catalog),
                );
                lane_keys
                    .into_iter()
                    .filter_map(|key| {
                        let groups = lanes.get(&key)?;
                        Some(KanbanLane {
                            key: Some(key),
                            columns: columns(groups, &column_keys),
                        })
                    })
                    .collect()
            }
            IssueProjection::Ungrouped(ids) => vec![KanbanLane {
                key: None,
                columns: vec![KanbanColumn {
                    key: GroupKey::None,
                    issues: ids.clone(),
                }],
            }],
        };

        Self {
            group_by,
            sub_group_by,
            lanes,
        }
    }

    /// Every card position of an issue as `(lane, column, index)`.
    #[must_use]
    pub fn positions(&self, issue: IssueId) -> Vec<(Option<GroupKey>, GroupKey, usize)> {
        let mut found = Vec::new();
        for lane in &self.lanes {
            for column in &lane.columns {
                if let Some(index) = column.issues.iter().position(|id| *id == issue) {
                    found.push((lane.key.clone(), column.key.clone(), index));
                }
            }
        }
        found
    }
}

fn ordered_keys<'a>(
    present: impl IntoIterator<Item = &'a GroupKey>,
    group_by: GroupBy,
    catalog: &GroupCatalog,
) -> Vec<GroupKey> {
    let present: BTreeSet<GroupKey> = present.into_iter().cloned().collect();
    let mut keys: Vec<GroupKey> = group_keys(group_by, catalog)
        .into_iter()
        .filter(|key| present.contains(key))
        .collect();
    for key in &present {
        if *key != GroupKey::None && !keys.contains(key) {
            keys.push(key.clone());
        }
    }
    if present.contains(&GroupKey::None) {
        keys.push(GroupKey::None);
    }
    keys
}

fn columns(groups: &GroupedIssues, keys: &[GroupKey]) -> Vec<KanbanColumn> {
    keys.iter()
        .map(|key| KanbanColumn {
            key: key.clone(),
            issues: groups.get(key).cloned().unwrap_or_default(),
        })
        .collect()
}

/// Group (and swimlane) a card is dropped into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    /// Destination column key.
    pub group: GroupKey,
    /// Destination swimlane key.
    pub sub_group: Option<GroupKey>,
    /// Position within the destination column.
    pub index: usize,
}

/// Column (and swimlane) a card is dragged out of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSource {
    /// Source column key.
    pub group: GroupKey,
    /// Source swimlane key.
    pub sub_group: Option<GroupKey>,
}

/// A card drag from one place of a grouped layout to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragMove {
    /// Dragged issue.
    pub issue: IssueId,
    /// Where the card was picked up; multi-valued dimensions drop this value.
    pub source: Option<DragSource>,
    /// Where the card was dropped.
    pub destination: DropTarget,
}

/// Compute the patch that realizes a drag.
///
/// The group-defining attribute is rewritten to the destination key, and when
/// the layout is ordered manually the sort order is placed between the
/// destination neighbours (the dragged issue excluded). Fields that already
/// hold the target value are dropped, so re-applying the same drag yields an
/// empty patch.
///
/// # Errors
/// Returns [`StoreError::NotFound`] for an unknown issue and
/// [`StoreError::Validation`] when the dimension cannot be edited by dragging
/// or the destination key does not parse.
pub fn plan_move(
    drag: &DragMove,
    collection: &IssueCollection,
    projection: &IssueProjection,
    display: &DisplayFilters,
) -> Result<IssuePatch, StoreError> {
    let issue = collection.get(drag.issue).ok_or(StoreError::NotFound(drag.issue))?;
    let mut patch = IssuePatch::default();

    if let Some(group_by) = effective_group_by(display) {
        let source = drag.source.as_ref().map(|source| &source.group);
        rewrite_group(&mut patch, issue, group_by, source, &drag.destination.group)?;
    }
    if let (Some(sub_group_by), Some(lane)) = (effective_sub_group_by(display), &drag.destination.sub_group) {
        let source = drag.source.as_ref().and_then(|source| source.sub_group.as_ref());
        rewrite_group(&mut patch, issue, sub_group_by, source, lane)?;
    }

    if effective_order_by(display) == OrderBy::SORT_ORDER {
        let neighbours: Vec<f64> = destination_ids(projection, &drag.destination)
            .iter()
            .filter(|id| **id != drag.issue)
            .filter_map(|id| collection.get(*id))
            .map(|neighbour| neighbour.sort_order)
            .collect();
        patch.sort_order = Some(sort_order_at(&neighbours, drag.destination.index));
    }

    Ok(patch.changes_against(issue))
}

fn destination_ids<'a>(projection: &'a IssueProjection, destination: &DropTarget) -> &'a [IssueId] {
    match projection {
        IssueProjection::Ungrouped(ids) => ids,
        _ => projection
            .group(&destination.group, destination.sub_group.as_ref())
            .unwrap_or_default(),
    }
}

fn rewrite_group(
    patch: &mut IssuePatch,
    issue: &Issue,
    group_by: GroupBy,
    source: Option<&GroupKey>,
    destination: &GroupKey,
) -> Result<(), StoreError> {
    match group_by {
        GroupBy::State => patch.state = Some(parse_key::<StateId>(destination, group_by)?),
        GroupBy::Priority => {
            patch.priority = Some(parse_key::<Priority>(destination, group_by)?.unwrap_or_default());
        }
        GroupBy::TargetDate => {
            patch.target_date = Some(match destination {
                GroupKey::None => None,
                GroupKey::Date(date) => Some(*date),
                GroupKey::Value(value) => {
                    return Err(StoreError::validation(format!("'{value}' is not a date")));
                }
            });
        }
        GroupBy::Labels => {
            let source = source.map(|key| parse_key::<LabelId>(key, group_by)).transpose()?.flatten();
            let destination = parse_key::<LabelId>(destination, group_by)?;
            patch.labels = Some(swap_member(&issue.labels, source, destination));
        }
        GroupBy::Assignees => {
            let source = source.map(|key| parse_key::<MemberId>(key, group_by)).transpose()?.flatten();
            let destination = parse_key::<MemberId>(destination, group_by)?;
            patch.assignees = Some(swap_member(&issue.assignees, source, destination));
        }
        GroupBy::StateGroup | GroupBy::CreatedBy | GroupBy::Project => {
            if source == Some(destination) {
                return Ok(());
            }
            return Err(StoreError::validation(format!(
                "issues cannot be moved between {group_by} groups"
            )));
        }
    }
    Ok(())
}

fn parse_key<T: std::str::FromStr>(key: &GroupKey, group_by: GroupBy) -> Result<Option<T>, StoreError> {
    match key {
        GroupKey::None => Ok(None),
        GroupKey::Value(value) => value
            .parse()
            .map(Some)
            .map_err(|_| StoreError::validation(format!("'{value}' is not a valid {group_by} value"))),
        GroupKey::Date(date) => Err(StoreError::validation(format!(
            "'{date}' is not a valid {group_by} value"
        ))),
    }
}

/// Replace `source` with `destination` in a multi-valued attribute.
///
/// Dropping into the `None` column clears the attribute.
fn swap_member<T: Copy + PartialEq>(current: &[T], source: Option<T>, destination: Option<T>) -> Vec<T> {
    let Some(destination) = destination else {
        return Vec::new();
    };
    let mut next: Vec<T> = current
        .iter()
        .copied()
        .filter(|value| Some(*value) != source)
        .collect();
    if !next.contains(&destination) {
        next.push(destination);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::project;
    use issue_board_core::catalog::StateInfo;
    use issue_board_core::filter::Layout;
    use issue_board_core::id::ProjectId;
    use issue_board_core::issue::StateGroup;
    use issue_board_core::order::OrderKey;

    struct Fixture {
        todo: StateId,
        done: StateId,
        catalog: GroupCatalog,
        collection: IssueCollection,
    }

    fn fixture() -> Fixture {
        let todo = StateId::new();
        let done = StateId::new();
        let catalog = GroupCatalog::permissive().with_states([
            StateInfo::new(todo, "Todo", StateGroup::Unstarted, 1.0),
            StateInfo::new(done, "Done", StateGroup::Completed, 2.0),
        ]);
        let project = ProjectId::new();
        let issues = [("A", todo, 100.0), ("B", todo, 200.0), ("C", done, 100.0), ("D", done, 300.0)]
            .into_iter()
            .map(|(title, state, sort_order)| {
                let mut issue = Issue::new(IssueId::new(), project, title);
                issue.state = Some(state);
                issue.sort_order = sort_order;
                issue
            });
        Fixture {
            todo,
            done,
            catalog,
            collection: IssueCollection::from_issues(issues),
        }
    }

    fn id_of(collection: &IssueCollection, title: &str) -> IssueId {
        collection
            .iter()
            .find(|issue| issue.title == title)
            .map(|issue| issue.id)
            .unwrap_or_else(|| panic!("missing issue {title}"))
    }

    fn kanban() -> DisplayFilters {
        DisplayFilters {
            layout: Layout::Kanban,
            group_by: Some(GroupBy::State),
            ..DisplayFilters::default()
        }
    }

    fn ok<T>(result: Result<T, StoreError>, context: &str) -> T {
        result.unwrap_or_else(|err| panic!("{context}: {err}"))
    }

    #[test]
    fn drag_between_columns_rewrites_state_and_sort_order() {
        let mut fx = fixture();
        let a = id_of(&fx.collection, "A");
        let display = kanban();
        let projection = project(fx.collection.iter(), &display, &fx.catalog);
        let drag = DragMove {
            issue: a,
            source: Some(DragSource {
                group: GroupKey::value(fx.todo),
                sub_group: None,
            }),
            destination: DropTarget {
                group: GroupKey::value(fx.done),
                sub_group: None,
                index: 1,
            },
        };

        let patch = ok(plan_move(&drag, &fx.collection, &projection, &display), "plan move");
        assert_eq!(patch.state, Some(Some(fx.done)));
        assert_eq!(patch.sort_order, Some(200.0));

        fx.collection.patch(a, &patch);
        let projection = project(fx.collection.iter(), &display, &fx.catalog);
        let todo = projection.group(&GroupKey::value(fx.todo), None).unwrap_or_default();
        let done = projection.group(&GroupKey::value(fx.done), None).unwrap_or_default();
        assert!(!todo.contains(&a));
        assert_eq!(done.iter().filter(|id| **id == a).count(), 1);
        assert_eq!(done[1], a);

        let again = ok(plan_move(&drag, &fx.collection, &projection, &display), "replan move");
        assert!(again.is_empty());
    }

    #[test]
    fn reorder_within_column_only_touches_sort_order() {
        let fx = fixture();
        let b = id_of(&fx.collection, "B");
        let display = kanban();
        let projection = project(fx.collection.iter(), &display, &fx.catalog);
        let drag = DragMove {
            issue: b,
            source: None,
            destination: DropTarget {
                group: GroupKey::value(fx.todo),
                sub_group: None,
                index: 0,
            },
        };
        let patch = ok(plan_move(&drag, &fx.collection, &projection, &display), "plan move");
        assert_eq!(
            patch,
            IssuePatch {
                sort_order: Some(100.0 - issue_board_core::sort_order::SORT_ORDER_STEP),
                ..IssuePatch::default()
            }
        );
    }

    #[test]
    fn non_manual_order_keeps_sort_order() {
        let fx = fixture();
        let a = id_of(&fx.collection, "A");
        let display = DisplayFilters {
            order_by: OrderBy::desc(OrderKey::CreatedAt),
            ..kanban()
        };
        let projection = project(fx.collection.iter(), &display, &fx.catalog);
        let drag = DragMove {
            issue: a,
            source: None,
            destination: DropTarget {
                group: GroupKey::value(fx.done),
                sub_group: None,
                index: 0,
            },
        };
        let patch = ok(plan_move(&drag, &fx.collection, &projection, &display), "plan move");
        assert_eq!(patch.sort_order, None);
        assert_eq!(patch.state, Some(Some(fx.done)));
    }

    #[test]
    fn label_moves_swap_the_source_label() {
        let bug = LabelId::new();
        let ui = LabelId::new();
        let mut issue = Issue::new(IssueId::new(), ProjectId::new(), "labelled");
        issue.labels = vec![bug];
        let id = issue.id;
        let collection = IssueCollection::from_issues([issue]);
        let display = DisplayFilters {
            group_by: Some(GroupBy::Labels),
            order_by: OrderBy::desc(OrderKey::CreatedAt),
            ..kanban()
        };
        let projection = project(collection.iter(), &display, &GroupCatalog::permissive());
        let drag = DragMove {
            issue: id,
            source: Some(DragSource {
                group: GroupKey::value(bug),
                sub_group: None,
            }),
            destination: DropTarget {
                group: GroupKey::value(ui),
                sub_group: None,
                index: 0,
            },
        };
        let patch = ok(plan_move(&drag, &collection, &projection, &display), "plan move");
        assert_eq!(patch.labels, Some(vec![ui]));
    }

    #[test]
    fn read_only_dimensions_are_rejected() {
        let fx = fixture();
        let a = id_of(&fx.collection, "A");
        let display = DisplayFilters {
            group_by: Some(GroupBy::CreatedBy),
            ..kanban()
        };
        let projection = project(fx.collection.iter(), &display, &fx.catalog);
        let drag = DragMove {
            issue: a,
            source: None,
            destination: DropTarget {
                group: GroupKey::None,
                sub_group: None,
                index: 0,
            },
        };
        let err = plan_move(&drag, &fx.collection, &projection, &display).err();
        assert!(matches!(err, Some(StoreError::Validation(_))));
    }

    #[test]
    fn board_orders_columns_by_catalog_with_none_last() {
        let mut fx = fixture();
        let orphan = Issue::new(IssueId::new(), ProjectId::new(), "orphan");
        fx.collection.upsert(orphan);
        let display = kanban();
        let projection = project(fx.collection.iter(), &display, &fx.catalog);
        let board = KanbanBoard::build(&projection, &display, &fx.catalog);
        let keys: Vec<GroupKey> = board.lanes[0].columns.iter().map(|c| c.key.clone()).collect();
        assert_eq!(
            keys,
            vec![GroupKey::value(fx.todo), GroupKey::value(fx.done), GroupKey::None]
        );
        let a = id_of(&fx.collection, "A");
        assert_eq!(board.positions(a), vec![(None, GroupKey::value(fx.todo), 0)]);
    }

    #[test]
    fn swimlanes_share_the_same_columns() {
        let fx = fixture();
        let display = DisplayFilters {
            sub_group_by: Some(GroupBy::Priority),
            ..kanban()
        };
        let mut collection = fx.collection.clone();
        let c = id_of(&collection, "C");
        collection.patch(
            c,
            &IssuePatch {
                priority: Some(Priority::High),
                ..IssuePatch::default()
            },
        );
        let projection = project(collection.iter(), &display, &fx.catalog);
        let board = KanbanBoard::build(&projection, &display, &fx.catalog);
        let lanes: Vec<Option<GroupKey>> = board.lanes.iter().map(|lane| lane.key.clone()).collect();
        assert_eq!(
            lanes,
            vec![Some(GroupKey::value("high")), Some(GroupKey::value("none"))]
        );
        assert!(board.lanes.iter().all(|lane| lane.columns.len() == 2));
        assert_eq!(
            board.positions(c),
            vec![(Some(GroupKey::value("high")), GroupKey::value(fx.done), 0)]
        );
    }
}
