#![allow(missing_docs)]

use anyhow::Result;
use issue_board_app::{
    DragMove, DropTarget, ErrorKind, IssuePatch, IssueProjection, IssueScope, IssueStore, LoadKind, StoreError,
};
use issue_board_core::{
    GroupBy, GroupCatalog, GroupKey, Issue, IssueDraft, IssueFilters, IssueId, Layout, PartialDisplayFilters,
    PartialFilterOptions, PartialIssueFilters, Priority, ProjectId, normalize_issue_filters,
};
use issue_board_store_json::{IssueDocument, JsonFileEndpoint, JsonIssueStore};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    document: JsonIssueStore,
    scope: IssueScope,
    high: IssueId,
    none: IssueId,
}

fn fixture() -> Result<Fixture> {
    let dir = tempfile::tempdir()?;
    let project = ProjectId::new();
    let mut high = Issue::new(IssueId::new(), project, "Ship release");
    high.priority = Priority::High;
    high.sort_order = 1000.0;
    let none = Issue::new(IssueId::new(), project, "Write notes");

    let document = JsonIssueStore::create(
        dir.path().join("issues.json"),
        &IssueDocument {
            catalog: GroupCatalog::permissive(),
            issues: vec![high.clone(), none.clone()],
        },
    )?;
    Ok(Fixture {
        _dir: dir,
        document,
        scope: IssueScope::project("acme", project),
        high: high.id,
        none: none.id,
    })
}

fn kanban_by_priority(filters: PartialFilterOptions) -> IssueFilters {
    normalize_issue_filters(&PartialIssueFilters {
        filters,
        display_filters: PartialDisplayFilters {
            layout: Some(Layout::Kanban),
            group_by: Some(Some(GroupBy::Priority)),
            ..PartialDisplayFilters::default()
        },
        ..PartialIssueFilters::default()
    })
}

#[tokio::test]
async fn fetch_sends_filters_to_the_document() -> Result<()> {
    let fx = fixture()?;
    let store = IssueStore::new(JsonFileEndpoint::new(fx.document.clone()));
    let filters = kanban_by_priority(PartialFilterOptions {
        priority: Some(vec!["high".into()]),
        ..PartialFilterOptions::default()
    });

    let fetched = store.fetch_issues(&fx.scope, &filters, LoadKind::InitLoader).await?;
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].id, fx.high);

    let projection = store
        .projection(&fx.scope, &filters.display_filters, &GroupCatalog::permissive())
        .await;
    let IssueProjection::Grouped(groups) = projection.as_ref() else {
        panic!("kanban without swimlanes is grouped");
    };
    assert_eq!(groups.get(&GroupKey::value("high")), Some(&vec![fx.high]));
    Ok(())
}

#[tokio::test]
async fn drag_writes_through_to_the_document() -> Result<()> {
    let fx = fixture()?;
    let store = IssueStore::new(JsonFileEndpoint::new(fx.document.clone()));
    let filters = kanban_by_priority(PartialFilterOptions::default());
    store.fetch_issues(&fx.scope, &filters, LoadKind::InitLoader).await?;

    let drag = DragMove {
        issue: fx.none,
        source: None,
        destination: DropTarget {
            group: GroupKey::value("high"),
            sub_group: None,
            index: 0,
        },
    };
    let moved = store
        .move_issue(&fx.scope, &drag, &filters.display_filters, &GroupCatalog::permissive())
        .await?;
    let Some(moved) = moved else {
        panic!("drag into another column changes the issue");
    };
    assert_eq!(moved.priority, Priority::High);
    assert!(moved.sort_order < 1000.0);

    let on_disk = fx.document.load()?;
    let stored = on_disk.issues.iter().find(|issue| issue.id == fx.none);
    assert_eq!(stored.map(|issue| issue.priority), Some(Priority::High));
    Ok(())
}

#[tokio::test]
async fn create_then_remove_round_trips_through_the_file() -> Result<()> {
    let fx = fixture()?;
    let store = IssueStore::new(JsonFileEndpoint::new(fx.document.clone()));
    store
        .fetch_issues(&fx.scope, &IssueFilters::default(), LoadKind::InitLoader)
        .await?;

    let created = store.create_issue(&fx.scope, &IssueDraft::titled("Triage")).await?;
    assert_eq!(fx.document.load()?.issues.len(), 3);
    assert!(store.issue(&fx.scope, created.id).await.is_some());

    store.remove_issue(&fx.scope, created.id).await?;
    assert_eq!(fx.document.load()?.issues.len(), 2);
    assert!(store.issue(&fx.scope, created.id).await.is_none());
    Ok(())
}

#[tokio::test]
async fn document_errors_roll_back_the_optimistic_update() -> Result<()> {
    let fx = fixture()?;
    let store = IssueStore::new(JsonFileEndpoint::new(fx.document.clone()));
    store
        .fetch_issues(&fx.scope, &IssueFilters::default(), LoadKind::InitLoader)
        .await?;

    // Another client deletes the issue behind the store's back.
    let mut document = fx.document.load()?;
    document.issues.retain(|issue| issue.id != fx.high);
    fx.document.save(&document)?;

    let result = store.update_issue(&fx.scope, fx.high, &IssuePatch::title("Renamed")).await;
    assert!(matches!(result, Err(StoreError::NotFound(id)) if id == fx.high));
    assert_eq!(
        result.err().map(|err| err.kind()),
        Some(ErrorKind::NotFound)
    );
    assert!(store.issue(&fx.scope, fx.high).await.is_none());
    Ok(())
}
