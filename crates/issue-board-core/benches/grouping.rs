#![allow(missing_docs)]

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use issue_board_core::catalog::GroupCatalog;
use issue_board_core::grouping::{GroupBy, grouped_issues, sub_grouped_issues};
use issue_board_core::id::{IssueId, LabelId, ProjectId, StateId};
use issue_board_core::issue::{Issue, Priority};
use issue_board_core::order::OrderBy;

fn build_issues(count: usize, labels_per_issue: usize) -> Vec<Issue> {
    let project = ProjectId::new();
    let states: Vec<StateId> = (0..6).map(|_| StateId::new()).collect();
    let labels: Vec<LabelId> = (0..32).map(|_| LabelId::new()).collect();

    (0..count)
        .map(|idx| {
            let mut issue = Issue::new(IssueId::new(), project, format!("issue-{idx}"));
            issue.state = Some(states[idx % states.len()]);
            issue.priority = Priority::ALL[idx % Priority::ALL.len()];
            issue.labels = (0..labels_per_issue)
                .map(|offset| labels[(idx + offset) % labels.len()])
                .collect();
            issue.sort_order = f64::from(u32::try_from(idx % 97).unwrap_or_default());
            issue
        })
        .collect()
}

fn grouping_benchmark(c: &mut Criterion) {
    let catalog = GroupCatalog::permissive();
    let mut group = c.benchmark_group("grouped_issues");
    for &count in &[100usize, 1_000, 5_000] {
        group.bench_with_input(BenchmarkId::new("labels", count), &count, |b, &count| {
            b.iter_batched(
                || build_issues(count, 4),
                |issues| {
                    black_box(grouped_issues(GroupBy::Labels, OrderBy::SORT_ORDER, &issues, &catalog));
                },
                BatchSize::SmallInput,
            );
        });
        group.bench_with_input(BenchmarkId::new("state_by_priority", count), &count, |b, &count| {
            b.iter_batched(
                || build_issues(count, 1),
                |issues| {
                    black_box(sub_grouped_issues(
                        GroupBy::Priority,
                        GroupBy::State,
                        OrderBy::SORT_ORDER,
                        &issues,
                        &catalog,
                    ));
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, grouping_benchmark);
criterion_main!(benches);
