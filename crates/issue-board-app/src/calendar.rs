//! Calendar grid built from issues grouped by due date.

use issue_board_core::filter::{CalendarDisplay, CalendarLayout};
use issue_board_core::grouping::{GroupKey, GroupedIssues};
use issue_board_core::id::IssueId;
use serde::Serialize;
use time::{Date, Duration, Weekday};

/// One day cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    /// Date of the cell.
    pub date: Date,
    /// Whether the date falls inside the active month.
    pub in_active_month: bool,
    /// Issues due that day, in display order.
    pub issues: Vec<IssueId>,
}

/// One row of the grid, Monday first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarWeek {
    /// Rendered days; weekends are omitted unless enabled.
    pub days: Vec<CalendarDay>,
}

/// Month or week grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarView {
    /// Granularity of the grid.
    pub layout: CalendarLayout,
    /// Rows of the grid.
    pub weeks: Vec<CalendarWeek>,
}

impl CalendarView {
    /// Lay out `grouped` (keyed by target date) around `active`.
    ///
    /// The month layout covers every week touching the month of `active`; the
    /// week layout covers the week containing it. Issues without a due date
    /// are not placed.
    #[must_use]
    pub fn build(active: Date, display: CalendarDisplay, grouped: &GroupedIssues) -> Self {
        let (first, last) = match display.layout {
            CalendarLayout::Month => month_bounds(active),
            CalendarLayout::Week => (active, active),
        };

        let mut weeks = Vec::new();
        let mut week_start = monday_of(first);
        while week_start <= last {
            let days = (0..7)
                .filter_map(|offset| week_start.checked_add(Duration::days(offset)))
                .filter(|date| display.show_weekends || !is_weekend(*date))
                .map(|date| CalendarDay {
                    date,
                    in_active_month: date.month() == active.month() && date.year() == active.year(),
                    issues: grouped.get(&GroupKey::Date(date)).cloned().unwrap_or_default(),
                })
                .collect();
            weeks.push(CalendarWeek { days });
            match week_start.checked_add(Duration::days(7)) {
                Some(next) => week_start = next,
                None => break,
            }
        }

        Self {
            layout: display.layout,
            weeks,
        }
    }

    /// Issues placed on `date`, empty when the day is not rendered.
    #[must_use]
    pub fn issues_on(&self, date: Date) -> &[IssueId] {
        self.days()
            .find(|day| day.date == date)
            .map_or(&[][..], |day| day.issues.as_slice())
    }

    /// First and last rendered dates.
    #[must_use]
    pub fn range(&self) -> Option<(Date, Date)> {
        let first = self.days().next()?.date;
        let last = self.days().last()?.date;
        Some((first, last))
    }

    /// Iterate over every rendered day.
    pub fn days(&self) -> impl Iterator<Item = &CalendarDay> {
        self.weeks.iter().flat_map(|week| week.days.iter())
    }
}

fn month_bounds(active: Date) -> (Date, Date) {
    let first = active.replace_day(1).unwrap_or(active);
    let mut last = first;
    while let Some(next) = last.next_day() {
        if next.month() != first.month() {
            break;
        }
        last = next;
    }
    (first, last)
}

fn monday_of(date: Date) -> Date {
    let offset = i64::from(date.weekday().number_days_from_monday());
    date.checked_sub(Duration::days(offset)).unwrap_or(date)
}

const fn is_weekend(date: Date) -> bool {
    matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday)
}
