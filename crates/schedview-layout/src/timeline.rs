//! Rendered date span of the chart

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use schedview_core::{GanttConfig, ProjectInfo, Task, MAX_SPAN_DAYS};
use schedview_parser::parse_date;
use serde::Serialize;
use tracing::debug;

/// Date span covered by the chart, margins included
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Whole days from `start` to `end`
    pub total_days: i64,
}

/// Move `date` by `days`, span clamped to the configurable maximum and the
/// result saturating at the calendar limits
fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    let days = days.clamp(-MAX_SPAN_DAYS, MAX_SPAN_DAYS);
    let moved = Duration::try_days(days).and_then(|delta| date.checked_add_signed(delta));
    match moved {
        Some(date) => date,
        None if days < 0 => NaiveDate::MIN,
        None => NaiveDate::MAX,
    }
}

/// One day column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub weekend: bool,
    pub today: bool,
}

/// Run of consecutive day columns in one calendar month
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MonthGroup {
    pub year: i32,
    /// 1 to 12
    pub month: u32,
    pub days: usize,
}

impl TimeRange {
    /// Compute the span for a task set.
    ///
    /// Bounds come from the tasks, then the project's derived dates, then its
    /// declared dates, then `today` shifted by the fallback margins. The
    /// before/after margins are applied last.
    pub fn compute(tasks: &[Task], project: &ProjectInfo, gantt: &GanttConfig, today: NaiveDate) -> Self {
        let min_date = tasks.iter().filter_map(|t| t.start_date).min();
        let max_date = tasks.iter().filter_map(|t| t.end_date).max();
        Self::from_bounds(min_date, max_date, project, gantt, today)
    }

    /// Span for an ingested project without scanning its tasks.
    ///
    /// Ingestion already stores the earliest start and latest finish as the
    /// project's derived dates, so this matches [`TimeRange::compute`] over
    /// the same tasks.
    pub fn for_project(project: &ProjectInfo, gantt: &GanttConfig, today: NaiveDate) -> Self {
        Self::from_bounds(None, None, project, gantt, today)
    }

    fn from_bounds(
        min_date: Option<NaiveDate>,
        max_date: Option<NaiveDate>,
        project: &ProjectInfo,
        gantt: &GanttConfig,
        today: NaiveDate,
    ) -> Self {
        let min_date = min_date
            .or(project.calculated_start_date)
            .or_else(|| parse_date(&project.start_date))
            .unwrap_or_else(|| shift(today, gantt.fallback_days_before.saturating_neg()));
        let max_date = max_date
            .or(project.calculated_end_date)
            .or_else(|| parse_date(&project.end_date))
            .unwrap_or_else(|| shift(today, gantt.fallback_days_after));

        let start = shift(min_date, gantt.margin_days_before.saturating_neg());
        let end = shift(max_date, gantt.margin_days_after).max(start);
        let range = Self::new(start, end);
        debug!(start = %range.start, end = %range.end, days = range.total_days, "time range");
        range
    }

    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            total_days: (end - start).num_days(),
        }
    }

    /// The `total_days` columns starting at `start`
    pub fn days(&self, today: NaiveDate) -> impl Iterator<Item = DayCell> + '_ {
        self.start
            .iter_days()
            .take(self.total_days.max(0) as usize)
            .map(move |date| DayCell {
                date,
                weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
                today: date == today,
            })
    }

    /// Day columns grouped by calendar month, in order
    pub fn months(&self) -> Vec<MonthGroup> {
        let mut groups: Vec<MonthGroup> = Vec::new();
        for date in self.start.iter_days().take(self.total_days.max(0) as usize) {
            match groups.last_mut() {
                Some(g) if g.year == date.year() && g.month == date.month() => g.days += 1,
                _ => groups.push(MonthGroup {
                    year: date.year(),
                    month: date.month(),
                    days: 1,
                }),
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2024, 6, 1)
    }

    #[test]
    fn span_from_tasks_with_margins() {
        let tasks = vec![
            Task::new("1").dates(Some(date(2024, 3, 10)), Some(date(2024, 3, 15))),
            Task::new("2").dates(Some(date(2024, 3, 12)), Some(date(2024, 3, 20))),
        ];
        let range = TimeRange::compute(&tasks, &ProjectInfo::default(), &GanttConfig::default(), today());

        assert_eq!(range.start, date(2024, 3, 3));
        assert_eq!(range.end, date(2024, 4, 3));
        assert_eq!(range.total_days, 31);
    }

    #[test]
    fn falls_back_to_declared_project_dates() {
        let mut project = ProjectInfo::new("P");
        project.start_date = "01/02/2024".into();
        project.end_date = "2024-02-10".into();
        let range = TimeRange::compute(&[Task::new("1")], &project, &GanttConfig::default(), today());

        assert_eq!(range.start, date(2024, 1, 25));
        assert_eq!(range.end, date(2024, 2, 24));
    }

    #[test]
    fn falls_back_to_today() {
        let range = TimeRange::compute(&[], &ProjectInfo::default(), &GanttConfig::default(), today());
        assert_eq!(range.start, today() - Duration::days(37));
        assert_eq!(range.end, today() + Duration::days(104));
        assert_eq!(range.total_days, 141);
    }

    #[test]
    fn configured_margins_apply() {
        let gantt = GanttConfig {
            margin_days_before: 0,
            margin_days_after: 0,
            ..GanttConfig::default()
        };
        let tasks = vec![Task::new("1").dates(Some(date(2024, 1, 1)), Some(date(2024, 1, 3)))];
        let range = TimeRange::compute(&tasks, &ProjectInfo::default(), &gantt, today());
        assert_eq!((range.start, range.end, range.total_days), (date(2024, 1, 1), date(2024, 1, 3), 2));
    }

    #[test]
    fn extreme_margins_are_clamped() {
        let gantt = GanttConfig {
            margin_days_before: i64::MAX,
            margin_days_after: i64::MAX,
            fallback_days_before: i64::MIN,
            fallback_days_after: i64::MIN,
            ..GanttConfig::default()
        };
        let tasks = vec![Task::new("1").dates(Some(date(2024, 1, 1)), Some(date(2024, 1, 3)))];
        let range = TimeRange::compute(&tasks, &ProjectInfo::default(), &gantt, today());
        assert_eq!(range.start, date(2024, 1, 1) - Duration::days(MAX_SPAN_DAYS));
        assert_eq!(range.end, date(2024, 1, 3) + Duration::days(MAX_SPAN_DAYS));

        let empty = TimeRange::compute(&[], &ProjectInfo::default(), &gantt, today());
        assert!(empty.start <= empty.end);
    }

    #[test]
    fn shift_saturates_at_calendar_limits() {
        assert_eq!(shift(NaiveDate::MAX, 1), NaiveDate::MAX);
        assert_eq!(shift(NaiveDate::MIN, -1), NaiveDate::MIN);
        assert_eq!(shift(date(2024, 2, 28), 2), date(2024, 3, 1));
    }

    #[test]
    fn project_span_matches_task_scan() {
        let mut project = ProjectInfo::new("P");
        project.calculated_start_date = Some(date(2024, 3, 4));
        project.calculated_end_date = Some(date(2024, 3, 29));
        let tasks = vec![
            Task::new("1").dates(Some(date(2024, 3, 4)), Some(date(2024, 3, 8))),
            Task::new("2").dates(Some(date(2024, 3, 13)), Some(date(2024, 3, 29))),
        ];
        let gantt = GanttConfig::default();
        assert_eq!(
            TimeRange::for_project(&project, &gantt, today()),
            TimeRange::compute(&tasks, &project, &gantt, today())
        );
    }

    #[test]
    fn day_cells_flag_weekends_and_today() {
        let range = TimeRange::new(date(2024, 5, 31), date(2024, 6, 3));
        let cells: Vec<_> = range.days(today()).collect();

        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].date, date(2024, 5, 31));
        assert!(!cells[0].weekend);
        assert!(cells[1].weekend && cells[1].today);
        assert!(cells[2].weekend && !cells[2].today);
    }

    #[test]
    fn months_group_consecutive_days() {
        let range = TimeRange::new(date(2024, 1, 30), date(2024, 3, 2));
        assert_eq!(
            range.months(),
            vec![
                MonthGroup { year: 2024, month: 1, days: 2 },
                MonthGroup { year: 2024, month: 2, days: 29 },
                MonthGroup { year: 2024, month: 3, days: 1 },
            ]
        );
    }
}
