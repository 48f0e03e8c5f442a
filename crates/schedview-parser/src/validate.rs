//! Post-extraction checks over the whole task list

use schedview_core::{DiagnosticCode, IngestError, ProcessingReport, Task};
use std::collections::HashMap;

use crate::hierarchy::is_well_formed;

/// Offenders listed in an `INVALID_HIERARCHY` warning
pub const MAX_LISTED_HIERARCHIES: usize = 5;

/// Validate the extracted tasks.
///
/// Zero tasks is fatal. Duplicate ids, malformed outline numbers, missing
/// dates and inverted date pairs are warnings; nothing is removed or fixed.
pub fn validate(tasks: &[Task]) -> Result<ProcessingReport, IngestError> {
    if tasks.is_empty() {
        return Err(IngestError::NoTasks);
    }

    let mut report = ProcessingReport::new();

    let duplicates = duplicate_ids(tasks);
    if !duplicates.is_empty() {
        report.warn(
            DiagnosticCode::DuplicateIds,
            format!("Duplicate task IDs found: {}", duplicates.join(", ")),
        );
    }

    let malformed: Vec<&str> = tasks
        .iter()
        .map(|t| t.hierarchy_level.as_str())
        .filter(|h| !is_well_formed(h))
        .collect();
    if !malformed.is_empty() {
        let listed: Vec<&str> = malformed.iter().take(MAX_LISTED_HIERARCHIES).copied().collect();
        report.warn(
            DiagnosticCode::InvalidHierarchy,
            format!(
                "{} tasks have an invalid hierarchy level: {}",
                malformed.len(),
                listed.join(", ")
            ),
        );
    }

    let undated = tasks.iter().filter(|t| !t.has_dates()).count();
    if undated > 0 {
        report.warn(
            DiagnosticCode::TasksWithoutDates,
            format!("{undated} tasks have no complete start/end dates"),
        );
    }

    for task in tasks.iter().filter(|t| t.has_inverted_dates()) {
        report.warn(
            DiagnosticCode::DateInconsistency,
            format!(
                "Row {}: task {} starts after it ends",
                task.row_number, task.id
            ),
        );
    }

    Ok(report)
}

/// Ids seen more than once, in first-appearance order
fn duplicate_ids(tasks: &[Task]) -> Vec<&str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();
    for task in tasks {
        let count = counts.entry(task.id.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            order.push(task.id.as_str());
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn dated(id: &str) -> Task {
        Task::new(id).dates(date(2024, 1, 1), date(2024, 1, 5))
    }

    #[test]
    fn empty_is_fatal() {
        assert_eq!(validate(&[]), Err(IngestError::NoTasks));
    }

    #[test]
    fn clean_tasks_have_no_warnings() {
        let tasks = vec![dated("1").hierarchy("1"), dated("2").hierarchy("1.1")];
        let report = validate(&tasks).unwrap();
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn duplicates_are_listed_once() {
        let tasks = vec![dated("1"), dated("2"), dated("1"), dated("1"), dated("2")];
        let report = validate(&tasks).unwrap();

        let dups: Vec<_> = report.warnings_with(DiagnosticCode::DuplicateIds).collect();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].message, "Duplicate task IDs found: 1, 2");
    }

    #[test]
    fn invalid_hierarchy_lists_first_five() {
        let tasks: Vec<Task> = ["a", "1.", "x.1", "2..3", "..", "b", "1.2"]
            .iter()
            .enumerate()
            .map(|(i, h)| dated(&i.to_string()).hierarchy(*h))
            .collect();
        let report = validate(&tasks).unwrap();

        let warning = report
            .warnings_with(DiagnosticCode::InvalidHierarchy)
            .next()
            .unwrap();
        assert_eq!(
            warning.message,
            "6 tasks have an invalid hierarchy level: a, 1., x.1, 2..3, .."
        );
    }

    #[test]
    fn counts_tasks_without_complete_dates() {
        let tasks = vec![
            dated("1"),
            Task::new("2"),
            Task::new("3").dates(date(2024, 1, 1), None),
        ];
        let report = validate(&tasks).unwrap();
        let warning = report
            .warnings_with(DiagnosticCode::TasksWithoutDates)
            .next()
            .unwrap();
        assert!(warning.message.starts_with("2 tasks"));
    }

    #[test]
    fn inverted_dates_are_flagged_per_task() {
        let tasks = vec![
            Task::new("1").dates(date(2024, 2, 1), date(2024, 1, 1)).row(4),
            dated("2"),
        ];
        let report = validate(&tasks).unwrap();
        let flagged: Vec<_> = report.warnings_with(DiagnosticCode::DateInconsistency).collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].message, "Row 4: task 1 starts after it ends");
        assert_eq!(tasks[0].start_date, date(2024, 2, 1));
    }
}
