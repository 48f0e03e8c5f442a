//! Row-level extraction: project metadata, the header row, and one task per
//! data row.

use schedview_core::{DiagnosticCode, ProcessingReport, ProjectInfo, Task};
use thiserror::Error;
use tracing::{debug, warn};

use crate::columns::{ColumnMap, LogicalField};
use crate::fields::{parse_duration, parse_percentage};
use crate::{fields, hierarchy};

/// One decoded sheet row; empty cells are empty strings
pub type Row = Vec<String>;

/// Leading rows searched for project metadata
pub const METADATA_WINDOW: usize = 10;

/// First-cell keywords that identify the task header row
const HEADER_KEYWORDS: &[&str] = &["número de tarefa", "task number", "id"];

/// Why a data row could not become a task
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("Row {row}: task {task_number} has no name")]
    MissingName { row: usize, task_number: String },
}

impl RowError {
    pub fn row(&self) -> usize {
        match self {
            RowError::MissingName { row, .. } => *row,
        }
    }
}

/// Cell text at `index`, if the column exists in this row
fn cell(row: &[String], index: Option<usize>) -> Option<&str> {
    index.and_then(|i| row.get(i)).map(String::as_str)
}

fn trimmed(row: &[String], index: Option<usize>) -> String {
    cell(row, index).map(str::trim).unwrap_or_default().to_string()
}

/// Read project metadata from label/value pairs in the leading rows.
///
/// Labels are matched by keyword (Portuguese or English); the first matching
/// keyword group in the order name, owner, start, end, duration wins for a row.
/// Later rows overwrite earlier ones. Missing entries keep their defaults.
pub fn extract_project_info(rows: &[Row]) -> ProjectInfo {
    let mut info = ProjectInfo::default();

    for row in rows.iter().take(METADATA_WINDOW) {
        if row.len() < 2 {
            continue;
        }
        let key = row[0].to_lowercase();
        let value = row[1].trim().to_string();

        if key.contains("nome do projeto") || key.contains("project name") {
            info.name = if value.is_empty() {
                ProjectInfo::DEFAULT_NAME.to_string()
            } else {
                value
            };
        } else if key.contains("proprietário") || key.contains("owner") {
            info.owner = value;
        } else if key.contains("data de início") || key.contains("start date") {
            info.start_date = value;
        } else if key.contains("data de término") || key.contains("end date") {
            info.end_date = value;
        } else if key.contains("duração") || key.contains("duration") {
            info.duration = value;
        }
    }

    info
}

/// Index of the first row whose first cell contains a header keyword
pub fn find_header_row(rows: &[Row]) -> Option<usize> {
    rows.iter().position(|row| {
        row.first().is_some_and(|first| {
            let first = first.to_lowercase();
            HEADER_KEYWORDS.iter().any(|k| first.contains(k))
        })
    })
}

/// Build a task from one data row. `row_number` is 1-based.
pub fn task_from_row(row: &[String], map: &ColumnMap, row_number: usize) -> Result<Task, RowError> {
    let task_number = trimmed(row, map.get(LogicalField::TaskNumber));
    let name = trimmed(row, map.get(LogicalField::Name));
    if name.is_empty() {
        return Err(RowError::MissingName {
            row: row_number,
            task_number,
        });
    }

    let (hierarchy_level, level) = hierarchy::resolve(cell(row, map.get(LogicalField::HierarchyLevel)));
    let duration_text = cell(row, map.get(LogicalField::Duration))
        .unwrap_or_default()
        .to_string();

    Ok(Task {
        id: task_number.clone(),
        task_number,
        hierarchy_level,
        level,
        name,
        assigned_to: trimmed(row, map.get(LogicalField::AssignedTo)),
        duration: parse_duration(&duration_text),
        duration_text,
        start_date: cell(row, map.get(LogicalField::Start)).and_then(fields::parse_date),
        end_date: cell(row, map.get(LogicalField::Finish)).and_then(fields::parse_date),
        depends_on_raw: cell(row, map.get(LogicalField::DependsOn))
            .unwrap_or_default()
            .to_string(),
        dependencies: Vec::new(),
        dependents: Vec::new(),
        percent_complete: parse_percentage(cell(row, map.get(LogicalField::PercentComplete)).unwrap_or_default()),
        bucket: trimmed(row, map.get(LogicalField::Bucket)),
        row_number,
    })
}

/// Turn every row after the header into a task.
///
/// Rows with a blank task number are counted as skipped. A row that fails
/// extraction is reported as a warning and skipped; the rest continue.
pub fn extract_tasks(rows: &[Row], header_index: usize, map: &ColumnMap) -> (Vec<Task>, ProcessingReport) {
    let mut report = ProcessingReport::new();
    let mut tasks = Vec::new();

    for (index, row) in rows.iter().enumerate().skip(header_index + 1) {
        let row_number = index + 1;
        let has_number = cell(row, map.get(LogicalField::TaskNumber)).is_some_and(|s| !s.trim().is_empty());
        if !has_number {
            report.rows_skipped += 1;
            continue;
        }

        match task_from_row(row, map, row_number) {
            Ok(task) => tasks.push(task),
            Err(err) => {
                warn!(row = err.row(), "skipping row: {err}");
                report.warn(DiagnosticCode::InvalidTask, err.to_string());
                report.rows_skipped += 1;
            }
        }
    }

    report.tasks_processed = tasks.len();
    debug!(
        processed = report.tasks_processed,
        skipped = report.rows_skipped,
        "extracted task rows"
    );
    (tasks, report)
}
