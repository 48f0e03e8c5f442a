//! Flat table projection: filtering, sorting and CSV export

use chrono::NaiveDate;
use schedview_core::{Task, TaskStatus};
use schedview_parser::parse_dependency_tokens;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::io::Write;
use std::str::FromStr;
use thiserror::Error;

/// Header row written by [`write_csv`]; re-ingestable by the column mapper
pub const EXPORT_HEADERS: [&str; 10] = [
    "Task Number",
    "Hierarchy Level",
    "Name",
    "Assigned To",
    "Duration",
    "Start",
    "Finish",
    "Depends On",
    "Percent Complete",
    "Bucket",
];

const MISSING: &str = "-";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unknown sort column: {0}")]
    UnknownSortKey(String),

    #[error("Unknown status filter: {0}")]
    UnknownStatus(String),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Query
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    InProgress,
    NotStarted,
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => task.status() == TaskStatus::Completed,
            StatusFilter::InProgress => task.status() == TaskStatus::InProgress,
            StatusFilter::NotStarted => task.status() == TaskStatus::NotStarted,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "completed" => Ok(StatusFilter::Completed),
            "in-progress" => Ok(StatusFilter::InProgress),
            "not-started" => Ok(StatusFilter::NotStarted),
            _ => Err(ExportError::UnknownStatus(s.to_string())),
        }
    }
}

/// Sortable table column
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    Number,
    #[default]
    Hierarchy,
    Name,
    Assignee,
    Duration,
    Start,
    End,
    Percent,
    Bucket,
}

impl FromStr for SortKey {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "number" => Ok(SortKey::Number),
            "hierarchy" => Ok(SortKey::Hierarchy),
            "name" => Ok(SortKey::Name),
            "assignee" => Ok(SortKey::Assignee),
            "duration" => Ok(SortKey::Duration),
            "start" => Ok(SortKey::Start),
            "end" => Ok(SortKey::End),
            "percent" => Ok(SortKey::Percent),
            "bucket" => Ok(SortKey::Bucket),
            _ => Err(ExportError::UnknownSortKey(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Filters and ordering for the table view
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableQuery {
    /// Case-insensitive substring of the task name
    pub search: Option<String>,
    /// Exact assignee
    pub assigned_to: Option<String>,
    /// Exact bucket
    pub bucket: Option<String>,
    pub status: StatusFilter,
    pub sort: SortKey,
    pub direction: SortDirection,
}

impl TableQuery {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            if !task.name.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        if let Some(who) = self.assigned_to.as_deref().filter(|s| !s.is_empty()) {
            if task.assigned_to != who {
                return false;
            }
        }
        if let Some(bucket) = self.bucket.as_deref().filter(|s| !s.is_empty()) {
            if task.bucket != bucket {
                return false;
            }
        }
        self.status.matches(task)
    }

    /// Matching tasks in query order; the sort is stable
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        let mut rows: Vec<&Task> = tasks.iter().filter(|t| self.matches(t)).collect();
        rows.sort_by(|a, b| {
            let ord = compare(self.sort, a, b);
            match self.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
        rows
    }
}

fn compare(key: SortKey, a: &Task, b: &Task) -> Ordering {
    match key {
        SortKey::Number => compare_numbers(&a.task_number, &b.task_number),
        SortKey::Hierarchy => compare_outline(&a.hierarchy_level, &b.hierarchy_level),
        SortKey::Name => compare_text(&a.name, &b.name),
        SortKey::Assignee => compare_text(&a.assigned_to, &b.assigned_to),
        SortKey::Duration => a.duration.total_cmp(&b.duration),
        SortKey::Start => a.start_date.cmp(&b.start_date),
        SortKey::End => a.end_date.cmp(&b.end_date),
        SortKey::Percent => a.percent_complete.total_cmp(&b.percent_complete),
        SortKey::Bucket => compare_text(&a.bucket, &b.bucket),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Numeric when both parse, otherwise text
fn compare_numbers(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        _ => compare_text(a, b),
    }
}

/// Segment-wise, so "1.2" sorts before "1.10"
fn compare_outline(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => compare_text(x, y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

// ============================================================================
// Projection
// ============================================================================

/// One exported table row, all text
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub number: String,
    pub hierarchy: String,
    pub name: String,
    pub assigned_to: String,
    pub duration: String,
    pub start: String,
    pub end: String,
    pub depends_on: String,
    pub percent_complete: String,
    pub bucket: String,
}

impl ExportRow {
    pub fn from_task(task: &Task) -> Self {
        Self {
            number: task.task_number.clone(),
            hierarchy: task.hierarchy_level.clone(),
            name: task.name.clone(),
            assigned_to: task.assigned_to.clone(),
            duration: task.duration_text.clone(),
            start: format_date(task.start_date),
            end: format_date(task.end_date),
            depends_on: format_dependencies(&task.depends_on_raw),
            percent_complete: task.percent_complete.to_string(),
            bucket: task.bucket.clone(),
        }
    }

    pub fn fields(&self) -> [&str; 10] {
        [
            self.number.as_str(),
            self.hierarchy.as_str(),
            self.name.as_str(),
            self.assigned_to.as_str(),
            self.duration.as_str(),
            self.start.as_str(),
            self.end.as_str(),
            self.depends_on.as_str(),
            self.percent_complete.as_str(),
            self.bucket.as_str(),
        ]
    }
}

/// `dd/mm/yyyy`, or `-` when absent
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| MISSING.to_string(), |d| d.format("%d/%m/%Y").to_string())
}

/// Cleaned predecessor list joined by ", ", or `-` when empty
pub fn format_dependencies(raw: &str) -> String {
    let tokens = parse_dependency_tokens(raw);
    if tokens.is_empty() {
        MISSING.to_string()
    } else {
        tokens.join(", ")
    }
}

/// Write rows with a header line, every field quoted
pub fn write_csv<'a, W: Write>(
    writer: W,
    tasks: impl IntoIterator<Item = &'a Task>,
) -> Result<usize, ExportError> {
    let mut csv = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);

    csv.write_record(EXPORT_HEADERS)?;
    let mut count = 0;
    for task in tasks {
        csv.write_record(ExportRow::from_task(task).fields())?;
        count += 1;
    }
    csv.flush()?;
    Ok(count)
}

// ============================================================================
// Summary
// ============================================================================

/// Status counts over a task selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
}

impl TableSummary {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        tasks.into_iter().fold(Self::default(), |mut s, task| {
            s.total += 1;
            match task.status() {
                TaskStatus::Completed => s.completed += 1,
                TaskStatus::InProgress => s.in_progress += 1,
                TaskStatus::NotStarted => s.not_started += 1,
            }
            s
        })
    }
}
