//! # schedview-core
//!
//! Core domain model for the schedview ingestion and layout engine.
//!
//! This crate provides:
//! - Domain types: `ProjectInfo`, `Task`, `VisibleRange`
//! - The processing report accumulated by one ingestion run
//! - Error types for fatal ingestion failures
//! - Layout and file-acceptance configuration
//!
//! ## Example
//!
//! ```rust
//! use schedview_core::{ProjectInfo, Task};
//!
//! let project = ProjectInfo::new("Office Move");
//! let design = Task::new("1").name("Design").hierarchy("1");
//! let build = Task::new("2").name("Build").hierarchy("1.1").depends_on_raw("1");
//!
//! assert_eq!(project.name, "Office Move");
//! assert_eq!(build.level, 2);
//! assert!(design.dependencies.is_empty());
//! ```

pub mod config;
pub mod report;

pub use config::{
    ConfigError, FileConfig, FileRejection, GanttConfig, PerformanceConfig, SchedviewConfig,
    VirtualizationConfig, MAX_SPAN_DAYS,
};
pub use report::{Diagnostic, DiagnosticCode, ProcessingReport, Severity};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Identifier of a task (the task number as it appears in the sheet)
pub type TaskId = String;

/// Deepest nesting level a task is displayed at
pub const MAX_LEVEL: u8 = 4;

/// Nesting level for a dotted hierarchy string such as `"1.2.3"`.
///
/// Counts the dots, adds one and caps at [`MAX_LEVEL`]. Empty strings are
/// top-level.
pub fn hierarchy_level(hierarchy: &str) -> u8 {
    if hierarchy.is_empty() {
        return 1;
    }
    let dots = hierarchy.chars().filter(|c| *c == '.').count();
    (dots + 1).min(MAX_LEVEL as usize) as u8
}

// ============================================================================
// Project
// ============================================================================

/// Project-level metadata read from the leading rows of the sheet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Project name
    pub name: String,
    /// Project owner
    pub owner: String,
    /// Declared start, as written in the sheet
    pub start_date: String,
    /// Declared end, as written in the sheet
    pub end_date: String,
    /// Declared duration, as written in the sheet
    pub duration: String,
    /// Earliest task start (derived from tasks)
    pub calculated_start_date: Option<NaiveDate>,
    /// Latest task end (derived from tasks)
    pub calculated_end_date: Option<NaiveDate>,
}

impl ProjectInfo {
    /// Name used when the sheet carries no project-name row
    pub const DEFAULT_NAME: &'static str = "Untitled Project";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for ProjectInfo {
    fn default() -> Self {
        Self {
            name: Self::DEFAULT_NAME.into(),
            owner: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            duration: String::new(),
            calculated_start_date: None,
            calculated_end_date: None,
        }
    }
}

// ============================================================================
// Task
// ============================================================================

/// One schedule line item extracted from a data row
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier (same as `task_number`, intended unique)
    pub id: TaskId,
    /// Task number as written in the sheet
    pub task_number: String,
    /// Dotted outline number, e.g. "1.2.3"
    pub hierarchy_level: String,
    /// Display nesting depth, 1 to 4
    pub level: u8,
    /// Task name
    pub name: String,
    /// Assignee text
    pub assigned_to: String,
    /// Duration in working days
    pub duration: f64,
    /// Duration as written in the sheet
    pub duration_text: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Raw predecessor text, e.g. "3TI;5TI"
    pub depends_on_raw: String,
    /// Resolved ids this task waits on
    pub dependencies: Vec<TaskId>,
    /// Ids of tasks waiting on this one
    pub dependents: Vec<TaskId>,
    /// Completion percentage in [0, 100]
    pub percent_complete: f64,
    /// Category / bucket
    pub bucket: String,
    /// 1-based row in the source sheet
    pub row_number: usize,
}

impl Task {
    /// Create a top-level task with the given number
    pub fn new(task_number: impl Into<String>) -> Self {
        let task_number = task_number.into();
        Self {
            id: task_number.clone(),
            name: task_number.clone(),
            task_number,
            hierarchy_level: "1".into(),
            level: 1,
            assigned_to: String::new(),
            duration: 0.0,
            duration_text: String::new(),
            start_date: None,
            end_date: None,
            depends_on_raw: String::new(),
            dependencies: Vec::new(),
            dependents: Vec::new(),
            percent_complete: 0.0,
            bucket: String::new(),
            row_number: 0,
        }
    }

    /// Set the task name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the hierarchy string; the level follows from it
    pub fn hierarchy(mut self, hierarchy: impl Into<String>) -> Self {
        self.hierarchy_level = hierarchy.into();
        self.level = hierarchy_level(&self.hierarchy_level);
        self
    }

    /// Set start and end dates
    pub fn dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Set the raw predecessor text
    pub fn depends_on_raw(mut self, raw: impl Into<String>) -> Self {
        self.depends_on_raw = raw.into();
        self
    }

    /// Set completion, clamped to [0, 100]
    pub fn complete(mut self, pct: f64) -> Self {
        self.percent_complete = pct.clamp(0.0, 100.0);
        self
    }

    pub fn assign(mut self, who: impl Into<String>) -> Self {
        self.assigned_to = who.into();
        self
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn row(mut self, row_number: usize) -> Self {
        self.row_number = row_number;
        self
    }

    /// Both start and end are known
    pub fn has_dates(&self) -> bool {
        self.start_date.is_some() && self.end_date.is_some()
    }

    /// Start falls after end
    pub fn has_inverted_dates(&self) -> bool {
        matches!((self.start_date, self.end_date), (Some(s), Some(e)) if s > e)
    }

    pub fn status(&self) -> TaskStatus {
        if self.percent_complete >= 100.0 {
            TaskStatus::Completed
        } else if self.percent_complete > 0.0 {
            TaskStatus::InProgress
        } else {
            TaskStatus::NotStarted
        }
    }
}

/// Progress bucket derived from `percent_complete`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::NotStarted => write!(f, "Not Started"),
            TaskStatus::InProgress => write!(f, "In Progress"),
            TaskStatus::Completed => write!(f, "Completed"),
        }
    }
}

// ============================================================================
// Ingestion result
// ============================================================================

/// Successful outcome of one ingestion run
#[derive(Clone, Debug, Serialize)]
pub struct Ingested {
    pub project: ProjectInfo,
    pub tasks: Vec<Task>,
    pub report: ProcessingReport,
}

impl Ingested {
    /// Find the first task carrying `id`
    pub fn get_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

// ============================================================================
// Viewport
// ============================================================================

/// Half-open `[start, end)` index range into the task sequence
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
}

impl VisibleRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }

    /// Borrow the materialized slice; bounds are clamped to `items`
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.end.min(items.len());
        let start = self.start.min(end);
        &items[start..end]
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Fatal ingestion error; aborts the run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    #[error("Input contains no tabular data")]
    EmptyInput,

    #[error("Task header row not found")]
    HeaderNotFound,

    #[error("Required columns not found: {}", .0.join(", "))]
    MissingRequiredColumns(Vec<String>),

    #[error("No tasks found in the file")]
    NoTasks,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IngestError {
    pub fn code(&self) -> DiagnosticCode {
        match self {
            IngestError::EmptyInput => DiagnosticCode::EmptyInput,
            IngestError::HeaderNotFound => DiagnosticCode::HeaderNotFound,
            IngestError::MissingRequiredColumns(_) => DiagnosticCode::MissingRequiredColumns,
            IngestError::NoTasks => DiagnosticCode::NoTasks,
            IngestError::Internal(_) => DiagnosticCode::ProcessingFailed,
        }
    }
}

/// A failed run: the fatal error plus everything reported before it
#[derive(Debug, Clone, Error)]
#[error("Processing failed: {error}")]
pub struct IngestFailure {
    pub error: IngestError,
    pub report: ProcessingReport,
}

// ============================================================================
// Tests
// ============================================================================
