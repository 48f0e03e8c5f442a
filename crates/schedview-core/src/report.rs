//! Processing report for one ingestion run
//!
//! Every stage of the pipeline returns its own `ProcessingReport`; the
//! orchestrator merges them in stage order. Nothing is shared between runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Diagnostic severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Aborts the run
    Error,
    /// Collected and surfaced with a successful result
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Stable diagnostic codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Fatal
    EmptyInput,
    HeaderNotFound,
    MissingRequiredColumns,
    NoTasks,
    ProcessingFailed,

    // Warnings
    SmallDataset,
    MissingRecommendedColumns,
    InvalidTask,
    DuplicateIds,
    InvalidHierarchy,
    TasksWithoutDates,
    DateInconsistency,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::EmptyInput => "EMPTY_INPUT",
            DiagnosticCode::HeaderNotFound => "HEADER_NOT_FOUND",
            DiagnosticCode::MissingRequiredColumns => "MISSING_REQUIRED_COLUMNS",
            DiagnosticCode::NoTasks => "NO_TASKS",
            DiagnosticCode::ProcessingFailed => "PROCESSING_FAILED",
            DiagnosticCode::SmallDataset => "SMALL_DATASET",
            DiagnosticCode::MissingRecommendedColumns => "MISSING_RECOMMENDED_COLUMNS",
            DiagnosticCode::InvalidTask => "INVALID_TASK",
            DiagnosticCode::DuplicateIds => "DUPLICATE_IDS",
            DiagnosticCode::InvalidHierarchy => "INVALID_HIERARCHY",
            DiagnosticCode::TasksWithoutDates => "TASKS_WITHOUT_DATES",
            DiagnosticCode::DateInconsistency => "DATE_INCONSISTENCY",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported condition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Errors and warnings collected during one run, plus row counts
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    /// Data rows turned into tasks
    pub tasks_processed: usize,
    /// Data rows skipped (blank task number or unusable row)
    pub rows_skipped: usize,
}

impl ProcessingReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        self.errors.push(Diagnostic::new(code, message));
    }

    pub fn warn(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        self.warnings.push(Diagnostic::new(code, message));
    }

    /// Append `other` after this report's entries and add its counts
    pub fn merge(&mut self, other: ProcessingReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.tasks_processed += other.tasks_processed;
        self.rows_skipped += other.rows_skipped;
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings carrying `code`
    pub fn warnings_with(&self, code: DiagnosticCode) -> impl Iterator<Item = &Diagnostic> {
        self.warnings.iter().filter(move |d| d.code == code)
    }

    /// All entries in report order, tagged with severity
    pub fn iter(&self) -> impl Iterator<Item = (Severity, &Diagnostic)> {
        self.errors
            .iter()
            .map(|d| (Severity::Error, d))
            .chain(self.warnings.iter().map(|d| (Severity::Warning, d)))
    }

    /// Report content with timestamps stripped, for comparing runs
    pub fn fingerprint(&self) -> Vec<(Severity, DiagnosticCode, String)> {
        self.iter()
            .map(|(severity, d)| (severity, d.code, d.message.clone()))
            .collect()
    }
}
