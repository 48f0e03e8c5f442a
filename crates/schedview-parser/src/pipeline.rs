//! Ingestion orchestrator
//!
//! Runs the stages in order over decoded rows:
//!
//! 1. reject empty input, warn on tiny sheets
//! 2. metadata scan
//! 3. header detection
//! 4. column mapping
//! 5. row extraction
//! 6. dependency linking
//! 7. validation
//! 8. derived project dates
//!
//! Each stage hands back its own report; they are merged in stage order. A
//! fatal condition, or a panic anywhere below [`ingest`], ends the run with
//! one [`IngestFailure`].

use chrono::NaiveDate;
use schedview_core::{
    DiagnosticCode, IngestError, IngestFailure, Ingested, ProcessingReport, ProjectInfo, Task,
};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info};

use crate::columns::map_columns;
use crate::dependencies::link_dependencies;
use crate::rows::{extract_project_info, extract_tasks, find_header_row, Row};
use crate::validate::validate;

/// Sheets shorter than this get a `SMALL_DATASET` warning
pub const SMALL_DATASET_ROWS: usize = 5;

/// Ingest one decoded sheet.
///
/// Every call starts from a fresh report, so concurrent or repeated runs share
/// nothing.
pub fn ingest(rows: &[Row]) -> Result<Ingested, IngestFailure> {
    let mut report = ProcessingReport::new();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| run(rows, &mut report)))
        .unwrap_or_else(|payload| Err(IngestError::Internal(panic_message(payload.as_ref()))));

    match outcome {
        Ok((project, tasks)) => {
            info!(
                project = %project.name,
                tasks = tasks.len(),
                skipped = report.rows_skipped,
                warnings = report.warning_count(),
                "ingestion complete"
            );
            Ok(Ingested {
                project,
                tasks,
                report,
            })
        }
        Err(err) => {
            error!(code = %err.code(), "ingestion failed: {err}");
            report.error(DiagnosticCode::ProcessingFailed, format!("Processing failed: {err}"));
            Err(IngestFailure { error: err, report })
        }
    }
}

fn run(rows: &[Row], report: &mut ProcessingReport) -> Result<(ProjectInfo, Vec<Task>), IngestError> {
    // 1
    if is_blank(rows) {
        return Err(IngestError::EmptyInput);
    }
    if rows.len() < SMALL_DATASET_ROWS {
        report.warn(
            DiagnosticCode::SmallDataset,
            format!("Only {} rows found in the file", rows.len()),
        );
    }

    // 2
    let mut project = extract_project_info(rows);
    debug!(project = %project.name, "metadata scanned");

    // 3
    let header_index = find_header_row(rows).ok_or(IngestError::HeaderNotFound)?;
    debug!(row = header_index + 1, "header row found");

    // 4
    let columns = map_columns(&rows[header_index]);
    report.merge(columns.check()?);
    debug!(mapped = columns.iter().count(), "columns mapped");

    // 5
    let (mut tasks, extracted) = extract_tasks(rows, header_index, &columns);
    report.merge(extracted);

    // 6
    link_dependencies(&mut tasks);

    // 7
    report.merge(validate(&tasks)?);

    // 8
    let (start, end) = calculate_project_dates(&tasks);
    project.calculated_start_date = start;
    project.calculated_end_date = end;

    Ok((project, tasks))
}

/// No rows, or no row with a non-blank cell
fn is_blank(rows: &[Row]) -> bool {
    rows.iter().all(|row| row.iter().all(|cell| cell.trim().is_empty()))
}

/// Earliest task start and latest task end; `None` where no task has one
pub fn calculate_project_dates(tasks: &[Task]) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let start = tasks.iter().filter_map(|t| t.start_date).min();
    let end = tasks.iter().filter_map(|t| t.end_date).max();
    (start, end)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected panic during ingestion".to_string()
    }
}
