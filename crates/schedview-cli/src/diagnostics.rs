//! Report rendering for CLI output
//!
//! - `TerminalEmitter`: one `severity[CODE]: message` block per entry
//! - `JsonEmitter`: the same entries collected for a JSON document
//!
//! `--strict` turns warnings into errors; `--quiet` hides everything but
//! errors and never changes the exit code.
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success: no errors (warnings allowed) |
//! | 1 | Failure: one or more errors after policy |

use std::io::Write;
use std::process;

use schedview_core::{Diagnostic, ProcessingReport, ProjectInfo, Severity};
use serde::Serialize;

// ============================================================================
// Exit Code
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
}

impl ExitCode {
    /// The error count must already reflect strict-mode escalation
    pub fn from_error_count(count: usize) -> Self {
        if count > 0 {
            ExitCode::Failure
        } else {
            ExitCode::Success
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code as u8)
    }
}

// ============================================================================
// Policy
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticConfig {
    pub strict: bool,
    pub quiet: bool,
}

impl DiagnosticConfig {
    pub fn effective_severity(&self, severity: Severity) -> Severity {
        if self.strict {
            Severity::Error
        } else {
            severity
        }
    }

    pub fn should_show(&self, severity: Severity) -> bool {
        !self.quiet || self.effective_severity(severity) == Severity::Error
    }
}

/// Sink for report entries
pub trait Emitter {
    fn emit(&mut self, severity: Severity, diagnostic: &Diagnostic);

    /// Errors counted so far, after policy
    fn error_count(&self) -> usize;

    fn emit_report(&mut self, report: &ProcessingReport) {
        for (severity, diagnostic) in report.iter() {
            self.emit(severity, diagnostic);
        }
    }

    fn exit_code(&self) -> ExitCode {
        ExitCode::from_error_count(self.error_count())
    }
}

// ============================================================================
// Terminal
// ============================================================================

pub struct TerminalEmitter<W: Write> {
    writer: W,
    config: DiagnosticConfig,
    error_count: usize,
    warning_count: usize,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(writer: W, config: DiagnosticConfig) -> Self {
        Self {
            writer,
            config,
            error_count: 0,
            warning_count: 0,
        }
    }

    /// Closing line with the row counts, suppressed in quiet mode
    pub fn summary(&mut self, report: &ProcessingReport) {
        if self.config.quiet {
            return;
        }
        let _ = writeln!(
            self.writer,
            "{} tasks processed, {} rows skipped: {} error(s), {} warning(s)",
            report.tasks_processed, report.rows_skipped, self.error_count, self.warning_count
        );
    }

    fn write_diagnostic(&mut self, severity: Severity, diagnostic: &Diagnostic) -> std::io::Result<()> {
        if !self.config.should_show(severity) {
            return Ok(());
        }
        let effective = self.config.effective_severity(severity);
        match effective {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
        }
        writeln!(self.writer, "{}[{}]: {}", effective, diagnostic.code, diagnostic.message)
    }
}

impl<W: Write> Emitter for TerminalEmitter<W> {
    fn emit(&mut self, severity: Severity, diagnostic: &Diagnostic) {
        // stderr may be closed
        let _ = self.write_diagnostic(severity, diagnostic);
    }

    fn error_count(&self) -> usize {
        self.error_count
    }
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub code: String,
    pub severity: Severity,
    pub message: String,
}

/// Whole `check --format json` document
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<&'a ProjectInfo>,
    pub tasks_processed: usize,
    pub rows_skipped: usize,
    pub diagnostics: &'a [JsonDiagnostic],
}

pub struct JsonEmitter {
    diagnostics: Vec<JsonDiagnostic>,
    config: DiagnosticConfig,
}

impl JsonEmitter {
    pub fn new(config: DiagnosticConfig) -> Self {
        Self {
            diagnostics: Vec::new(),
            config,
        }
    }

    pub fn to_json_value(&self, project: Option<&ProjectInfo>, report: &ProcessingReport) -> serde_json::Value {
        let doc = JsonReport {
            project,
            tasks_processed: report.tasks_processed,
            rows_skipped: report.rows_skipped,
            diagnostics: &self.diagnostics,
        };
        serde_json::to_value(doc).unwrap_or(serde_json::Value::Null)
    }
}

impl Emitter for JsonEmitter {
    fn emit(&mut self, severity: Severity, diagnostic: &Diagnostic) {
        if !self.config.should_show(severity) {
            return;
        }
        self.diagnostics.push(JsonDiagnostic {
            code: diagnostic.code.as_str().to_string(),
            severity: self.config.effective_severity(severity),
            message: diagnostic.message.clone(),
        });
    }

    fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }
}
