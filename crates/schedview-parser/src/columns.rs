//! Header-driven column discovery
//!
//! Column meaning comes from header text, never from position. Each logical
//! field owns an ordered list of case-insensitive patterns. Header cells are
//! scanned left to right; the first cell that satisfies a still-unmapped field
//! claims it, and a single cell may claim more than one field.

use regex::Regex;
use schedview_core::{DiagnosticCode, IngestError, ProcessingReport};
use std::sync::OnceLock;

/// A column the extractor knows how to read
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicalField {
    TaskNumber,
    HierarchyLevel,
    Name,
    AssignedTo,
    Duration,
    Start,
    Finish,
    DependsOn,
    PercentComplete,
    Bucket,
}

impl LogicalField {
    /// Declaration order; also the order fields are tried per header cell
    pub const ALL: [LogicalField; 10] = [
        LogicalField::TaskNumber,
        LogicalField::HierarchyLevel,
        LogicalField::Name,
        LogicalField::AssignedTo,
        LogicalField::Duration,
        LogicalField::Start,
        LogicalField::Finish,
        LogicalField::DependsOn,
        LogicalField::PercentComplete,
        LogicalField::Bucket,
    ];

    /// Fields whose absence aborts ingestion
    pub const REQUIRED: [LogicalField; 2] = [LogicalField::TaskNumber, LogicalField::Name];

    /// Fields whose absence is only reported
    pub const RECOMMENDED: [LogicalField; 3] =
        [LogicalField::Start, LogicalField::Finish, LogicalField::Duration];

    pub fn key(&self) -> &'static str {
        match self {
            LogicalField::TaskNumber => "task_number",
            LogicalField::HierarchyLevel => "hierarchy_level",
            LogicalField::Name => "name",
            LogicalField::AssignedTo => "assigned_to",
            LogicalField::Duration => "duration",
            LogicalField::Start => "start",
            LogicalField::Finish => "finish",
            LogicalField::DependsOn => "depends_on",
            LogicalField::PercentComplete => "percent_complete",
            LogicalField::Bucket => "bucket",
        }
    }

    fn patterns(&self) -> &'static [&'static str] {
        match self {
            LogicalField::TaskNumber => &[r"^número de tarefa$", r"^task number$", r"^id$"],
            LogicalField::HierarchyLevel => &[
                r"número do nível hierárquico",
                r"hierarchy level",
                r"nível hierárquico",
                r"nivel hierarquico",
            ],
            LogicalField::Name => &[r"^nome$", r"^name$", r"^task name$"],
            LogicalField::AssignedTo => &[r"atribuída a", r"assigned to", r"responsavel"],
            LogicalField::Duration => &[r"^duração$", r"^duration$"],
            LogicalField::Start => &[r"^início$", r"^start$", r"^inicio$"],
            LogicalField::Finish => &[r"^concluir$", r"^finish$", r"^end$", r"^fim$"],
            LogicalField::DependsOn => &[r"^depende de$", r"^depends on$", r"^predecessors$"],
            LogicalField::PercentComplete => &[
                r"^% concluída$",
                r"^percent complete$",
                r"^% complete$",
                r"^progresso$",
            ],
            LogicalField::Bucket => &[r"^bucket$", r"^categoria$", r"^category$"],
        }
    }
}

/// Compiled rule table: field -> ordered matchers
fn rules() -> &'static [(LogicalField, Vec<Regex>)] {
    static RULES: OnceLock<Vec<(LogicalField, Vec<Regex>)>> = OnceLock::new();
    RULES.get_or_init(|| {
        LogicalField::ALL
            .iter()
            .map(|field| {
                let matchers = field
                    .patterns()
                    .iter()
                    .map(|p| Regex::new(&format!("(?i){p}")).expect("valid column pattern"))
                    .collect();
                (*field, matchers)
            })
            .collect()
    })
}

/// Logical field -> column index for one header row
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnMap {
    slots: [Option<usize>; LogicalField::ALL.len()],
}

impl ColumnMap {
    pub fn get(&self, field: LogicalField) -> Option<usize> {
        self.slots[field as usize]
    }

    pub fn contains(&self, field: LogicalField) -> bool {
        self.get(field).is_some()
    }

    fn set(&mut self, field: LogicalField, index: usize) {
        self.slots[field as usize] = Some(index);
    }

    /// Mapped fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (LogicalField, usize)> + '_ {
        LogicalField::ALL
            .iter()
            .filter_map(|f| self.get(*f).map(|i| (*f, i)))
    }

    /// Fatal when a required field is missing; warns about recommended ones
    pub fn check(&self) -> Result<ProcessingReport, IngestError> {
        let missing: Vec<String> = LogicalField::REQUIRED
            .iter()
            .filter(|f| !self.contains(**f))
            .map(|f| f.key().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(IngestError::MissingRequiredColumns(missing));
        }

        let mut report = ProcessingReport::new();
        let missing_recommended: Vec<&str> = LogicalField::RECOMMENDED
            .iter()
            .filter(|f| !self.contains(**f))
            .map(|f| f.key())
            .collect();
        if !missing_recommended.is_empty() {
            report.warn(
                DiagnosticCode::MissingRecommendedColumns,
                format!("Recommended columns not found: {}", missing_recommended.join(", ")),
            );
        }
        Ok(report)
    }
}

/// Build the column map for a header row
pub fn map_columns<S: AsRef<str>>(headers: &[S]) -> ColumnMap {
    let mut map = ColumnMap::default();

    for (index, header) in headers.iter().enumerate() {
        let header = header.as_ref().trim();
        if header.is_empty() {
            continue;
        }
        for (field, matchers) in rules() {
            if map.contains(*field) {
                continue;
            }
            if matchers.iter().any(|re| re.is_match(header)) {
                map.set(*field, index);
            }
        }
    }

    map
}
