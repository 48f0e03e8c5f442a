//! # schedview-parser
//!
//! Turns rows of a schedule spreadsheet export into a validated task model.
//!
//! This crate provides:
//! - Header-driven column discovery (Portuguese and English exports)
//! - Total parsers for dates, durations and percentages
//! - Row extraction with per-row failure isolation
//! - Dependency linking and whole-list validation
//! - A CSV row decoder behind the [`RowDecoder`] trait
//!
//! ## Example
//!
//! ```rust
//! use schedview_parser::{ingest, Row};
//!
//! let rows: Vec<Row> = [
//!     vec!["Nome do projeto", "Sede"],
//!     vec!["Número de tarefa", "Nome", "Depende de"],
//!     vec!["1", "Projeto", ""],
//!     vec!["2", "Obra", "1TI"],
//! ]
//! .into_iter()
//! .map(|r| r.into_iter().map(String::from).collect())
//! .collect();
//!
//! let result = ingest(&rows).unwrap();
//! assert_eq!(result.project.name, "Sede");
//! assert_eq!(result.tasks[1].dependencies, vec!["1".to_string()]);
//! ```

pub mod columns;
pub mod decode;
pub mod dependencies;
pub mod fields;
pub mod hierarchy;
pub mod pipeline;
pub mod rows;
pub mod validate;

pub use columns::{map_columns, ColumnMap, LogicalField};
pub use decode::{decode_file, CsvDecoder, DecodeError, RowDecoder};
pub use dependencies::{link_dependencies, parse_dependency_tokens};
pub use fields::{parse_date, parse_duration, parse_percentage};
pub use pipeline::{calculate_project_dates, ingest};
pub use rows::{Row, RowError};
pub use validate::validate;
