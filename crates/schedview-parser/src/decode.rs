//! Row decoders
//!
//! The pipeline only sees `Vec<Row>`. A [`RowDecoder`] turns file bytes into
//! rows; CSV is the format decoded here. Spreadsheet binaries pass the file
//! check but have no decoder and are refused with [`DecodeError::NoDecoder`].

use schedview_core::{FileConfig, FileRejection};
use std::fs;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::rows::Row;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Rejected(#[from] FileRejection),

    #[error("No decoder for '{0}' files; export the sheet as CSV")]
    NoDecoder(String),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

// ============================================================================
// Decoder seam
// ============================================================================

/// Source of raw sheet rows
pub trait RowDecoder {
    /// Decode every row; cells keep their text, blanks are empty strings
    fn decode(&self, input: &mut dyn Read) -> Result<Vec<Row>, DecodeError>;
}

/// CSV rows with no header handling and ragged lengths allowed
#[derive(Clone, Copy, Debug)]
pub struct CsvDecoder {
    delimiter: u8,
}

impl Default for CsvDecoder {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Pick `;` when the first non-blank line has more semicolons than commas
    pub fn sniff(sample: &str) -> Self {
        let line = sample.lines().find(|l| !l.trim().is_empty()).unwrap_or_default();
        let semis = line.matches(';').count();
        let commas = line.matches(',').count();
        Self::new().delimiter(if semis > commas { b';' } else { b',' })
    }
}

impl RowDecoder for CsvDecoder {
    fn decode(&self, input: &mut dyn Read) -> Result<Vec<Row>, DecodeError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(input);

        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record?;
            let row: Row = record
                .iter()
                .map(|cell| String::from_utf8_lossy(cell).into_owned())
                .collect();
            rows.push(row);
        }

        if let Some(first) = rows.first_mut().and_then(|r| r.first_mut()) {
            if let Some(stripped) = first.strip_prefix('\u{feff}') {
                *first = stripped.to_string();
            }
        }

        Ok(rows)
    }
}

// ============================================================================
// Files
// ============================================================================

/// Check, read and decode a schedule file
pub fn decode_file(path: &Path, files: &FileConfig) -> Result<Vec<Row>, DecodeError> {
    let io_err = |source| DecodeError::Io {
        path: path.display().to_string(),
        source,
    };

    let size = fs::metadata(path).map_err(io_err)?.len();
    files.check(path, size)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();
    if extension != "csv" {
        return Err(DecodeError::NoDecoder(extension));
    }

    let bytes = fs::read(path).map_err(io_err)?;
    let decoder = CsvDecoder::sniff(&String::from_utf8_lossy(&bytes));
    let rows = decoder.decode(&mut bytes.as_slice())?;
    debug!(path = %path.display(), rows = rows.len(), "decoded file");
    Ok(rows)
}
