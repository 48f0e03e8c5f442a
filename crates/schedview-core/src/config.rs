//! Layout, virtualization and file-acceptance settings
//!
//! Every field has a built-in default; a partial TOML document overrides only
//! the keys it names.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// All tunables, grouped the way the front end consumes them
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedviewConfig {
    pub gantt: GanttConfig,
    pub virtualization: VirtualizationConfig,
    pub performance: PerformanceConfig,
    pub file: FileConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid config: gantt.{key} = {value} (expected 0 to {})", MAX_SPAN_DAYS)]
    OutOfRange { key: &'static str, value: i64 },
}

/// Upper bound for any margin or fallback span, in days
pub const MAX_SPAN_DAYS: i64 = 36_500;

impl SchedviewConfig {
    /// Parse a TOML document; absent keys keep their defaults
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.gantt.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

/// Timeline geometry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GanttConfig {
    /// Width of one day column in pixels
    pub day_width: f64,
    /// Height of one task row in pixels
    pub row_height: f64,
    /// Padding days before the earliest bar
    pub margin_days_before: i64,
    /// Padding days after the latest bar
    pub margin_days_after: i64,
    /// Days before today used when no start date is known
    pub fallback_days_before: i64,
    /// Days after today used when no end date is known
    pub fallback_days_after: i64,
    /// Horizontal run of a dependency edge before it turns
    pub edge_elbow: f64,
}

impl GanttConfig {
    /// Margins and fallbacks must lie in `0..=MAX_SPAN_DAYS`
    pub fn validate(&self) -> Result<(), ConfigError> {
        let spans = [
            ("margin_days_before", self.margin_days_before),
            ("margin_days_after", self.margin_days_after),
            ("fallback_days_before", self.fallback_days_before),
            ("fallback_days_after", self.fallback_days_after),
        ];
        for (key, value) in spans {
            if !(0..=MAX_SPAN_DAYS).contains(&value) {
                return Err(ConfigError::OutOfRange { key, value });
            }
        }
        Ok(())
    }
}

impl Default for GanttConfig {
    fn default() -> Self {
        Self {
            day_width: 30.0,
            row_height: 40.0,
            margin_days_before: 7,
            margin_days_after: 14,
            fallback_days_before: 30,
            fallback_days_after: 90,
            edge_elbow: 20.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualizationConfig {
    pub enabled: bool,
    /// Minimum task count that turns windowing on
    pub threshold: usize,
    /// Extra rows materialized above and below the viewport
    pub buffer_rows: usize,
    /// Items materialized per scheduling turn at most
    pub chunk_size: usize,
}

impl Default for VirtualizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 200,
            buffer_rows: 20,
            chunk_size: 50,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub batch_size: usize,
    /// Scroll/resize coalescing window in milliseconds
    pub debounce_ms: u64,
    /// Per-turn materialization budget in milliseconds
    pub max_render_ms: u64,
}

impl PerformanceConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn render_budget(&self) -> Duration {
        Duration::from_millis(self.max_render_ms)
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            debounce_ms: 16,
            max_render_ms: 16,
        }
    }
}

/// Input files the front end accepts
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub max_size_bytes: u64,
    /// Lowercase extensions including the dot
    pub accepted_extensions: Vec<String>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 50 * 1024 * 1024,
            accepted_extensions: vec![".xlsx".into(), ".xls".into(), ".csv".into()],
        }
    }
}

/// Why a file was refused before decoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileRejection {
    #[error("File too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    #[error("Unsupported file type: {0}")]
    UnsupportedExtension(String),
}

impl FileConfig {
    /// Check extension (case-insensitive) and size
    pub fn check(&self, path: &Path, size: u64) -> Result<(), FileRejection> {
        if size > self.max_size_bytes {
            return Err(FileRejection::TooLarge {
                size,
                limit: self.max_size_bytes,
            });
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_lowercase();
        if self.accepted_extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
            Ok(())
        } else {
            Err(FileRejection::UnsupportedExtension(name))
        }
    }
}
