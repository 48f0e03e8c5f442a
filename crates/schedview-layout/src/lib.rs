//! # schedview-layout
//!
//! Gantt geometry for an ingested schedule.
//!
//! This crate provides:
//! - The rendered time span, its day columns and month groups
//! - Pixel offsets for task bars and dependency edges
//! - Viewport windowing with debounced recomputation
//! - Time-budgeted chunked materialization tied to dataset epochs
//! - The flat table projection used for filtering, sorting and CSV export
//!
//! ## Example
//!
//! ```rust
//! use schedview_core::VisibleRange;
//! use schedview_layout::{ViewportInput, ViewportWindower};
//!
//! let windower = ViewportWindower::default();
//! let range = windower.compute(&ViewportInput::new(0.0, 800.0, 1000));
//! assert_eq!(range, VisibleRange::new(0, 40));
//! ```

pub mod chunk;
pub mod export;
pub mod position;
pub mod session;
pub mod timeline;
pub mod viewport;

pub use chunk::{ChunkedJob, EpochCounter, EpochGuard, Step};
pub use export::{
    write_csv, ExportError, ExportRow, SortDirection, SortKey, StatusFilter, TableQuery, TableSummary,
};
pub use position::{BarGeometry, EdgeIndex, EdgePath, PositionMapper};
pub use session::{LayoutSnapshot, Session, SessionError};
pub use timeline::{DayCell, MonthGroup, TimeRange};
pub use viewport::{DebouncedWindower, Debouncer, ViewportInput, ViewportWindower};
