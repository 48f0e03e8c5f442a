//! Loaded dataset plus everything derived from it
//!
//! A [`Session`] owns the epoch counter shared by all background work. Loading
//! a new file advances the epoch first, so debounced viewport results and
//! chunked jobs from the previous dataset can no longer publish anything.

use chrono::NaiveDate;
use schedview_core::{Ingested, IngestFailure, SchedviewConfig, VisibleRange};
use schedview_parser::{ingest, Row};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::chunk::{ChunkedJob, EpochCounter};
use crate::position::{BarGeometry, EdgeIndex, EdgePath, PositionMapper};
use crate::timeline::{MonthGroup, TimeRange};
use crate::viewport::{DebouncedWindower, ViewportInput, ViewportWindower};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Ingest(#[from] IngestFailure),

    #[error("A newer dataset was loaded while this one was processing")]
    Superseded,

    #[error("No dataset loaded")]
    Empty,

    #[error("Background task failed: {0}")]
    Join(String),
}

/// Chart geometry for the materialized window
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayoutSnapshot {
    pub time_range: TimeRange,
    pub months: Vec<MonthGroup>,
    pub total_rows: usize,
    pub virtualized: bool,
    pub visible: VisibleRange,
    pub bars: Vec<BarGeometry>,
    pub edges: Vec<EdgePath>,
}

impl LayoutSnapshot {
    /// Compute the layout in one pass, indexing dependencies first
    pub fn build(data: &Ingested, config: &SchedviewConfig, input: &ViewportInput, today: NaiveDate) -> Self {
        Self::build_indexed(data, &EdgeIndex::build(&data.tasks), config, input, today)
    }

    /// Compute the layout with a prepared dependency index; work is bounded
    /// by the window, not the dataset
    pub fn build_indexed(
        data: &Ingested,
        edges: &EdgeIndex,
        config: &SchedviewConfig,
        input: &ViewportInput,
        today: NaiveDate,
    ) -> Self {
        let time_range = TimeRange::for_project(&data.project, &config.gantt, today);
        let windower = ViewportWindower::from_config(&config.gantt, &config.virtualization);
        let visible = windower.compute(input);
        let mapper = PositionMapper::new(&time_range, &config.gantt);

        Self {
            months: time_range.months(),
            time_range,
            total_rows: data.tasks.len(),
            virtualized: windower.is_virtualized(data.tasks.len()),
            visible,
            bars: mapper.bars_for(&data.tasks, visible),
            edges: mapper.edges_for(&data.tasks, edges, visible),
        }
    }
}

/// Dataset plus the indexes prepared for it at load time
#[derive(Debug)]
struct Loaded {
    data: Arc<Ingested>,
    edges: EdgeIndex,
}

/// Shared handle to the current dataset
#[derive(Clone, Debug)]
pub struct Session {
    config: Arc<SchedviewConfig>,
    epochs: EpochCounter,
    current: Arc<RwLock<Option<Arc<Loaded>>>>,
}

impl Session {
    pub fn new(config: SchedviewConfig) -> Self {
        Self {
            config: Arc::new(config),
            epochs: EpochCounter::new(),
            current: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config(&self) -> &SchedviewConfig {
        &self.config
    }

    pub fn epochs(&self) -> &EpochCounter {
        &self.epochs
    }

    /// Replace the dataset.
    ///
    /// Earlier work is invalidated before ingestion starts; if another load
    /// begins before this one publishes, this one returns
    /// [`SessionError::Superseded`] and leaves the session untouched.
    ///
    /// The dependency index is built alongside ingestion so viewport layouts
    /// never scan the whole dataset.
    pub async fn load(&self, rows: Vec<Row>) -> Result<Arc<Ingested>, SessionError> {
        self.epochs.advance();
        let guard = self.epochs.guard();
        *self.current.write().await = None;
        debug!(epoch = guard.epoch(), rows = rows.len(), "loading dataset");

        let result = tokio::task::spawn_blocking(move || {
            ingest(&rows).map(|data| {
                let edges = EdgeIndex::build(&data.tasks);
                Loaded {
                    data: Arc::new(data),
                    edges,
                }
            })
        })
        .await
        .map_err(|e| SessionError::Join(e.to_string()))?;

        // A newer load advances the epoch before it clears the slot, so the
        // check must happen under the write lock.
        let mut slot = self.current.write().await;
        if !guard.is_current() {
            debug!(epoch = guard.epoch(), "load superseded");
            return Err(SessionError::Superseded);
        }

        let loaded = Arc::new(result?);
        let data = Arc::clone(&loaded.data);
        info!(
            epoch = guard.epoch(),
            tasks = data.tasks.len(),
            links = loaded.edges.link_count(),
            "dataset loaded"
        );
        *slot = Some(loaded);
        Ok(data)
    }

    pub async fn current(&self) -> Option<Arc<Ingested>> {
        self.current.read().await.as_ref().map(|loaded| Arc::clone(&loaded.data))
    }

    /// Debounced windower bound to this session's epochs
    pub fn windower(&self) -> DebouncedWindower {
        DebouncedWindower::new(
            ViewportWindower::from_config(&self.config.gantt, &self.config.virtualization),
            self.config.performance.debounce(),
            self.epochs.clone(),
        )
    }

    /// Layout for the current dataset, bars materialized in budgeted chunks
    pub async fn layout(&self, input: ViewportInput, today: NaiveDate) -> Result<LayoutSnapshot, SessionError> {
        let guard = self.epochs.guard();
        let loaded = self.current.read().await.clone().ok_or(SessionError::Empty)?;
        let data = &loaded.data;
        let config = &self.config;

        let time_range = TimeRange::for_project(&data.project, &config.gantt, today);
        let windower = ViewportWindower::from_config(&config.gantt, &config.virtualization);
        let visible = windower.compute(&input);
        let mapper = PositionMapper::new(&time_range, &config.gantt);

        let mut bars = Vec::with_capacity(visible.len());
        let job = ChunkedJob::new(visible.start..visible.end, config.virtualization.chunk_size, guard);
        let finished = job
            .run(config.performance.render_budget(), |row| {
                if let Some(bar) = data.tasks.get(row).and_then(|t| mapper.bar(t, row)) {
                    bars.push(bar);
                }
            })
            .await;
        if !finished {
            return Err(SessionError::Superseded);
        }

        Ok(LayoutSnapshot {
            months: time_range.months(),
            time_range,
            total_rows: data.tasks.len(),
            virtualized: windower.is_virtualized(data.tasks.len()),
            visible,
            bars,
            edges: mapper.edges_for(&data.tasks, &loaded.edges, visible),
        })
    }
}
