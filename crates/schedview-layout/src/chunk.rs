//! Time-budgeted materialization and dataset epochs
//!
//! Large outputs are produced a chunk per scheduling turn. Every job is tied
//! to the epoch it was created in; advancing the epoch (a new file was
//! loaded) makes all older jobs inert.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// Shared dataset generation counter
#[derive(Clone, Debug, Default)]
pub struct EpochCounter(Arc<AtomicU64>);

impl EpochCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Start a new generation; returns its number
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Capture the current generation
    pub fn guard(&self) -> EpochGuard {
        EpochGuard {
            counter: self.clone(),
            epoch: self.current(),
        }
    }
}

/// Generation captured by a job at creation
#[derive(Clone, Debug)]
pub struct EpochGuard {
    counter: EpochCounter,
    epoch: u64,
}

impl EpochGuard {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// No newer dataset has been loaded since capture
    pub fn is_current(&self) -> bool {
        self.counter.current() == self.epoch
    }
}

/// Result of one [`ChunkedJob::step`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Items remain for a later turn
    Yielded { processed: usize },
    /// Queue drained
    Done { processed: usize },
    /// Epoch moved on; nothing was processed and nothing will be
    Cancelled,
}

/// Work queue drained in bounded steps
#[derive(Debug)]
pub struct ChunkedJob<T> {
    queue: VecDeque<T>,
    chunk_size: usize,
    guard: EpochGuard,
}

impl<T> ChunkedJob<T> {
    pub fn new(items: impl IntoIterator<Item = T>, chunk_size: usize, guard: EpochGuard) -> Self {
        Self {
            queue: items.into_iter().collect(),
            chunk_size: chunk_size.max(1),
            guard,
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn is_cancelled(&self) -> bool {
        !self.guard.is_current()
    }

    /// Process items until `chunk_size` is reached or `deadline` passes.
    ///
    /// At least one item is processed per call while any remain, so a job
    /// always makes progress even with an expired deadline.
    pub fn step<F: FnMut(T)>(&mut self, deadline: Instant, mut f: F) -> Step {
        if self.is_cancelled() {
            self.queue.clear();
            return Step::Cancelled;
        }

        let mut processed = 0;
        while let Some(item) = self.queue.pop_front() {
            f(item);
            processed += 1;
            if processed >= self.chunk_size || Instant::now() >= deadline {
                break;
            }
        }

        trace!(processed, remaining = self.queue.len(), "chunk step");
        if self.queue.is_empty() {
            Step::Done { processed }
        } else {
            Step::Yielded { processed }
        }
    }

    /// Drive the job to completion, yielding to the runtime between turns.
    ///
    /// Returns `false` when the job was cancelled before it drained.
    pub async fn run<F: FnMut(T)>(mut self, budget: Duration, mut f: F) -> bool {
        loop {
            match self.step(Instant::now() + budget, &mut f) {
                Step::Done { .. } => return true,
                Step::Cancelled => return false,
                Step::Yielded { .. } => tokio::task::yield_now().await,
            }
        }
    }
}
