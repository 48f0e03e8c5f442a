//! Viewport windowing
//!
//! Large task lists only materialize the rows around the viewport. The range
//! is a pure function of scroll offset, row height, container height and
//! buffer size. Recomputation is debounced so a burst of scroll events costs
//! one computation: [`Debouncer`] is the runtime-free state machine and
//! [`DebouncedWindower`] drives one on the tokio clock.

use schedview_core::{GanttConfig, VirtualizationConfig, VisibleRange};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::trace;

use crate::chunk::{EpochCounter, EpochGuard};

// ============================================================================
// Windowing
// ============================================================================

/// One scroll/resize signal
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewportInput {
    pub scroll_offset: f64,
    pub container_height: f64,
    pub total_rows: usize,
}

impl ViewportInput {
    pub fn new(scroll_offset: f64, container_height: f64, total_rows: usize) -> Self {
        Self {
            scroll_offset,
            container_height,
            total_rows,
        }
    }
}

/// Visible-range calculator
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportWindower {
    pub row_height: f64,
    pub buffer_rows: usize,
    pub threshold: usize,
    pub enabled: bool,
}

impl Default for ViewportWindower {
    fn default() -> Self {
        Self::from_config(&GanttConfig::default(), &VirtualizationConfig::default())
    }
}

impl ViewportWindower {
    pub fn from_config(gantt: &GanttConfig, virtualization: &VirtualizationConfig) -> Self {
        Self {
            row_height: gantt.row_height,
            buffer_rows: virtualization.buffer_rows,
            threshold: virtualization.threshold,
            enabled: virtualization.enabled,
        }
    }

    /// Windowing applies to this many rows
    pub fn is_virtualized(&self, total_rows: usize) -> bool {
        self.enabled && total_rows >= self.threshold
    }

    /// Rows to materialize for `input`.
    ///
    /// Below the threshold every row is materialized. Negative offsets count
    /// as zero.
    pub fn compute(&self, input: &ViewportInput) -> VisibleRange {
        let total = input.total_rows;
        if !self.is_virtualized(total) || self.row_height <= 0.0 {
            return VisibleRange::new(0, total);
        }

        let visible_rows = (input.container_height.max(0.0) / self.row_height).ceil() as usize;
        let first = (input.scroll_offset.max(0.0) / self.row_height).floor() as usize;

        let start = first.saturating_sub(self.buffer_rows).min(total);
        let end = first
            .saturating_add(visible_rows)
            .saturating_add(self.buffer_rows)
            .min(total);
        VisibleRange::new(start, end.max(start))
    }
}

// ============================================================================
// Debouncing
// ============================================================================

/// Single-slot trailing debouncer driven by caller-supplied instants.
///
/// A new value replaces the pending one and restarts the interval.
#[derive(Debug)]
pub struct Debouncer<T> {
    interval: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    pub fn schedule(&mut self, now: Instant, value: T) {
        self.pending = Some((now + self.interval, value));
    }

    /// The pending value, once its interval has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.pending.take() {
            Some((due, value)) if due <= now => Some(value),
            other => {
                self.pending = other;
                None
            }
        }
    }

    /// Drop the pending value without firing it
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(due, _)| *due)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Pending request plus whether a driver task is currently servicing it
#[derive(Debug)]
struct DriverState {
    debouncer: Debouncer<(ViewportInput, EpochGuard)>,
    running: bool,
}

fn lock(state: &Mutex<DriverState>) -> MutexGuard<'_, DriverState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Debounced windower on the tokio runtime.
///
/// Requests land in a shared [`Debouncer`]; one driver task sleeps until its
/// deadline and publishes the range on a watch channel. Results computed for
/// an older dataset epoch are discarded.
#[derive(Debug)]
pub struct DebouncedWindower {
    windower: ViewportWindower,
    epochs: EpochCounter,
    state: Arc<Mutex<DriverState>>,
    driver: Option<JoinHandle<()>>,
    tx: Arc<watch::Sender<Option<VisibleRange>>>,
}

impl DebouncedWindower {
    pub fn new(windower: ViewportWindower, interval: Duration, epochs: EpochCounter) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            windower,
            epochs,
            state: Arc::new(Mutex::new(DriverState {
                debouncer: Debouncer::new(interval),
                running: false,
            })),
            driver: None,
            tx: Arc::new(tx),
        }
    }

    /// Latest published range; `None` until the first computation lands
    pub fn subscribe(&self) -> watch::Receiver<Option<VisibleRange>> {
        self.tx.subscribe()
    }

    /// Schedule a recomputation. Must be called within a tokio runtime.
    pub fn request(&mut self, input: ViewportInput) {
        let now = time::Instant::now().into_std();
        let start_driver = {
            let mut state = lock(&self.state);
            state.debouncer.schedule(now, (input, self.epochs.guard()));
            !std::mem::replace(&mut state.running, true)
        };
        if start_driver {
            let state = Arc::clone(&self.state);
            let tx = Arc::clone(&self.tx);
            self.driver = Some(tokio::spawn(drive(self.windower, state, tx)));
        }
    }

    /// Drop the pending request, if any
    pub fn cancel(&mut self) {
        {
            let mut state = lock(&self.state);
            state.debouncer.cancel();
            state.running = false;
        }
        if let Some(handle) = self.driver.take() {
            handle.abort();
        }
    }

    /// Forget the last result, e.g. after a new dataset was loaded
    pub fn reset(&mut self) {
        self.cancel();
        self.tx.send_replace(None);
    }
}

impl Drop for DebouncedWindower {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Sleep to the debouncer's deadline until nothing is pending
async fn drive(
    windower: ViewportWindower,
    state: Arc<Mutex<DriverState>>,
    tx: Arc<watch::Sender<Option<VisibleRange>>>,
) {
    loop {
        let deadline = {
            let mut state = lock(&state);
            match state.debouncer.deadline() {
                Some(due) => due,
                None => {
                    state.running = false;
                    return;
                }
            }
        };
        time::sleep_until(time::Instant::from_std(deadline)).await;

        let fired = lock(&state).debouncer.poll(time::Instant::now().into_std());
        let Some((input, guard)) = fired else {
            continue;
        };
        if !guard.is_current() {
            trace!(epoch = guard.epoch(), "stale viewport request dropped");
            continue;
        }
        let range = windower.compute(&input);
        trace!(start = range.start, end = range.end, "viewport recomputed");
        tx.send_replace(Some(range));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn windower() -> ViewportWindower {
        ViewportWindower::default()
    }

    #[test]
    fn initial_window_for_large_list() {
        let range = windower().compute(&ViewportInput::new(0.0, 800.0, 1000));
        assert_eq!(range.start, 0);
        assert!(range.end <= 40);
        assert_eq!(range, VisibleRange::new(0, 40));
    }

    #[test]
    fn scrolled_window_includes_buffers() {
        let range = windower().compute(&ViewportInput::new(4000.0, 800.0, 1000));
        assert_eq!(range, VisibleRange::new(80, 140));
    }

    #[test]
    fn window_clamps_at_end() {
        let range = windower().compute(&ViewportInput::new(39_900.0, 800.0, 1000));
        assert_eq!(range, VisibleRange::new(977, 1000));

        let past_end = windower().compute(&ViewportInput::new(1e9, 800.0, 1000));
        assert_eq!(past_end, VisibleRange::new(1000, 1000));
    }

    #[test]
    fn start_is_monotonic_in_scroll() {
        let w = windower();
        let mut last = 0;
        for step in 0..2000 {
            let range = w.compute(&ViewportInput::new(f64::from(step) * 17.0, 800.0, 1000));
            assert!(range.start >= last);
            assert!(range.start <= range.end);
            last = range.start;
        }
    }

    #[test]
    fn below_threshold_materializes_everything() {
        let w = windower();
        assert!(!w.is_virtualized(199));
        assert!(w.is_virtualized(200));
        assert_eq!(w.compute(&ViewportInput::new(4000.0, 800.0, 150)), VisibleRange::new(0, 150));

        let off = ViewportWindower {
            enabled: false,
            ..windower()
        };
        assert_eq!(off.compute(&ViewportInput::new(4000.0, 800.0, 5000)), VisibleRange::new(0, 5000));
    }

    #[test]
    fn identical_inputs_identical_ranges() {
        let input = ViewportInput::new(1234.5, 640.0, 3000);
        assert_eq!(windower().compute(&input), windower().compute(&input));
    }

    #[test]
    fn debouncer_fires_last_value_once() {
        let t0 = Instant::now();
        let ms = Duration::from_millis;
        let mut debouncer = Debouncer::new(ms(16));

        debouncer.schedule(t0, 1);
        debouncer.schedule(t0 + ms(5), 2);
        debouncer.schedule(t0 + ms(10), 3);

        assert_eq!(debouncer.poll(t0 + ms(20)), None);
        assert_eq!(debouncer.deadline(), Some(t0 + ms(26)));
        assert_eq!(debouncer.poll(t0 + ms(26)), Some(3));
        assert_eq!(debouncer.poll(t0 + ms(100)), None);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn debouncer_cancel_drops_pending() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(16));
        debouncer.schedule(t0, "scroll");

        assert_eq!(debouncer.cancel(), Some("scroll"));
        assert_eq!(debouncer.poll(t0 + Duration::from_secs(1)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn driver_coalesces_requests() {
        let epochs = EpochCounter::new();
        let mut driver = DebouncedWindower::new(windower(), Duration::from_millis(16), epochs);
        let mut rx = driver.subscribe();

        driver.request(ViewportInput::new(0.0, 800.0, 1000));
        tokio::time::sleep(Duration::from_millis(5)).await;
        driver.request(ViewportInput::new(400.0, 800.0, 1000));
        tokio::time::sleep(Duration::from_millis(5)).await;
        driver.request(ViewportInput::new(4000.0, 800.0, 1000));

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Some(VisibleRange::new(80, 140)));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn driver_drops_results_from_old_epoch() {
        let epochs = EpochCounter::new();
        let mut driver = DebouncedWindower::new(windower(), Duration::from_millis(16), epochs.clone());
        let rx = driver.subscribe();

        driver.request(ViewportInput::new(0.0, 800.0, 1000));
        epochs.advance();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(*rx.borrow(), None);
        driver.reset();
    }

    #[tokio::test(start_paused = true)]
    async fn driver_cancel_prevents_publication() {
        let mut driver = DebouncedWindower::new(windower(), Duration::from_millis(16), EpochCounter::new());
        let rx = driver.subscribe();

        driver.request(ViewportInput::new(0.0, 800.0, 1000));
        driver.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(*rx.borrow(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn driver_restarts_after_going_idle() {
        let mut driver = DebouncedWindower::new(windower(), Duration::from_millis(16), EpochCounter::new());
        let mut rx = driver.subscribe();

        driver.request(ViewportInput::new(0.0, 800.0, 1000));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*rx.borrow_and_update(), Some(VisibleRange::new(0, 40)));
        assert!(!lock(&driver.state).running);

        driver.request(ViewportInput::new(4000.0, 800.0, 1000));
        assert!(lock(&driver.state).debouncer.is_pending());
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Some(VisibleRange::new(80, 140)));
    }
}
