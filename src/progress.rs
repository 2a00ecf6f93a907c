//! Progress computation and terminal display.
//!
//! [`ProgressTracker`] turns a stream of processed counts into a throttled
//! sequence of whole percentages for a scan's progress callback.
//! [`ProgressDisplay`] renders those percentages with indicatif for the CLI.
//!
//! # Guarantees
//!
//! - Emitted values are in `0..=100` and never decrease.
//! - `0` is always emitted by [`ProgressTracker::start`] and `100` by
//!   [`ProgressTracker::finish`], regardless of throttling.
//! - Between those, at most one value is emitted per interval, and only
//!   when the percentage changed.

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

/// Default minimum time between two throttled progress emissions.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(50);

/// Compute `floor(processed * 100 / total)`, clamped to 100.
///
/// Returns 0 when `total` is 0.
#[must_use]
pub fn percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (processed as u128 * 100) / total as u128;
    pct.min(100) as u8
}

/// Throttled percent reporter feeding a progress callback.
pub struct ProgressTracker<F: FnMut(u8)> {
    total: usize,
    processed: usize,
    last: Option<u8>,
    last_emit: Option<Instant>,
    interval: Duration,
    sink: F,
}

impl<F: FnMut(u8)> ProgressTracker<F> {
    /// Create a tracker over `total` items.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of items the scan will process
    /// * `interval` - Minimum delay between throttled emissions
    /// * `sink` - Receives each emitted percentage
    pub fn new(total: usize, interval: Duration, sink: F) -> Self {
        Self {
            total,
            processed: 0,
            last: None,
            last_emit: None,
            interval,
            sink,
        }
    }

    /// Emit 0%.
    pub fn start(&mut self) {
        self.emit(0);
    }

    /// Record `n` more processed items and emit if due.
    pub fn advance(&mut self, n: usize) {
        self.processed = self.processed.saturating_add(n).min(self.total);
        let pct = percent(self.processed, self.total);

        if self.last.is_some_and(|last| pct <= last) {
            return;
        }
        let due = self
            .last_emit
            .is_none_or(|at| at.elapsed() >= self.interval);
        if due {
            self.emit(pct);
        }
    }

    /// Emit 100% unless already emitted.
    pub fn finish(&mut self) {
        if self.last != Some(100) {
            self.emit(100);
        }
    }

    /// Items processed so far.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Total items.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    fn emit(&mut self, pct: u8) {
        // Never step backwards, even on a forced emission
        let pct = self.last.map_or(pct, |last| pct.max(last));
        self.last = Some(pct);
        self.last_emit = Some(Instant::now());
        (self.sink)(pct);
    }
}

impl<F: FnMut(u8)> std::fmt::Debug for ProgressTracker<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("total", &self.total)
            .field("processed", &self.processed)
            .field("last", &self.last)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// Terminal percent bar.
///
/// When created hidden, every method is a no-op.
#[derive(Debug)]
pub struct ProgressDisplay {
    bar: Option<ProgressBar>,
}

impl ProgressDisplay {
    /// Create a progress bar labelled `label`, or a hidden one if `hidden`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupefind::progress::ProgressDisplay;
    ///
    /// let display = ProgressDisplay::new("Scanning", true);
    /// display.set(50);
    /// display.finish("done");
    /// ```
    #[must_use]
    pub fn new(label: &str, hidden: bool) -> Self {
        if hidden {
            return Self { bar: None };
        }

        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-"),
        );
        bar.set_message(label.to_string());
        Self { bar: Some(bar) }
    }

    /// Whether the bar is displayed.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }

    /// Move the bar to `pct`.
    pub fn set(&self, pct: u8) {
        if let Some(ref bar) = self.bar {
            bar.set_position(u64::from(pct.min(100)));
        }
    }

    /// Print a line above the bar without corrupting it.
    pub fn println(&self, message: &str) {
        if let Some(ref bar) = self.bar {
            bar.println(message);
        }
    }

    /// Complete the bar, leaving `message` on screen.
    pub fn finish(&self, message: &str) {
        if let Some(ref bar) = self.bar {
            bar.finish_with_message(message.to_string());
        }
    }

    /// Stop the bar where it is, e.g. after cancellation.
    pub fn abandon(&self, message: &str) {
        if let Some(ref bar) = self.bar {
            bar.abandon_with_message(message.to_string());
        }
    }
}
