//! Debounced autosave timing.
//!
//! `Debouncer` owns no thread or task. Every edit restarts the quiet period;
//! the caller polls [`Debouncer::should_flush`] from its loop and writes once
//! the document has been left alone for the configured delay, so a burst of
//! edits turns into a single write.

use std::time::{Duration, Instant};

use tracing::debug;

/// Default quiet period in milliseconds.
pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 1000;

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    /// Time of the most recent unsaved change
    last_change: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_change: None,
        }
    }

    /// Record a change, restarting the quiet period.
    pub fn mark_dirty(&mut self) {
        if self.last_change.is_none() {
            debug!("Document marked as dirty");
        }
        self.last_change = Some(Instant::now());
    }

    /// Clear the pending change after a write attempt.
    pub fn mark_flushed(&mut self) {
        self.last_change = None;
    }

    pub fn is_dirty(&self) -> bool {
        self.last_change.is_some()
    }

    /// Whether the quiet period after the last change has elapsed.
    pub fn should_flush(&self) -> bool {
        self.last_change
            .is_some_and(|changed| changed.elapsed() >= self.delay)
    }

    /// Time left before a flush would be due, `None` when nothing is pending.
    pub fn time_until_flush(&self) -> Option<Duration> {
        self.last_change
            .map(|changed| self.delay.saturating_sub(changed.elapsed()))
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_AUTOSAVE_DELAY_MS))
    }
}
