//! Execution timing for catalog statements

use std::time::{Duration, Instant};
use log::{debug, warn};

/// Statements slower than this are logged as warnings
pub const SLOW_QUERY_THRESHOLD: Duration = Duration::from_millis(500);

/// Measures one statement execution
#[derive(Debug, Clone)]
pub struct QueryTimer {
    /// Name used in log lines
    name: String,

    /// Start time
    start: Instant,

    /// Warning threshold
    slow_threshold: Duration,
}

impl QueryTimer {
    /// Start timing
    pub fn start(name: impl Into<String>) -> Self {
        QueryTimer {
            name: name.into(),
            start: Instant::now(),
            slow_threshold: SLOW_QUERY_THRESHOLD,
        }
    }

    /// Override the warning threshold
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Whether the statement has run past the threshold
    pub fn is_slow(&self) -> bool {
        self.elapsed() > self.slow_threshold
    }

    /// Log the elapsed time and return it in milliseconds
    pub fn finish(self, rows: usize) -> u64 {
        let elapsed = self.elapsed();
        if self.is_slow() {
            warn!("{} returned {} rows in {:?} [SLOW]", self.name, rows, elapsed);
        } else {
            debug!("{} returned {} rows in {:?}", self.name, rows, elapsed);
        }
        elapsed.as_millis() as u64
    }
}
