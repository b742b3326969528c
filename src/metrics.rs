// Merge metrics module
//
// Provides lightweight counters for monitoring merge throughput

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Merge performance metrics
///
/// Uses atomic operations for thread-safe metric tracking without locks.
/// A [`MergeEngine`](crate::services::MergeEngine) records into an attached
/// `Arc<Metrics>`; the summary can be logged once the run is over.
#[derive(Debug)]
pub struct Metrics {
    /// Leaf files whose header and bytes were written
    pub files_merged: AtomicUsize,

    /// Leaf files whose header carries a failure note
    pub metadata_failures: AtomicUsize,

    /// Runs aborted by a fatal error or cancellation
    pub fatal_errors: AtomicUsize,

    /// Raw source bytes copied (headers excluded)
    pub bytes_copied: AtomicU64,

    /// Lines credited to progress
    pub lines_processed: AtomicU64,

    /// Total time spent inside merge runs in milliseconds
    pub total_merge_time_ms: AtomicU64,

    /// Completed or aborted merge runs
    pub merge_runs: AtomicUsize,

    /// Creation time
    start_time: Instant,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self {
            files_merged: AtomicUsize::new(0),
            metadata_failures: AtomicUsize::new(0),
            fatal_errors: AtomicUsize::new(0),
            bytes_copied: AtomicU64::new(0),
            lines_processed: AtomicU64::new(0),
            total_merge_time_ms: AtomicU64::new(0),
            merge_runs: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_file_merged(&self, bytes: u64, lines: u64) {
        self.files_merged.fetch_add(1, Ordering::Relaxed);
        self.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
        self.lines_processed.fetch_add(lines, Ordering::Relaxed);
    }

    pub fn record_metadata_failure(&self) {
        self.metadata_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fatal_error(&self) {
        self.fatal_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the duration of one merge run
    pub fn record_merge_time(&self, duration: Duration) {
        self.merge_runs.fetch_add(1, Ordering::Relaxed);
        self.total_merge_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get average wall time per merge run in milliseconds, aborted runs included
    pub fn avg_run_time_ms(&self) -> f64 {
        let total = self.total_merge_time_ms.load(Ordering::Relaxed);
        let count = self.merge_runs.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        let uptime = self.uptime();
        tracing::info!("=== Merge Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", uptime.as_secs_f64());
        tracing::info!(
            "Runs: {}, fatal: {}, total time: {:.2}s (avg: {:.2}ms per run)",
            self.merge_runs.load(Ordering::Relaxed),
            self.fatal_errors.load(Ordering::Relaxed),
            self.total_merge_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_run_time_ms()
        );
        tracing::info!(
            "Files: {} merged, {} metadata failures",
            self.files_merged.load(Ordering::Relaxed),
            self.metadata_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Copied {} bytes, {} lines",
            self.bytes_copied.load(Ordering::Relaxed),
            self.lines_processed.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
