use crate::metrics::Metrics;
use crate::models::config::{DEFAULT_COPY_BUFFER_SIZE, DEFAULT_REPORT_DIVISIONS};
use crate::models::{HeaderRecord, LineEnding, MergeSettings};
use crate::services::expansion::expand_selection;
use crate::services::reporter::ProgressReporter;
use crate::services::scanner::LineAndHashScanner;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{Local, NaiveDateTime};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::watch;

/// Wall-clock source for header timestamps
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Fatal merge errors. Each one ends the run.
///
/// Metadata scan failures are not in this list: they degrade a single header
/// and the run continues.
#[derive(Error, Debug)]
pub enum MergeError {
    /// Nothing has been written when this is returned.
    #[error("Failed to open output file {path}: {source}")]
    OutputOpen {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    /// The output keeps everything written so far, including this file's header.
    #[error("Failed to read source file {path}: {source}")]
    SourceRead {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write output file {path}: {source}")]
    OutputWrite {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Merge cancelled after {files_merged} files")]
    Cancelled { files_merged: usize },
}

/// Outcome of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub files_merged: usize,
    pub total_lines: u64,
    pub processed_lines: u64,
    pub metadata_failures: usize,
    /// Header and source bytes written by this run
    pub bytes_written: u64,
    /// Whether the run appended to existing content
    pub appended: bool,
}

/// Progress bookkeeping for one run
#[derive(Debug)]
struct MergeJob {
    total_lines: u64,
    processed_lines: u64,
    report_interval: u64,
    step: u64,
}

impl MergeJob {
    fn new(total_lines: u64, divisions: u32) -> Self {
        let step = (total_lines / u64::from(divisions.max(1))).max(1);
        Self {
            total_lines,
            processed_lines: 0,
            report_interval: step,
            step,
        }
    }

    /// Consume the next crossed threshold, if any.
    fn take_milestone(&mut self) -> bool {
        if self.processed_lines >= self.report_interval {
            self.report_interval += self.step;
            true
        } else {
            false
        }
    }
}

/// Concatenates selected files into one output, each preceded by a header block.
///
/// A run is synchronous and single-threaded. It:
/// 1. expands directories into an ordered list of leaf files
///    (see [`expand_selection`]);
/// 2. sums their line counts (unreadable files count 0);
/// 3. opens the output, appending only if asked and the file is non-empty;
/// 4. calls [`ProgressReporter::started`];
/// 5. per leaf, writes a [`HeaderRecord`] then the raw bytes, flushes them,
///    and only then reports progress and any crossed thresholds.
///
/// The threshold step is `max(total_lines / report_divisions, 1)`.
pub struct MergeEngine {
    scanner: LineAndHashScanner,
    report_divisions: u32,
    line_ending: LineEnding,
    follow_symlinks: bool,
    buffer_size: usize,
    metrics: Option<Arc<Metrics>>,
    cancel: Option<watch::Receiver<bool>>,
    clock: Clock,
}

impl MergeEngine {
    pub fn new() -> Self {
        Self {
            scanner: LineAndHashScanner::new(),
            report_divisions: DEFAULT_REPORT_DIVISIONS,
            line_ending: LineEnding::default(),
            follow_symlinks: false,
            buffer_size: DEFAULT_COPY_BUFFER_SIZE,
            metrics: None,
            cancel: None,
            clock: Arc::new(|| Local::now().naive_local()),
        }
    }

    /// Engine configured from user settings
    pub fn from_settings(settings: &MergeSettings) -> Self {
        Self::new()
            .with_report_divisions(settings.effective_report_divisions())
            .with_line_ending(settings.header_line_ending)
            .with_follow_symlinks(settings.follow_symlinks)
            .with_buffer_size(settings.effective_buffer_size())
    }

    pub fn with_report_divisions(mut self, divisions: u32) -> Self {
        self.report_divisions = divisions.max(1);
        self
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self.scanner = LineAndHashScanner::with_buffer_size(self.buffer_size);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Stop before the next file once the receiver reads `true`.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Merge `paths` into `output_path`.
    ///
    /// # Errors
    ///
    /// - [`MergeError::OutputOpen`] before anything is written
    /// - [`MergeError::SourceRead`] / [`MergeError::OutputWrite`] mid-run; the
    ///   output is left partially written
    /// - [`MergeError::Cancelled`] when cancellation is observed between files
    ///
    /// The output handle is closed on every path.
    pub fn run(
        &self,
        paths: &[Utf8PathBuf],
        output_path: &Utf8Path,
        append: bool,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<MergeSummary, MergeError> {
        let start = Instant::now();
        tracing::info!(
            "Starting merge: {} selections -> {} (append={})",
            paths.len(),
            output_path,
            append
        );

        let result = self.merge(paths, output_path, append, reporter);

        if let Some(metrics) = &self.metrics {
            metrics.record_merge_time(start.elapsed());
            if result.is_err() {
                metrics.record_fatal_error();
            }
        }

        match &result {
            Ok(summary) => tracing::info!(
                "Merge completed in {:.2}s: {} files, {}/{} lines, {} metadata failures",
                start.elapsed().as_secs_f32(),
                summary.files_merged,
                summary.processed_lines,
                summary.total_lines,
                summary.metadata_failures
            ),
            Err(e) => tracing::error!("Merge aborted: {}", e),
        }

        result
    }

    fn merge(
        &self,
        paths: &[Utf8PathBuf],
        output_path: &Utf8Path,
        append: bool,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<MergeSummary, MergeError> {
        let leaves = self.collect_leaves(paths, output_path);
        let total_lines = self.count_total_lines(&leaves);
        tracing::info!("{} files, {} lines in total", leaves.len(), total_lines);

        let appended = append
            && output_path
                .metadata()
                .map(|meta| meta.len() > 0)
                .unwrap_or(false);
        let output = open_output(output_path, appended)?;
        let mut output = BufWriter::with_capacity(self.buffer_size, output);

        reporter.started(total_lines);

        let mut job = MergeJob::new(total_lines, self.report_divisions);
        let mut summary = MergeSummary {
            total_lines,
            appended,
            ..MergeSummary::default()
        };

        for leaf in &leaves {
            if self.is_cancelled() {
                tracing::warn!("Cancellation requested, stopping before {}", leaf);
                flush_output(&mut output, output_path)?;
                return Err(MergeError::Cancelled {
                    files_merged: summary.files_merged,
                });
            }

            let metadata = self.scanner.scan(leaf);
            if metadata.is_failed() {
                summary.metadata_failures += 1;
                if let Some(metrics) = &self.metrics {
                    metrics.record_metadata_failure();
                }
            }
            let file_lines = metadata.line_count();

            let header = HeaderRecord::new((self.clock)(), leaf.clone(), metadata)
                .render(self.line_ending);
            output
                .write_all(header.as_bytes())
                .map_err(|source| MergeError::OutputWrite {
                    path: output_path.to_path_buf(),
                    source,
                })?;

            let copied = match self.copy_source(leaf, &mut output, output_path) {
                Ok(copied) => copied,
                Err(e @ MergeError::SourceRead { .. }) => {
                    // Keep the header already written for this file
                    if let Err(flush_err) = flush_output(&mut output, output_path) {
                        tracing::error!("{}", flush_err);
                    }
                    return Err(e);
                }
                Err(e) => return Err(e),
            };

            // Nothing is reported for a file until its bytes reach the output
            flush_output(&mut output, output_path)?;
            summary.bytes_written += header.len() as u64 + copied;
            summary.files_merged += 1;

            job.processed_lines += file_lines;
            reporter.progress_changed(job.processed_lines);

            let file_name = leaf.file_name().unwrap_or(leaf.as_str());
            while job.take_milestone() {
                reporter.file_processed(file_name, file_lines, job.processed_lines, job.total_lines);
            }

            if let Some(metrics) = &self.metrics {
                metrics.record_file_merged(copied, file_lines);
            }
            tracing::debug!("Merged {} ({} lines, {} bytes)", leaf, file_lines, copied);
        }

        flush_output(&mut output, output_path)?;

        summary.processed_lines = job.processed_lines;
        Ok(summary)
    }

    /// Expanded leaves, minus the output file itself if it is among them.
    fn collect_leaves(&self, paths: &[Utf8PathBuf], output_path: &Utf8Path) -> Vec<Utf8PathBuf> {
        let leaves = expand_selection(paths, self.follow_symlinks);

        let Ok(output_identity) = output_path.canonicalize_utf8() else {
            return leaves;
        };

        leaves
            .into_iter()
            .filter(|leaf| {
                let is_output = leaf
                    .canonicalize_utf8()
                    .is_ok_and(|identity| identity == output_identity);
                if is_output {
                    tracing::warn!("Skipping {}: it is the output file", leaf);
                }
                !is_output
            })
            .collect()
    }

    fn count_total_lines(&self, leaves: &[Utf8PathBuf]) -> u64 {
        leaves
            .iter()
            .map(|leaf| match self.scanner.count_lines(leaf) {
                Ok(lines) => lines,
                Err(e) => {
                    tracing::warn!("Counting 0 lines for unreadable file: {}", e);
                    0
                }
            })
            .sum()
    }

    /// Copy a source verbatim. Read failures and write failures are kept apart.
    fn copy_source<W: Write>(
        &self,
        source_path: &Utf8Path,
        output: &mut W,
        output_path: &Utf8Path,
    ) -> Result<u64, MergeError> {
        let read_error = |source| MergeError::SourceRead {
            path: source_path.to_path_buf(),
            source,
        };

        let mut input = File::open(source_path).map_err(read_error)?;
        let mut buf = vec![0u8; self.buffer_size];
        let mut copied = 0u64;

        loop {
            let n = match input.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(read_error(e)),
            };

            output
                .write_all(&buf[..n])
                .map_err(|source| MergeError::OutputWrite {
                    path: output_path.to_path_buf(),
                    source,
                })?;
            copied += n as u64;
        }

        Ok(copied)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn open_output(path: &Utf8Path, append: bool) -> Result<File, MergeError> {
    let opened = if append {
        OpenOptions::new().append(true).open(path)
    } else {
        File::create(path)
    };

    opened.map_err(|source| MergeError::OutputOpen {
        path: path.to_path_buf(),
        source,
    })
}

fn flush_output<W: Write>(output: &mut W, path: &Utf8Path) -> Result<(), MergeError> {
    output.flush().map_err(|source| MergeError::OutputWrite {
        path: path.to_path_buf(),
        source,
    })
}
