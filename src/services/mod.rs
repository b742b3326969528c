//! Services module - Pure business logic for merging files.
//!
//! The services are **framework-agnostic** and have no dependencies on any front end,
//! making them testable and reusable from a CLI, a GUI, or tests.
//!
//! # Components
//!
//! - [`LineAndHashScanner`]: Line counting and MD5 hashing of one file, streamed
//! - [`expand_selection`]: Turns selected files and directories into an ordered list of leaf files
//! - [`MergeEngine`]: Runs a merge. Handles:
//!   - A pre-pass summing line counts
//!   - Output acquisition (create/truncate, or append to a non-empty file)
//!   - Header injection and verbatim byte copy per leaf file
//!   - Threshold-based progress notifications
//! - [`ProgressReporter`]: The notification contract a front end implements
//!
//! # Failure Policy
//!
//! Metadata failures ([`ScanError`]) never abort a run; they turn into an inline note in the
//! file's header and the file contributes 0 lines. Everything in [`MergeError`] is fatal.
//! A source that fails while its bytes are copied is fatal even though its header is already
//! written, so the output is left partial.
//!
//! # Usage Example
//!
//! ```ignore
//! use file_factory::services::{MergeEngine, RecordingReporter};
//!
//! let engine = MergeEngine::from_settings(&settings);
//! let mut reporter = RecordingReporter::new();
//!
//! let summary = engine.run(&list.snapshot(), Utf8Path::new("merged.txt"), false, &mut reporter)?;
//! println!("{} files merged", summary.files_merged);
//! ```

pub mod expansion;
pub mod merge;
pub mod reporter;
pub mod scanner;

pub use expansion::expand_selection;
pub use merge::{Clock, MergeEngine, MergeError, MergeSummary};
pub use reporter::{ProgressEvent, ProgressReporter, RecordingReporter};
pub use scanner::{LineAndHashScanner, ScanError, compute_hash_in, count_lines_in};
