// FileFactory - Merge selected files and directories into one output
//
// This is the library crate containing the merge engine, the selection model and
// their supporting infrastructure. The binary crate (main.rs) provides the CLI entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::Metrics;
pub use models::{AppState, FileListModel, HeaderRecord, MergeSettings, PathKind, UserConfig};
pub use services::{
    LineAndHashScanner, MergeEngine, MergeError, MergeSummary, ProgressReporter, ScanError,
};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
