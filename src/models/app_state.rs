use crate::models::config::DEFAULT_REPORT_DIVISIONS;
use crate::models::LineEnding;
use camino::Utf8PathBuf;

/// Merge progress and settings as seen by a front end.
///
/// This is the model behind the progress bar and console log of the window
/// layer: the bar's maximum is `total_lines`, its value is `processed_lines`,
/// and every reported milestone appends to the console.
///
/// # Thread Safety
///
/// `AppState` is wrapped in `Arc<RwLock<AppState>>` by [`crate::state::StateManager`].
/// Never mutate it directly - go through
/// [`update()`](crate::state::StateManager::update) so change events are emitted.
#[derive(Clone, Debug)]
pub struct AppState {
    // Run
    pub is_merging: bool,
    pub output_path: Option<Utf8PathBuf>,
    pub append_mode: bool,

    // Progress
    pub total_lines: u64,
    pub processed_lines: u64,
    pub current_file: Option<String>,
    pub files_processed: usize,
    pub milestones_reported: usize,

    // Result of the last run
    pub last_error: Option<String>,

    // Settings
    pub report_divisions: u32,
    pub line_ending: LineEnding,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            is_merging: false,
            output_path: None,
            append_mode: false,

            total_lines: 0,
            processed_lines: 0,
            current_file: None,
            files_processed: 0,
            milestones_reported: 0,

            last_error: None,

            report_divisions: DEFAULT_REPORT_DIVISIONS,
            line_ending: LineEnding::Lf,
        }
    }
}

impl AppState {
    /// Percentage of processed lines, 0.0 when nothing is known yet.
    pub fn progress_percent(&self) -> f64 {
        if self.total_lines == 0 {
            0.0
        } else {
            self.processed_lines as f64 / self.total_lines as f64 * 100.0
        }
    }

    /// Reset all merge-related state to initial values. Settings are kept.
    pub fn reset_merge_state(&mut self) {
        self.is_merging = false;
        self.output_path = None;
        self.total_lines = 0;
        self.processed_lines = 0;
        self.current_file = None;
        self.files_processed = 0;
        self.milestones_reported = 0;
        self.last_error = None;
    }

    /// One-line summary of the current or last run.
    pub fn progress_summary(&self) -> String {
        if self.total_lines == 0 && self.files_processed == 0 {
            return String::new();
        }

        format!(
            "{} files, {}/{} lines ({:.2}%)",
            self.files_processed,
            self.processed_lines,
            self.total_lines,
            self.progress_percent()
        )
    }
}
