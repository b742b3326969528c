use serde::{Deserialize, Serialize};

/// Default number of report thresholds per merge run (sixths of the total).
pub const DEFAULT_REPORT_DIVISIONS: u32 = 6;

/// Default read buffer size used when scanning and copying source files.
pub const DEFAULT_COPY_BUFFER_SIZE: usize = 64 * 1024;

/// User configuration from FileFactory Config.yaml
///
/// Contains merge preferences and logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(rename = "FileFactory_Settings", default)]
    pub merge_settings: MergeSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSettings {
    #[serde(rename = "Append Mode", default)]
    pub append_mode: bool,

    #[serde(rename = "Report Divisions", default = "default_report_divisions")]
    pub report_divisions: u32,

    #[serde(rename = "Header Line Ending", default)]
    pub header_line_ending: LineEnding,

    #[serde(rename = "Follow Symlinks", default)]
    pub follow_symlinks: bool,

    #[serde(rename = "Copy Buffer Size", default = "default_copy_buffer_size")]
    pub copy_buffer_size: usize,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,

    #[serde(rename = "Log Directory", default = "default_log_directory")]
    pub log_directory: String,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            append_mode: false,
            report_divisions: DEFAULT_REPORT_DIVISIONS,
            header_line_ending: LineEnding::default(),
            follow_symlinks: false,
            copy_buffer_size: DEFAULT_COPY_BUFFER_SIZE,
            debug_mode: false,
            log_directory: default_log_directory(),
        }
    }
}

impl MergeSettings {
    /// Report divisions with the zero case folded to a single division.
    pub fn effective_report_divisions(&self) -> u32 {
        self.report_divisions.max(1)
    }

    /// Buffer size with the zero case folded to the default.
    pub fn effective_buffer_size(&self) -> usize {
        if self.copy_buffer_size == 0 {
            DEFAULT_COPY_BUFFER_SIZE
        } else {
            self.copy_buffer_size
        }
    }
}

fn default_report_divisions() -> u32 {
    DEFAULT_REPORT_DIVISIONS
}

fn default_copy_buffer_size() -> usize {
    DEFAULT_COPY_BUFFER_SIZE
}

fn default_log_directory() -> String {
    "logs".to_string()
}

/// Line terminator written inside header blocks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}
