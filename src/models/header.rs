use crate::models::LineEnding;
use camino::Utf8PathBuf;
use chrono::NaiveDateTime;
use std::fmt::Write;

/// Timestamp format used in header blocks
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Metadata block injected before each source file's bytes in the merged output.
///
/// A header only ever exists as bytes in the output stream; it is built,
/// rendered and dropped per file during the merge pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    pub timestamp: NaiveDateTime,
    pub path: Utf8PathBuf,
    pub metadata: HeaderMetadata,
}

/// Scanned metadata, or the reason it could not be obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderMetadata {
    Scanned { md5: String, lines: u64 },
    Failed { reason: String },
}

impl HeaderMetadata {
    /// Line count this file contributes to progress (0 on failure).
    pub fn line_count(&self) -> u64 {
        match self {
            HeaderMetadata::Scanned { lines, .. } => *lines,
            HeaderMetadata::Failed { .. } => 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, HeaderMetadata::Failed { .. })
    }
}

impl HeaderRecord {
    pub fn new(timestamp: NaiveDateTime, path: Utf8PathBuf, metadata: HeaderMetadata) -> Self {
        Self {
            timestamp,
            path,
            metadata,
        }
    }

    /// Render the header as it appears in the output, blank line included.
    ///
    /// ```text
    /// /*
    /// 时间：2024-01-02 03:04:05
    /// 原文件路径：src/main.rs
    /// MD5：d41d8cd98f00b204e9800998ecf8427e
    /// 行数：0
    /// */
    ///
    /// ```
    pub fn render(&self, line_ending: LineEnding) -> String {
        let nl = line_ending.as_str();
        let mut out = String::with_capacity(128 + self.path.as_str().len());

        // Writing into a String cannot fail
        let _ = write!(out, "/*{nl}");
        let _ = write!(out, "时间：{}{nl}", self.timestamp.format(TIMESTAMP_FORMAT));
        let _ = write!(out, "原文件路径：{}{nl}", self.path);
        match &self.metadata {
            HeaderMetadata::Scanned { md5, lines } => {
                let _ = write!(out, "MD5：{md5}{nl}");
                let _ = write!(out, "行数：{lines}{nl}");
            }
            HeaderMetadata::Failed { reason } => {
                let _ = write!(out, "元数据获取失败：{reason}{nl}");
            }
        }
        let _ = write!(out, "*/{nl}{nl}");

        out
    }
}
