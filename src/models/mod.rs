//! Data models for the FileFactory application.
//!
//! This module contains the core data structures used throughout the application:
//! - [`FileListModel`]: The ordered, duplicate-free selection with undo/redo history
//! - [`PathKind`]: File/directory/missing, resolved lazily against the filesystem
//! - [`HeaderRecord`]: The metadata block written before each source in the merged output
//! - [`AppState`]: Merge progress and settings as seen by a front end
//! - [`UserConfig`]: User preferences loaded from `FileFactory Config.yaml`
//!
//! # Architecture Note
//!
//! - **Serializable**: config structs derive `Serialize`/`Deserialize` for YAML persistence
//! - **Lazy**: path kinds are never cached; the filesystem is asked at use time
//! - **Owned**: `FileListModel` exclusively owns its list and history and does no locking

pub mod app_state;
pub mod config;
pub mod file_list;
pub mod header;
pub mod path_entry;

pub use app_state::AppState;
pub use config::{LineEnding, MergeSettings, UserConfig};
pub use file_list::FileListModel;
pub use header::{HeaderMetadata, HeaderRecord};
pub use path_entry::PathKind;
