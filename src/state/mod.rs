// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for front-end updates.

use crate::models::AppState;
use crate::services::{MergeError, MergeSummary, ProgressReporter};
use camino::Utf8Path;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// These events are emitted to notify interested parties (primarily a front end)
/// about state changes without requiring them to poll the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// A merge run has started and its total is known
    MergeStarted {
        total_lines: u64,
    },

    /// Processed line count has changed
    ProgressUpdated {
        processed_lines: u64,
        total_lines: u64,
    },

    /// A report threshold was crossed while processing a file
    FileProcessed {
        file_name: String,
        file_lines: u64,
        processed_lines: u64,
        total_lines: u64,
    },

    /// A merge run has finished
    MergeFinished {
        success: bool,
        files_processed: usize,
        message: String,
    },

    /// Settings have been updated
    SettingsChanged,

    /// State has been reset
    StateReset,
}

/// Thread-safe state manager with event emission
///
/// This is the central state component that:
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
/// - Implements [`ProgressReporter`], so it can be handed straight to
///   [`MergeEngine::run`](crate::services::MergeEngine::run)
///
/// Merge notifications arrive on the merge thread; subscribers receive them on
/// whatever thread or task they listen from. That is the hand-off a front end
/// rendering elsewhere needs.
///
/// # Related Types
///
/// - [`crate::models::AppState`]: The underlying state structure
/// - [`StateChange`]: Event types emitted on state mutations
/// - [`crate::config::ConfigManager`]: Loads configurations into state
pub struct StateManager {
    /// The application state protected by RwLock for thread-safe access
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    /// Multiple subscribers can listen for state changes
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// # Returns
    /// A new StateManager with a broadcast channel buffer of 256 events
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(256);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Get a read-only snapshot of the current state
    ///
    /// This clones the entire state, so it's safe to use without holding locks.
    pub fn snapshot(&self) -> AppState {
        self.state.read().unwrap().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let merging = state_manager.read(|state| state.is_merging);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// This is the primary way to modify state. It:
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects what changed
    /// 4. Emits appropriate events
    ///
    /// # Returns
    /// A vector of StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = self.detect_changes(&old_state, &state);

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    ///
    /// Returns a receiver that will get notified of all future state changes.
    /// Multiple subscribers can listen simultaneously.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// Detect what changed between two states and generate events
    fn detect_changes(&self, old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.is_merging != new.is_merging {
            if new.is_merging {
                changes.push(StateChange::MergeStarted {
                    total_lines: new.total_lines,
                });
            } else {
                changes.push(StateChange::MergeFinished {
                    success: new.last_error.is_none(),
                    files_processed: new.files_processed,
                    message: new
                        .last_error
                        .clone()
                        .unwrap_or_else(|| new.progress_summary()),
                });
            }
        }

        if old.processed_lines != new.processed_lines || old.total_lines != new.total_lines {
            changes.push(StateChange::ProgressUpdated {
                processed_lines: new.processed_lines,
                total_lines: new.total_lines,
            });
        }

        if old.report_divisions != new.report_divisions
            || old.line_ending != new.line_ending
            || old.append_mode != new.append_mode
        {
            changes.push(StateChange::SettingsChanged);
        }

        changes
    }

    /// Record the run target before a merge starts
    pub fn begin_merge(&self, output_path: &Utf8Path, append: bool) -> Vec<StateChange> {
        self.update(|state| {
            state.reset_merge_state();
            state.output_path = Some(output_path.to_path_buf());
            state.append_mode = append;
        })
    }

    /// Record the terminal result of a merge
    ///
    /// Always emits exactly one [`StateChange::MergeFinished`], including for
    /// runs that failed before [`ProgressReporter::started`] was called.
    pub fn finish_merge(&self, result: &Result<MergeSummary, MergeError>) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.is_merging = false;
            state.current_file = None;
            match result {
                Ok(summary) => {
                    state.processed_lines = summary.processed_lines;
                    state.files_processed = summary.files_merged;
                    state.last_error = None;
                }
                Err(e) => {
                    state.last_error = Some(e.to_string());
                }
            }
        });

        let finished = changes
            .iter()
            .any(|c| matches!(c, StateChange::MergeFinished { .. }));
        if !finished {
            let event = self.read(|state| StateChange::MergeFinished {
                success: state.last_error.is_none(),
                files_processed: state.files_processed,
                message: state
                    .last_error
                    .clone()
                    .unwrap_or_else(|| state.progress_summary()),
            });
            let _ = self.state_tx.send(event.clone());
            changes.push(event);
        }

        changes
    }

    /// Reset all merge-related state
    pub fn reset_merge_state(&self) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.reset_merge_state();
        });

        let reset_event = StateChange::StateReset;
        let _ = self.state_tx.send(reset_event.clone());
        changes.push(reset_event);

        changes
    }

    /// Load configuration from UserConfig
    ///
    /// # Returns
    /// A vector of StateChange events that were emitted
    pub fn load_from_user_config(&self, user_config: &crate::models::UserConfig) -> Vec<StateChange> {
        self.update(|state| {
            let settings = &user_config.merge_settings;

            state.append_mode = settings.append_mode;
            state.report_divisions = settings.effective_report_divisions();
            state.line_ending = settings.header_line_ending;

            tracing::info!(
                "Loaded user config: append={}, divisions={}, line_ending={:?}",
                state.append_mode,
                state.report_divisions,
                state.line_ending
            );
        })
    }
}

impl ProgressReporter for StateManager {
    fn started(&mut self, total_lines: u64) {
        self.update(|state| {
            state.is_merging = true;
            state.total_lines = total_lines;
            state.processed_lines = 0;
            state.files_processed = 0;
            state.milestones_reported = 0;
            state.last_error = None;
        });
    }

    fn progress_changed(&mut self, processed_lines: u64) {
        self.update(|state| {
            state.processed_lines = processed_lines;
            state.files_processed += 1;
        });
    }

    fn file_processed(
        &mut self,
        file_name: &str,
        file_lines: u64,
        processed_lines: u64,
        total_lines: u64,
    ) {
        self.update(|state| {
            state.current_file = Some(file_name.to_string());
            state.milestones_reported += 1;
        });

        // Emitted per call, even when the payload repeats
        let _ = self.state_tx.send(StateChange::FileProcessed {
            file_name: file_name.to_string(),
            file_lines,
            processed_lines,
            total_lines,
        });
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across threads
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
