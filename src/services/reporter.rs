use tokio::sync::mpsc;

/// Progress notifications driven by [`MergeEngine::run`](crate::services::MergeEngine::run).
///
/// All calls happen synchronously on the thread running the merge, in write
/// order, never concurrently with each other. An implementation that renders
/// on another thread is responsible for its own hand-off; see
/// [`StateManager`](crate::state::StateManager) for a broadcast-based one.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressReporter {
    /// Called once, after the output is opened and before anything is written.
    fn started(&mut self, total_lines: u64);

    /// Called exactly once per leaf file, after its bytes are written.
    fn progress_changed(&mut self, processed_lines: u64);

    /// Called once per report threshold crossed; a single file may cross several.
    fn file_processed(
        &mut self,
        file_name: &str,
        file_lines: u64,
        processed_lines: u64,
        total_lines: u64,
    );
}

/// A single notification, in owned form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started {
        total_lines: u64,
    },
    ProgressChanged {
        processed_lines: u64,
    },
    FileProcessed {
        file_name: String,
        file_lines: u64,
        processed_lines: u64,
        total_lines: u64,
    },
}

/// Keeps every notification in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    pub events: Vec<ProgressEvent>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_processed_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::FileProcessed { .. }))
            .count()
    }

    pub fn progress_values(&self) -> Vec<u64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::ProgressChanged { processed_lines } => Some(*processed_lines),
                _ => None,
            })
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn started(&mut self, total_lines: u64) {
        self.events.push(ProgressEvent::Started { total_lines });
    }

    fn progress_changed(&mut self, processed_lines: u64) {
        self.events
            .push(ProgressEvent::ProgressChanged { processed_lines });
    }

    fn file_processed(
        &mut self,
        file_name: &str,
        file_lines: u64,
        processed_lines: u64,
        total_lines: u64,
    ) {
        self.events.push(ProgressEvent::FileProcessed {
            file_name: file_name.to_string(),
            file_lines,
            processed_lines,
            total_lines,
        });
    }
}

/// Forwards notifications over a channel. A closed receiver is ignored.
impl ProgressReporter for mpsc::UnboundedSender<ProgressEvent> {
    fn started(&mut self, total_lines: u64) {
        let _ = self.send(ProgressEvent::Started { total_lines });
    }

    fn progress_changed(&mut self, processed_lines: u64) {
        let _ = self.send(ProgressEvent::ProgressChanged { processed_lines });
    }

    fn file_processed(
        &mut self,
        file_name: &str,
        file_lines: u64,
        processed_lines: u64,
        total_lines: u64,
    ) {
        let _ = self.send(ProgressEvent::FileProcessed {
            file_name: file_name.to_string(),
            file_lines,
            processed_lines,
            total_lines,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_reporter_keeps_order() {
        let mut reporter = RecordingReporter::new();
        reporter.started(12);
        reporter.progress_changed(3);
        reporter.file_processed("a.txt", 3, 3, 12);

        assert_eq!(
            reporter.events,
            vec![
                ProgressEvent::Started { total_lines: 12 },
                ProgressEvent::ProgressChanged { processed_lines: 3 },
                ProgressEvent::FileProcessed {
                    file_name: "a.txt".to_string(),
                    file_lines: 3,
                    processed_lines: 3,
                    total_lines: 12,
                },
            ]
        );
        assert_eq!(reporter.file_processed_count(), 1);
        assert_eq!(reporter.progress_values(), vec![3]);
    }

    #[test]
    fn test_channel_reporter_forwards_events() {
        let (mut tx, mut rx) = mpsc::unbounded_channel();
        tx.started(5);
        tx.progress_changed(5);

        tokio_test::block_on(async {
            assert_eq!(rx.recv().await, Some(ProgressEvent::Started { total_lines: 5 }));
            assert_eq!(
                rx.recv().await,
                Some(ProgressEvent::ProgressChanged { processed_lines: 5 })
            );
        });
    }

    #[test]
    fn test_channel_reporter_ignores_closed_receiver() {
        let (mut tx, rx) = mpsc::unbounded_channel::<ProgressEvent>();
        drop(rx);
        tx.file_processed("a", 1, 1, 1);
    }
}
