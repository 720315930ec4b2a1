//! Fire-and-forget progress reporting.
//!
//! The importer posts status lines while it works. Delivery is best effort:
//! a sink must not block, and a message that cannot be delivered is dropped.

use tokio::sync::mpsc;
use tracing::info;

/// Receiver of human-readable progress messages.
pub trait ProgressSink {
    fn post(&self, message: String);
}

/// Posts onto a channel drained by another context (a UI loop, a printer task).
impl ProgressSink for mpsc::UnboundedSender<String> {
    fn post(&self, message: String) {
        // Receiver gone means nobody is watching any more.
        let _ = self.send(message);
    }
}

impl ProgressSink for std::sync::mpsc::Sender<String> {
    fn post(&self, message: String) {
        let _ = self.send(message);
    }
}

/// Writes progress to the log at INFO.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn post(&self, message: String) {
        info!(target: "tasks_backup::progress", "{}", message);
    }
}

/// Status line for the n-th task record read from a backup.
pub fn read_progress_message(count: usize) -> String {
    format!("Reading task {}...", count)
}

/// Post to an optional sink.
pub(crate) fn post(sink: Option<&dyn ProgressSink>, message: impl FnOnce() -> String) {
    if let Some(sink) = sink {
        sink.post(message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_progress_message() {
        assert_eq!(read_progress_message(3), "Reading task 3...");
    }

    #[test]
    fn test_post_to_std_channel() {
        let (tx, rx) = std::sync::mpsc::channel();
        post(Some(&tx), || "hello".to_string());
        assert_eq!(rx.recv().unwrap(), "hello");
    }

    #[test]
    fn test_post_without_sink_skips_formatting() {
        post(None, || panic!("message should not be built"));
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        drop(rx);
        tx.post("dropped".to_string());
    }
}
