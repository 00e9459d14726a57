//! Append-only notification log.
//!
//! [`EventIngestion`] is the only writer. Everyone else reads through
//! [`LogSnapshot`]s: immutable, `Arc`-backed views that are never
//! partially updated. Each append publishes a new snapshot on a watch
//! channel, which doubles as the "log changed" signal for renderers.

use std::slice;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::error::FrameError;
use crate::notification::Notification;
use crate::supervisor::FrameSink;
use crate::transport::Frame;

/// Immutable view of the log at one point in time, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct LogSnapshot {
    entries: Arc<Vec<Notification>>,
}

impl LogSnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Notification> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Notification] {
        &self.entries
    }

    pub fn last(&self) -> Option<&Notification> {
        self.entries.last()
    }

    fn append(&mut self, notification: Notification) {
        // Copies the vector only if a reader still holds the old snapshot.
        Arc::make_mut(&mut self.entries).push(notification);
    }
}

impl<'a> IntoIterator for &'a LogSnapshot {
    type Item = &'a Notification;
    type IntoIter = slice::Iter<'a, Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Decodes inbound frames and owns the notification log.
pub struct EventIngestion {
    log: watch::Sender<LogSnapshot>,
}

impl Default for EventIngestion {
    fn default() -> Self {
        Self::new()
    }
}

impl EventIngestion {
    pub fn new() -> Self {
        let (log, _) = watch::channel(LogSnapshot::default());
        Self { log }
    }

    /// Decode one frame payload and append it.
    ///
    /// A malformed payload leaves the log untouched.
    pub fn ingest(&self, payload: &[u8]) -> Result<(), FrameError> {
        let notification = Notification::decode(payload)?;
        debug!(
            group = %notification.group_id,
            delta = notification.delta,
            count = notification.count,
            "notification ingested"
        );
        self.log.send_modify(|log| log.append(notification));
        Ok(())
    }

    pub fn snapshot(&self) -> LogSnapshot {
        self.log.borrow().clone()
    }

    /// Read-only handle that observes appends.
    pub fn subscribe(&self) -> LogWatcher {
        LogWatcher {
            rx: self.log.subscribe(),
        }
    }
}

impl FrameSink for EventIngestion {
    fn deliver(&self, frame: Frame) {
        if let Err(e) = self.ingest(frame.as_bytes()) {
            debug!(error = %e, len = frame.len(), "discarding notification frame");
        }
    }
}

/// Read side of the log.
#[derive(Debug, Clone)]
pub struct LogWatcher {
    rx: watch::Receiver<LogSnapshot>,
}

impl LogWatcher {
    pub fn snapshot(&self) -> LogSnapshot {
        self.rx.borrow().clone()
    }

    /// Wait for the next append.
    ///
    /// Returns `false` once the ingestion side is gone and no further
    /// appends can happen.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Snapshot and mark it seen, so `changed` waits for newer appends.
    pub fn snapshot_and_mark_seen(&mut self) -> LogSnapshot {
        self.rx.borrow_and_update().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const G1: &str = r#"{"groupID":"g1","delta":2,"count":5,"createdAt":"2024-05-01T12:00:00Z"}"#;
    const G2: &str = r#"{"groupID":"g2","delta":-1,"count":3,"createdAt":"2024-05-01T11:59:00Z"}"#;

    #[test]
    fn appends_in_arrival_order() {
        let ingestion = EventIngestion::new();
        ingestion.ingest(G1.as_bytes()).unwrap();
        ingestion.ingest(G2.as_bytes()).unwrap();

        let log = ingestion.snapshot();
        let groups: Vec<&str> = log.iter().map(|n| n.group_id.as_str()).collect();
        // Arrival order wins over createdAt order.
        assert_eq!(groups, vec!["g1", "g2"]);
    }

    #[test]
    fn malformed_frame_leaves_log_unchanged() {
        let ingestion = EventIngestion::new();
        ingestion.ingest(G1.as_bytes()).unwrap();

        assert!(ingestion.ingest(b"<html>").is_err());
        ingestion.deliver(Frame::Text("{\"groupID\":".to_string()));

        assert_eq!(ingestion.snapshot().len(), 1);
    }

    #[test]
    fn repeated_delivery_is_not_deduplicated() {
        let ingestion = EventIngestion::new();
        ingestion.deliver(Frame::Text(G1.to_string()));
        ingestion.deliver(Frame::Binary(G1.as_bytes().to_vec()));
        assert_eq!(ingestion.snapshot().len(), 2);
    }

    #[test]
    fn snapshots_are_isolated_from_later_appends() {
        let ingestion = EventIngestion::new();
        ingestion.ingest(G1.as_bytes()).unwrap();
        let before = ingestion.snapshot();

        ingestion.ingest(G2.as_bytes()).unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(ingestion.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn watcher_observes_appends() {
        let ingestion = EventIngestion::new();
        let mut watcher = ingestion.subscribe();
        assert!(watcher.snapshot().is_empty());

        ingestion.ingest(G1.as_bytes()).unwrap();
        assert!(watcher.changed().await);
        assert_eq!(watcher.snapshot_and_mark_seen().len(), 1);

        drop(ingestion);
        assert!(!watcher.changed().await);
    }
}
