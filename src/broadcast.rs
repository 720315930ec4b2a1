//! Local broadcast of datastore changes.
//!
//! Components that cache datastore state (list views, widgets, sync
//! schedulers) subscribe here and re-read when they see an event. Sending
//! never blocks; events sent while nobody listens are dropped.

use tokio::sync::broadcast;
use tracing::trace;

/// Buffered events per receiver before the slowest one starts lagging.
const CHANNEL_CAPACITY: usize = 64;

/// Categories of change announced to the rest of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastEvent {
    /// Anything may have changed; re-read everything.
    Refresh,
    /// A single task was saved outside of a bulk operation.
    TaskSaved {
        task_id: i64,
        /// Whether remote sync should pick this change up.
        request_sync: bool,
    },
}

/// Fan-out sender shared by everything that mutates the datastore.
#[derive(Clone)]
pub struct LocalBroadcast {
    sender: broadcast::Sender<BroadcastEvent>,
}

impl LocalBroadcast {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Register a new listener. It only sees events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.sender.subscribe()
    }

    pub fn send(&self, event: BroadcastEvent) {
        if self.sender.send(event).is_err() {
            trace!("broadcast dropped, no listeners");
        }
    }

    pub fn broadcast_refresh(&self) {
        self.send(BroadcastEvent::Refresh);
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for LocalBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_send_without_listeners_is_silent() {
        let bus = LocalBroadcast::new();
        assert_eq!(bus.listener_count(), 0);
        bus.broadcast_refresh();
    }

    #[test]
    fn test_listener_receives_events_in_order() {
        let bus = LocalBroadcast::new();
        let mut rx = bus.subscribe();

        bus.send(BroadcastEvent::TaskSaved {
            task_id: 4,
            request_sync: true,
        });
        bus.broadcast_refresh();

        assert_eq!(
            rx.try_recv().unwrap(),
            BroadcastEvent::TaskSaved {
                task_id: 4,
                request_sync: true
            }
        );
        assert_eq!(rx.try_recv().unwrap(), BroadcastEvent::Refresh);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_clones_share_the_channel() {
        let bus = LocalBroadcast::new();
        let mut rx = bus.subscribe();
        let other = bus.clone();
        other.broadcast_refresh();
        assert_eq!(rx.try_recv().unwrap(), BroadcastEvent::Refresh);
        assert_eq!(bus.listener_count(), 1);
    }
}
