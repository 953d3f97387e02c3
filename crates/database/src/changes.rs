//! In-process change feed for the `notifications` table.

use ping_core::ChangeEvent;
use tokio::sync::broadcast;
use tracing::trace;

/// Events buffered per subscriber before the slowest one starts lagging.
const DEFAULT_CAPACITY: usize = 1024;

/// Broadcasts row-level mutations of `notifications` to every subscriber.
///
/// Publishing never blocks and never fails; with no subscribers the event
/// is dropped, which matches a change feed nobody is listening to.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ChangeFeed {
    /// Create a feed buffering up to `capacity` events per subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Returns the number of subscribers it reached.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let kind = event.kind;
        let delivered = self.sender.send(event).unwrap_or(0);
        trace!(kind = %kind, delivered, "Published change event");
        delivered
    }

    /// Subscribe to every future event.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ping_core::{ChangeKind, Ping, PingStatus};

    fn ping() -> Ping {
        Ping {
            id: 1,
            sender_id: 1,
            recipient_id: 2,
            message: "Hi".to_string(),
            status: PingStatus::Sent,
            created_at: "2026-01-01 10:00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_dropped() {
        let feed = ChangeFeed::default();
        assert_eq!(feed.publish(ChangeEvent::insert(ping())), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_events() {
        let feed = ChangeFeed::default();
        let mut a = feed.subscribe();
        let mut b = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 2);

        assert_eq!(feed.publish(ChangeEvent::insert(ping())), 2);
        assert_eq!(a.recv().await.unwrap().kind, ChangeKind::Insert);
        assert_eq!(b.recv().await.unwrap().kind, ChangeKind::Insert);
    }
}
