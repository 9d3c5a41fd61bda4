//! Topic-keyed publish/subscribe fan-out for real-time observers.
//!
//! Every topic owns a tokio broadcast channel. Publishing to a topic with no
//! subscribers is a no-op; slow subscribers lose the oldest messages once
//! the channel buffer is full.

use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{RwLock, broadcast};

/// Topic every connected observer joins. Complaint creation is broadcast
/// here without any per-department filtering.
pub const COMPLAINTS_TOPIC: &str = "complaints";

/// Wire shape of a broadcast frame: `{"event": ..., "data": ...}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BroadcastMessage {
    pub event: String,
    pub data: serde_json::Value,
}

pub struct TopicBroadcaster {
    topics: RwLock<HashMap<String, broadcast::Sender<BroadcastMessage>>>,
    channel_capacity: usize,
}

impl TopicBroadcaster {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            channel_capacity,
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(128)
    }

    /// Subscribes to `topic`, creating it on first use.
    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<BroadcastMessage> {
        let mut topics = self.topics.write().await;
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.channel_capacity).0)
            .subscribe()
    }

    /// Publishes to every current subscriber of `topic` and returns how many
    /// received it.
    pub async fn publish(&self, topic: &str, message: BroadcastMessage) -> usize {
        let topics = self.topics.read().await;
        topics
            .get(topic)
            .and_then(|sender| sender.send(message).ok())
            .unwrap_or(0)
    }

}

impl Default for TopicBroadcaster {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(n: u32) -> BroadcastMessage {
        BroadcastMessage {
            event: "new_complaint".to_string(),
            data: json!({ "n": n }),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let broadcaster = TopicBroadcaster::default();
        assert_eq!(broadcaster.publish(COMPLAINTS_TOPIC, message(1)).await, 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_receives_every_message() {
        let broadcaster = TopicBroadcaster::default();
        let mut first = broadcaster.subscribe(COMPLAINTS_TOPIC).await;
        let mut second = broadcaster.subscribe(COMPLAINTS_TOPIC).await;

        assert_eq!(broadcaster.publish(COMPLAINTS_TOPIC, message(7)).await, 2);
        assert_eq!(first.recv().await.unwrap(), message(7));
        assert_eq!(second.recv().await.unwrap(), message(7));
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let broadcaster = TopicBroadcaster::default();
        let mut other = broadcaster.subscribe("hostel").await;
        broadcaster.subscribe(COMPLAINTS_TOPIC).await;
        broadcaster.publish(COMPLAINTS_TOPIC, message(1)).await;
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_not_counted() {
        let broadcaster = TopicBroadcaster::default();
        let receiver = broadcaster.subscribe(COMPLAINTS_TOPIC).await;
        drop(receiver);
        assert_eq!(broadcaster.publish(COMPLAINTS_TOPIC, message(1)).await, 0);
    }
}
