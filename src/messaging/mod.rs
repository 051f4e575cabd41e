// src/messaging/mod.rs

//! Pub/sub messaging seam.
//!
//! The core only ever emits two kinds of messages: status-transition events
//! for the topic-management consumer and admin-notification strings for
//! operational anomalies. Delivery is best-effort, at-most-once; publish
//! failures are logged, never retried.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::Result;

/// Channel for operational admin notifications.
pub const CHANNEL_NOTIFY_ADMIN: &str = "topic_notify_admin";

/// Channel for status-transition events.
pub const CHANNEL_TOPIC_MANAGEMENT: &str = "topic_for_topic_management";

/// Channel for the list of topics whose first posts changed.
pub const CHANNEL_FIRST_POST_PROCESSING: &str = "topic_for_first_post_processing";

/// Trait for pub/sub publishing backends.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish an enveloped payload to a channel.
    async fn publish(&self, channel: &str, payload: Value) -> Result<()>;
}

/// Wrap a message in the transport envelope and publish it, fire-and-forget.
pub async fn publish_message(publisher: &dyn Publisher, channel: &str, message: Value) {
    let payload = json!({ "data": { "message": message } });
    match publisher.publish(channel, payload).await {
        Ok(()) => log::info!("published to {}", channel),
        Err(e) => log::warn!("publish to {} failed: {}", channel, e),
    }
}

/// Send a plain-text notification to the admin channel, fire-and-forget.
pub async fn notify_admin(publisher: &dyn Publisher, message: &str) {
    publish_message(publisher, CHANNEL_NOTIFY_ADMIN, Value::String(message.into())).await;
}

/// Publisher that writes payloads to the log. Used for local runs where no
/// broker is wired up.
#[derive(Debug, Clone, Default)]
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, channel: &str, payload: Value) -> Result<()> {
        log::info!("[{}] {}", channel, payload);
        Ok(())
    }
}

/// Publisher that captures messages in memory, for assertions in tests.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    messages: std::sync::Mutex<Vec<(String, Value)>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured (channel, payload) pairs, in publish order.
    pub fn messages(&self) -> Vec<(String, Value)> {
        self.messages.lock().expect("publisher lock").clone()
    }

    /// Captured payloads for one channel.
    pub fn channel_messages(&self, channel: &str) -> Vec<Value> {
        self.messages()
            .into_iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, p)| p)
            .collect()
    }
}

#[async_trait]
impl Publisher for MemoryPublisher {
    async fn publish(&self, channel: &str, payload: Value) -> Result<()> {
        self.messages
            .lock()
            .expect("publisher lock")
            .push((channel.to_string(), payload));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn envelope_wraps_message() {
        let publisher = MemoryPublisher::new();
        notify_admin(&publisher, "budget exceeded").await;

        let messages = publisher.channel_messages(CHANNEL_NOTIFY_ADMIN);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["data"]["message"], "budget exceeded");
    }

    #[tokio::test]
    async fn publish_failure_is_swallowed() {
        struct FailingPublisher;

        #[async_trait]
        impl Publisher for FailingPublisher {
            async fn publish(&self, channel: &str, _payload: Value) -> Result<()> {
                Err(crate::error::AppError::publish(channel, "broker down"))
            }
        }

        // Must not panic or propagate.
        publish_message(&FailingPublisher, CHANNEL_NOTIFY_ADMIN, json!("x")).await;
    }
}
