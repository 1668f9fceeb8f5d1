//! # Queue Client Trait
//!
//! Common interface over the queue backends so the gateway, the consumers
//! and the consumer runtime can be handed either the pgmq-backed client or
//! the in-process one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::MessagingResult;

/// A message read from a queue, still owned by the queue until deleted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMessage {
    pub msg_id: i64,
    /// How many times this message has been handed out, including this read
    pub read_ct: i32,
    pub enqueued_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl From<pgmq::types::Message<serde_json::Value>> for QueueMessage {
    fn from(message: pgmq::types::Message<serde_json::Value>) -> Self {
        Self {
            msg_id: message.msg_id,
            read_ct: message.read_ct,
            enqueued_at: message.enqueued_at,
            payload: message.message,
        }
    }
}

/// Queue statistics used by readiness checks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueMetrics {
    pub queue_name: String,
    pub visible_messages: i64,
    pub archived_messages: i64,
}

#[async_trait]
pub trait OrderQueue: Send + Sync {
    /// Create queue if it doesn't exist
    async fn create_queue(&self, queue_name: &str) -> MessagingResult<()>;

    /// Publish a JSON payload, returning the message id
    async fn send_json(&self, queue_name: &str, payload: &serde_json::Value) -> MessagingResult<i64>;

    /// Read up to `qty` visible messages and hide them for `visibility_timeout` seconds
    async fn read_messages(
        &self,
        queue_name: &str,
        visibility_timeout: i32,
        qty: i32,
    ) -> MessagingResult<Vec<QueueMessage>>;

    /// Acknowledge a processed message
    async fn delete_message(&self, queue_name: &str, message_id: i64) -> MessagingResult<()>;

    /// Move a message out of the live queue into its archive
    async fn archive_message(&self, queue_name: &str, message_id: i64) -> MessagingResult<()>;

    async fn queue_metrics(&self, queue_name: &str) -> MessagingResult<QueueMetrics>;

    /// Backend name for logs and health output
    fn client_type(&self) -> &'static str;
}
