//! # In-Process Queue
//!
//! [`OrderQueue`] backed by process memory with the same visibility-timeout
//! semantics as pgmq. Used for local runs without PostgreSQL and by tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use super::client::{OrderQueue, QueueMessage, QueueMetrics};
use super::errors::{MessagingError, MessagingResult};

#[derive(Debug, Clone)]
struct StoredMessage {
    msg_id: i64,
    read_ct: i32,
    enqueued_at: DateTime<Utc>,
    visible_at: DateTime<Utc>,
    payload: serde_json::Value,
}

impl StoredMessage {
    fn snapshot(&self) -> QueueMessage {
        QueueMessage {
            msg_id: self.msg_id,
            read_ct: self.read_ct,
            enqueued_at: self.enqueued_at,
            payload: self.payload.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    live: Vec<StoredMessage>,
    archive: Vec<StoredMessage>,
}

#[derive(Debug, Default)]
pub struct InMemoryQueue {
    queues: Mutex<HashMap<String, QueueState>>,
    next_id: AtomicI64,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads of every message still in the queue, visible or not, oldest first.
    pub fn pending_payloads(&self, queue_name: &str) -> Vec<serde_json::Value> {
        self.queues
            .lock()
            .get(queue_name)
            .map(|state| state.live.iter().map(|m| m.payload.clone()).collect())
            .unwrap_or_default()
    }

    pub fn archived_payloads(&self, queue_name: &str) -> Vec<serde_json::Value> {
        self.queues
            .lock()
            .get(queue_name)
            .map(|state| state.archive.iter().map(|m| m.payload.clone()).collect())
            .unwrap_or_default()
    }

    pub fn len(&self, queue_name: &str) -> usize {
        self.queues
            .lock()
            .get(queue_name)
            .map(|state| state.live.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, queue_name: &str) -> bool {
        self.len(queue_name) == 0
    }
}

#[async_trait]
impl OrderQueue for InMemoryQueue {
    async fn create_queue(&self, queue_name: &str) -> MessagingResult<()> {
        self.queues.lock().entry(queue_name.to_string()).or_default();
        Ok(())
    }

    async fn send_json(&self, queue_name: &str, payload: &serde_json::Value) -> MessagingResult<i64> {
        let mut queues = self.queues.lock();
        let state = queues
            .get_mut(queue_name)
            .ok_or_else(|| MessagingError::queue_not_found(queue_name))?;

        let msg_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        state.live.push(StoredMessage {
            msg_id,
            read_ct: 0,
            enqueued_at: now,
            visible_at: now,
            payload: payload.clone(),
        });
        Ok(msg_id)
    }

    async fn read_messages(
        &self,
        queue_name: &str,
        visibility_timeout: i32,
        qty: i32,
    ) -> MessagingResult<Vec<QueueMessage>> {
        let mut queues = self.queues.lock();
        let state = queues
            .get_mut(queue_name)
            .ok_or_else(|| MessagingError::queue_not_found(queue_name))?;

        let now = Utc::now();
        let hidden_until = now + Duration::seconds(i64::from(visibility_timeout.max(0)));
        let limit = usize::try_from(qty.max(0)).unwrap_or(0);

        let mut read = Vec::new();
        for message in state.live.iter_mut() {
            if read.len() >= limit {
                break;
            }
            if message.visible_at <= now {
                message.read_ct += 1;
                message.visible_at = hidden_until;
                read.push(message.snapshot());
            }
        }
        Ok(read)
    }

    async fn delete_message(&self, queue_name: &str, message_id: i64) -> MessagingResult<()> {
        let mut queues = self.queues.lock();
        let state = queues
            .get_mut(queue_name)
            .ok_or_else(|| MessagingError::queue_not_found(queue_name))?;
        state.live.retain(|m| m.msg_id != message_id);
        Ok(())
    }

    async fn archive_message(&self, queue_name: &str, message_id: i64) -> MessagingResult<()> {
        let mut queues = self.queues.lock();
        let state = queues
            .get_mut(queue_name)
            .ok_or_else(|| MessagingError::queue_not_found(queue_name))?;

        if let Some(position) = state.live.iter().position(|m| m.msg_id == message_id) {
            let message = state.live.remove(position);
            state.archive.push(message);
        }
        Ok(())
    }

    async fn queue_metrics(&self, queue_name: &str) -> MessagingResult<QueueMetrics> {
        let queues = self.queues.lock();
        let state = queues
            .get(queue_name)
            .ok_or_else(|| MessagingError::queue_not_found(queue_name))?;

        let now = Utc::now();
        Ok(QueueMetrics {
            queue_name: queue_name.to_string(),
            visible_messages: state.live.iter().filter(|m| m.visible_at <= now).count() as i64,
            archived_messages: state.archive.len() as i64,
        })
    }

    fn client_type(&self) -> &'static str {
        "in_memory"
    }
}
