//! # PostgreSQL Message Queue Client (pgmq-rs)
//!
//! [`OrderQueue`] implementation over the pgmq extension. Visibility
//! timeouts give at-least-once delivery: a message that is read but never
//! deleted becomes visible again and its `read_ct` grows with each delivery.

use async_trait::async_trait;
use pgmq::{types::Message, PGMQueue};
use tracing::{debug, info, warn};

use super::client::{OrderQueue, QueueMessage, QueueMetrics};
use super::errors::{MessagingError, MessagingResult};

/// pgmq limits queue names so the generated `q_`/`a_` tables stay valid identifiers.
const MAX_QUEUE_NAME_LEN: usize = 47;

pub fn validate_queue_name(queue_name: &str) -> MessagingResult<()> {
    if queue_name.is_empty() {
        return Err(MessagingError::invalid_queue_name(queue_name, "must not be empty"));
    }
    if queue_name.len() > MAX_QUEUE_NAME_LEN {
        return Err(MessagingError::invalid_queue_name(
            queue_name,
            format!("must be at most {MAX_QUEUE_NAME_LEN} characters"),
        ));
    }
    if !queue_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(MessagingError::invalid_queue_name(
            queue_name,
            "only ASCII letters, digits and '_' are allowed",
        ));
    }
    Ok(())
}

/// pgmq-rs based queue client
#[derive(Debug, Clone)]
pub struct PgmqQueue {
    pgmq: PGMQueue,
}

impl PgmqQueue {
    /// Connect using a connection string
    pub async fn new(database_url: &str) -> MessagingResult<Self> {
        info!("🚀 Connecting to pgmq");

        let pgmq = PGMQueue::new(database_url.to_string())
            .await
            .map_err(|e| MessagingError::database_connection(e.to_string()))?;

        info!("✅ Connected to pgmq");
        Ok(Self { pgmq })
    }

    /// Create a client over an existing pool shared with the table store
    pub async fn new_with_pool(pool: sqlx::PgPool) -> Self {
        info!("🚀 Creating pgmq client with shared connection pool");
        let pgmq = PGMQueue::new_with_pool(pool).await;
        Self { pgmq }
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pgmq.connection
    }
}

#[async_trait]
impl OrderQueue for PgmqQueue {
    async fn create_queue(&self, queue_name: &str) -> MessagingResult<()> {
        validate_queue_name(queue_name)?;
        debug!("📋 Creating queue: {}", queue_name);

        self.pgmq
            .create(queue_name)
            .await
            .map_err(|e| MessagingError::queue_operation(queue_name, "create", e.to_string()))?;

        info!("✅ Queue ready: {}", queue_name);
        Ok(())
    }

    async fn send_json(&self, queue_name: &str, payload: &serde_json::Value) -> MessagingResult<i64> {
        debug!("📤 Sending message to queue: {}", queue_name);

        let message_id = self
            .pgmq
            .send(queue_name, payload)
            .await
            .map_err(|e| MessagingError::queue_operation(queue_name, "send", e.to_string()))?;

        debug!(queue = %queue_name, msg_id = message_id, "✅ Message sent");
        Ok(message_id)
    }

    async fn read_messages(
        &self,
        queue_name: &str,
        visibility_timeout: i32,
        qty: i32,
    ) -> MessagingResult<Vec<QueueMessage>> {
        let messages: Vec<Message<serde_json::Value>> = self
            .pgmq
            .read_batch(queue_name, Some(visibility_timeout), qty)
            .await
            .map_err(|e| MessagingError::queue_operation(queue_name, "read", e.to_string()))?
            .unwrap_or_default();

        if !messages.is_empty() {
            debug!(
                "📨 Read {} messages from queue: {}",
                messages.len(),
                queue_name
            );
        }
        Ok(messages.into_iter().map(QueueMessage::from).collect())
    }

    async fn delete_message(&self, queue_name: &str, message_id: i64) -> MessagingResult<()> {
        self.pgmq
            .delete(queue_name, message_id)
            .await
            .map(|_| ())
            .map_err(|e| MessagingError::queue_operation(queue_name, "delete", e.to_string()))
    }

    async fn archive_message(&self, queue_name: &str, message_id: i64) -> MessagingResult<()> {
        warn!("📦 Archiving message {} from queue: {}", message_id, queue_name);

        self.pgmq
            .archive(queue_name, message_id)
            .await
            .map(|_| ())
            .map_err(|e| MessagingError::queue_operation(queue_name, "archive", e.to_string()))
    }

    async fn queue_metrics(&self, queue_name: &str) -> MessagingResult<QueueMetrics> {
        validate_queue_name(queue_name)?;

        let visible_messages: i64 = sqlx::query_scalar(&format!(
            "SELECT count(*) FROM pgmq.q_{queue_name} WHERE vt <= clock_timestamp()"
        ))
        .fetch_one(self.pool())
        .await?;

        let archived_messages: i64 =
            sqlx::query_scalar(&format!("SELECT count(*) FROM pgmq.a_{queue_name}"))
                .fetch_one(self.pool())
                .await?;

        Ok(QueueMetrics {
            queue_name: queue_name.to_string(),
            visible_messages,
            archived_messages,
        })
    }

    fn client_type(&self) -> &'static str {
        "pgmq"
    }
}
