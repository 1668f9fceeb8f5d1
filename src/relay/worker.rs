//! # Queue Worker
//!
//! Polling runtime that drives a [`MessageHandler`] from a queue.
//!
//! Each cycle reads up to `batch_size` messages, hiding them for the
//! visibility timeout, and runs the handler on all of them concurrently.
//! Per message:
//!
//! - handler succeeded: the message is deleted
//! - handler failed: the message is left in place and reappears once its
//!   visibility timeout lapses
//! - handler failed on delivery `max_delivery_count` (or the message arrives
//!   already past it): the message is archived, which is the dead-letter
//!   store
//!
//! The loop exits when the shutdown signal flips. A batch that is already
//! running completes first.

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ConsumerConfig;
use crate::error::RelayResult;
use crate::logging::log_error;
use crate::messaging::{OrderQueue, QueueMessage};

/// One queue-triggered stage of the relay
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Stage name for logs
    fn name(&self) -> &'static str;

    /// Process one payload. An error leaves the message for redelivery.
    async fn handle_message(&self, payload: &Value) -> RelayResult<()>;
}

/// What happened to a message after its handler ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDisposition {
    Deleted,
    Retained,
    Archived,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub read: usize,
    pub deleted: usize,
    pub retained: usize,
    pub archived: usize,
}

impl BatchSummary {
    fn record(&mut self, disposition: MessageDisposition) {
        match disposition {
            MessageDisposition::Deleted => self.deleted += 1,
            MessageDisposition::Retained => self.retained += 1,
            MessageDisposition::Archived => self.archived += 1,
        }
    }
}

#[derive(Debug, Default)]
pub struct WorkerStats {
    pub polling_cycles: AtomicU64,
    pub messages_processed: AtomicU64,
    pub messages_failed: AtomicU64,
    pub messages_archived: AtomicU64,
    pub polling_errors: AtomicU64,
}

pub struct QueueWorker {
    worker_id: Uuid,
    queue_name: String,
    queue: Arc<dyn OrderQueue>,
    handler: Arc<dyn MessageHandler>,
    config: ConsumerConfig,
    stats: WorkerStats,
}

impl std::fmt::Debug for QueueWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueWorker")
            .field("worker_id", &self.worker_id)
            .field("queue_name", &self.queue_name)
            .field("handler", &self.handler.name())
            .field("config", &self.config)
            .finish()
    }
}

impl QueueWorker {
    pub fn new(
        queue_name: impl Into<String>,
        queue: Arc<dyn OrderQueue>,
        handler: Arc<dyn MessageHandler>,
        config: ConsumerConfig,
    ) -> Self {
        let worker_id = Uuid::new_v4();
        let queue_name = queue_name.into();

        info!(
            worker_id = %worker_id,
            queue = %queue_name,
            handler = handler.name(),
            polling_interval = ?config.polling_interval(),
            "Creating QueueWorker"
        );

        Self {
            worker_id,
            queue_name,
            queue,
            handler,
            config,
            stats: WorkerStats::default(),
        }
    }

    pub fn worker_id(&self) -> Uuid {
        self.worker_id
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Run the polling loop on a background task
    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Poll until `shutdown` becomes `true` or its sender is dropped
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        if !self.config.enabled {
            info!(worker_id = %self.worker_id, queue = %self.queue_name, "QueueWorker disabled by configuration");
            return;
        }

        info!(
            worker_id = %self.worker_id,
            queue = %self.queue_name,
            handler = self.handler.name(),
            "🚀 Starting QueueWorker"
        );

        let period = self.config.polling_interval().max(Duration::from_millis(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    if let Err(e) = self.poll_once().await {
                        self.stats.polling_errors.fetch_add(1, Ordering::Relaxed);
                        error!(
                            worker_id = %self.worker_id,
                            queue = %self.queue_name,
                            error = %e,
                            "Failed to poll queue"
                        );
                    }
                }
            }
        }

        info!(worker_id = %self.worker_id, queue = %self.queue_name, "🛑 QueueWorker stopped");
    }

    /// Read one batch and process every message in it concurrently
    pub async fn poll_once(&self) -> RelayResult<BatchSummary> {
        let cycle_start = Instant::now();
        self.stats.polling_cycles.fetch_add(1, Ordering::Relaxed);

        let messages = self
            .queue
            .read_messages(
                &self.queue_name,
                self.config.visibility_timeout_seconds,
                self.config.batch_size,
            )
            .await?;

        if messages.is_empty() {
            return Ok(BatchSummary::default());
        }

        debug!(
            worker_id = %self.worker_id,
            queue = %self.queue_name,
            count = messages.len(),
            "Processing message batch"
        );

        let mut summary = BatchSummary {
            read: messages.len(),
            ..Default::default()
        };
        let dispositions = join_all(messages.iter().map(|message| self.process_message(message))).await;
        for disposition in dispositions {
            summary.record(disposition);
        }

        debug!(
            worker_id = %self.worker_id,
            queue = %self.queue_name,
            duration_ms = cycle_start.elapsed().as_millis() as u64,
            deleted = summary.deleted,
            retained = summary.retained,
            archived = summary.archived,
            "Completed polling cycle"
        );

        Ok(summary)
    }

    async fn process_message(&self, message: &QueueMessage) -> MessageDisposition {
        if message.read_ct > self.config.max_delivery_count {
            warn!(
                queue = %self.queue_name,
                msg_id = message.msg_id,
                read_ct = message.read_ct,
                "Message exceeded max delivery count before processing"
            );
            return self.archive(message).await;
        }

        match self.handler.handle_message(&message.payload).await {
            Ok(()) => {
                self.stats.messages_processed.fetch_add(1, Ordering::Relaxed);
                match self.queue.delete_message(&self.queue_name, message.msg_id).await {
                    Ok(()) => MessageDisposition::Deleted,
                    Err(e) => {
                        // Handler work is done; the redelivery will be idempotent
                        warn!(
                            queue = %self.queue_name,
                            msg_id = message.msg_id,
                            error = %e,
                            "Failed to delete processed message"
                        );
                        MessageDisposition::Retained
                    }
                }
            }
            Err(e) => {
                self.stats.messages_failed.fetch_add(1, Ordering::Relaxed);
                log_error(
                    self.handler.name(),
                    "handle_message",
                    &e.to_string(),
                    Some(&format!(
                        "queue={} msg_id={} read_ct={}",
                        self.queue_name, message.msg_id, message.read_ct
                    )),
                );

                if message.read_ct >= self.config.max_delivery_count {
                    self.archive(message).await
                } else {
                    MessageDisposition::Retained
                }
            }
        }
    }

    async fn archive(&self, message: &QueueMessage) -> MessageDisposition {
        match self.queue.archive_message(&self.queue_name, message.msg_id).await {
            Ok(()) => {
                self.stats.messages_archived.fetch_add(1, Ordering::Relaxed);
                warn!(
                    queue = %self.queue_name,
                    msg_id = message.msg_id,
                    read_ct = message.read_ct,
                    "☠️ Message archived after repeated failures"
                );
                MessageDisposition::Archived
            }
            Err(e) => {
                error!(
                    queue = %self.queue_name,
                    msg_id = message.msg_id,
                    error = %e,
                    "Failed to archive message"
                );
                MessageDisposition::Retained
            }
        }
    }
}
