//! # Messaging Module
//!
//! Queue transport for the order relay: the message envelope, the queue
//! client trait, and its pgmq and in-process backends.

pub mod client;
pub mod errors;
pub mod in_memory;
pub mod message;
pub mod pgmq_client;

pub use client::{OrderQueue, QueueMessage, QueueMetrics};
pub use errors::{MessagingError, MessagingResult};
pub use in_memory::InMemoryQueue;
pub use message::OrderMessage;
pub use pgmq_client::{validate_queue_name, PgmqQueue};
