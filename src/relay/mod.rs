//! # Order Relay Stages
//!
//! ```text
//! client ──> EnqueueGateway ──> [orders] ──> SeedConsumer ──> table (Pending)
//!                                                 │
//!                                                 └──> [orders_finalize] ──> FinalizeConsumer ──> table (Processed)
//!
//! ListingQuery reads the table at any time
//! ```
//!
//! Delivery is at-least-once. Every stage is safe to repeat: seeding is an
//! upsert keyed by order id and finalizing is a version-checked merge.
//! [`QueueWorker`] drives the two consumers from their queues.

pub mod finalize;
pub mod gateway;
pub mod listing;
pub mod seed;
pub mod worker;

pub use finalize::{FinalizeConsumer, FinalizeOutcome};
pub use gateway::{generate_order_id, EnqueueGateway, EnqueueReceipt};
pub use listing::{ListingQuery, ListingRequest};
pub use seed::SeedConsumer;
pub use worker::{BatchSummary, MessageDisposition, MessageHandler, QueueWorker, WorkerStats};
