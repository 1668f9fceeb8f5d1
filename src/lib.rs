#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Order Relay
//!
//! Queue-driven order pipeline for a small retail storefront.
//!
//! ## Overview
//!
//! An order travels through three at-least-once stages:
//!
//! 1. **Enqueue Gateway**: `POST /api/orders/enqueue` completes the request
//!    with defaults and publishes it to the `orders` queue.
//! 2. **Seed Consumer**: upserts a `Pending` row keyed by order id and
//!    forwards the order to `orders_finalize`.
//! 3. **Finalize Consumer**: marks the row `Processed` with a merge that is
//!    conditional on the row's version token.
//!
//! `GET /api/orders` lists rows newest first, optionally filtered by status.
//!
//! ## Module Organization
//!
//! - [`relay`] - The gateway, both consumers, the listing query and the queue worker
//! - [`messaging`] - Order envelope codec and queue clients (pgmq and in-memory)
//! - [`database`] - Order table store (PostgreSQL and in-memory)
//! - [`models`] - Order rows, patches and listing items
//! - [`web`] - Axum HTTP API
//! - [`client`] - HTTP client for the API
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use order_relay::database::InMemoryOrderTable;
//! use order_relay::messaging::{InMemoryQueue, OrderMessage, OrderQueue};
//! use order_relay::relay::{EnqueueGateway, FinalizeConsumer, SeedConsumer};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryOrderTable::new());
//! let queue = Arc::new(InMemoryQueue::new());
//! queue.create_queue("orders").await?;
//! queue.create_queue("orders_finalize").await?;
//!
//! let gateway = EnqueueGateway::new(queue.clone(), "orders");
//! let receipt = gateway
//!     .enqueue(OrderMessage {
//!         customer: Some("Alice".to_string()),
//!         total: Some(42.5),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! let seed = SeedConsumer::new(store.clone(), queue.clone(), "orders_finalize");
//! for message in queue.read_messages("orders", 30, 10).await? {
//!     seed.seed(&message.payload).await?;
//! }
//!
//! let finalize = FinalizeConsumer::new(store.clone());
//! for message in queue.read_messages("orders_finalize", 30, 10).await? {
//!     finalize.finalize(&message.payload).await?;
//! }
//! println!("processed {}", receipt.order_id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests; PostgreSQL tests run when TEST_DATABASE_URL is set
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod relay;
pub mod web;

pub use config::RelayConfig;
pub use constants::OrderStatus;
pub use database::{InMemoryOrderTable, OrderTableStore, PgOrderTable};
pub use error::{RelayError, RelayResult};
pub use messaging::{InMemoryQueue, MessagingError, OrderMessage, OrderQueue, PgmqQueue};
pub use models::{OrderListItem, OrderPatch, OrderRow, OrderSeed};
pub use relay::{
    EnqueueGateway, EnqueueReceipt, FinalizeConsumer, FinalizeOutcome, ListingQuery,
    ListingRequest, QueueWorker, SeedConsumer,
};
