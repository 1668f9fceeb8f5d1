//! # Relay API Client
//!
//! Typed HTTP access to the relay API for storefront code and tests.
//!
//! ```rust,no_run
//! use order_relay::client::{OrderRelayClient, OrderRelayClientConfig};
//! use order_relay::messaging::OrderMessage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OrderRelayClient::new(OrderRelayClientConfig {
//!     base_url: "http://localhost:8080".to_string(),
//!     ..Default::default()
//! })?;
//!
//! let order = OrderMessage {
//!     customer: Some("Alice".to_string()),
//!     total: Some(42.5),
//!     ..Default::default()
//! };
//! let ack = client.enqueue(&order).await?;
//! println!("queued {:?}", ack.order_id);
//!
//! for item in client.list_orders(25, Some("Pending")).await? {
//!     println!("{} {} {}", item.order_id, item.customer, item.status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod decode;
pub mod error;
pub mod orders_client;

pub use decode::parse_orders;
pub use error::{ClientError, ClientResult};
pub use orders_client::{EnqueueAck, OrderRelayClient, OrderRelayClientConfig};
