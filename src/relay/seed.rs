//! # Seed Consumer
//!
//! Stage-1 handler. Writes the initial `Pending` row for an order and then
//! forwards the order to the stage-2 queue.
//!
//! The table write and the forward are two independent operations. A crash
//! between them leaves a `Pending` row with no stage-2 message; redelivery of
//! the stage-1 message repeats both steps, and the upsert makes the repeat
//! harmless.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::gateway::generate_order_id;
use super::worker::MessageHandler;
use crate::constants::UNKNOWN_CUSTOMER;
use crate::database::OrderTableStore;
use crate::error::RelayResult;
use crate::logging::log_order_operation;
use crate::messaging::{OrderMessage, OrderQueue};
use crate::models::{OrderRow, OrderSeed};

pub struct SeedConsumer {
    store: Arc<dyn OrderTableStore>,
    queue: Arc<dyn OrderQueue>,
    finalize_queue: String,
}

impl std::fmt::Debug for SeedConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedConsumer")
            .field("store", &self.store.store_type())
            .field("queue", &self.queue.client_type())
            .field("finalize_queue", &self.finalize_queue)
            .finish()
    }
}

impl SeedConsumer {
    pub fn new(
        store: Arc<dyn OrderTableStore>,
        queue: Arc<dyn OrderQueue>,
        finalize_queue: impl Into<String>,
    ) -> Self {
        Self {
            store,
            queue,
            finalize_queue: finalize_queue.into(),
        }
    }

    /// Seed one stage-1 payload. Decode and validation failures are returned
    /// so the delivery is retried and eventually archived.
    pub async fn seed(&self, payload: &Value) -> RelayResult<OrderRow> {
        let message = OrderMessage::from_value(payload)?;
        message.validate()?;

        let order_id = message
            .resolved_order_id()
            .map(str::to_string)
            .unwrap_or_else(generate_order_id);
        let customer = message.resolved_customer().unwrap_or(UNKNOWN_CUSTOMER);

        let seed = OrderSeed::pending(
            order_id.clone(),
            customer,
            message.total.unwrap_or(0.0),
            Utc::now(),
        );
        let row = self.store.upsert(seed).await?;

        debug!(order_id = %order_id, etag = %row.etag, "Seeded pending order row");

        let forward = message.with_order_id(order_id.clone()).to_value()?;
        self.queue.send_json(&self.finalize_queue, &forward).await?;

        info!(
            order_id = %order_id,
            finalize_queue = %self.finalize_queue,
            "🌱 Order seeded and forwarded"
        );
        log_order_operation(
            "seed",
            Some(&order_id),
            Some(&self.finalize_queue),
            row.status.as_str(),
            None,
        );

        Ok(row)
    }
}

#[async_trait]
impl MessageHandler for SeedConsumer {
    fn name(&self) -> &'static str {
        "seed"
    }

    async fn handle_message(&self, payload: &Value) -> RelayResult<()> {
        self.seed(payload).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::OrderStatus;
    use crate::database::InMemoryOrderTable;
    use crate::error::RelayError;
    use crate::messaging::InMemoryQueue;
    use serde_json::json;

    async fn consumer() -> (Arc<InMemoryOrderTable>, Arc<InMemoryQueue>, SeedConsumer) {
        let store = Arc::new(InMemoryOrderTable::new());
        let queue = Arc::new(InMemoryQueue::new());
        queue.create_queue("orders_finalize").await.unwrap();
        let consumer = SeedConsumer::new(store.clone(), queue.clone(), "orders_finalize");
        (store, queue, consumer)
    }

    #[tokio::test]
    async fn test_seed_writes_pending_row_and_forwards() {
        let (store, queue, consumer) = consumer().await;

        let row = consumer
            .seed(&json!({"order_id": "X", "customer": "Alice", "total": 42.5}))
            .await
            .unwrap();
        assert_eq!(row.status, OrderStatus::Pending);
        assert!(row.processed_utc.is_none());

        let stored = store.get("X").await.unwrap().unwrap();
        assert_eq!(stored.customer, "Alice");
        assert_eq!(stored.total, 42.5);

        let forwarded = queue.pending_payloads("orders_finalize");
        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded[0]["order_id"], json!("X"));
    }

    #[tokio::test]
    async fn test_redelivery_keeps_a_single_pending_row() {
        let (store, _queue, consumer) = consumer().await;
        let payload = json!({"order_id": "X", "customer": "Alice", "total": 42.5});

        consumer.seed(&payload).await.unwrap();
        consumer.seed(&payload).await.unwrap();

        let rows = store.query(None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_missing_fields_get_defaults() {
        let (store, queue, consumer) = consumer().await;

        let row = consumer.seed(&Value::Null).await.unwrap();
        assert_eq!(row.order_id.len(), 32);
        assert_eq!(row.customer, "Unknown");
        assert_eq!(row.total, 0.0);

        assert!(store.get(&row.order_id).await.unwrap().is_some());
        let forwarded = queue.pending_payloads("orders_finalize");
        assert_eq!(forwarded[0]["order_id"], json!(row.order_id));
    }

    #[tokio::test]
    async fn test_text_encoded_payload_decodes() {
        let (store, _queue, consumer) = consumer().await;

        consumer
            .seed(&json!(r#"{"OrderId":"T-1","Customer":"Bob","Total":3}"#))
            .await
            .unwrap();
        assert_eq!(store.get("T-1").await.unwrap().unwrap().customer, "Bob");
    }

    #[tokio::test]
    async fn test_malformed_payload_is_an_error_without_side_effects() {
        let (store, queue, consumer) = consumer().await;

        let err = consumer.seed(&json!({"total": "lots"})).await.unwrap_err();
        assert!(err.is_malformed_input());

        let err = consumer.seed(&json!({"total": -5})).await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidOrder { .. }));

        assert!(store.is_empty());
        assert!(queue.is_empty("orders_finalize"));
    }
}
