//! # Enqueue Gateway
//!
//! Front door of the relay. Completes a partially populated order request
//! with defaults and publishes it to the stage-1 queue. The gateway never
//! touches the order table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::constants::ANONYMOUS_CUSTOMER;
use crate::error::RelayResult;
use crate::logging::log_order_operation;
use crate::messaging::{OrderMessage, OrderQueue};

/// Fresh order id: 32 lowercase hex characters
pub fn generate_order_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// What the caller gets back after a successful publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueueReceipt {
    pub order_id: String,
    pub queue: String,
}

pub struct EnqueueGateway {
    queue: Arc<dyn OrderQueue>,
    queue_name: String,
}

impl std::fmt::Debug for EnqueueGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnqueueGateway")
            .field("queue_name", &self.queue_name)
            .field("client_type", &self.queue.client_type())
            .finish()
    }
}

impl EnqueueGateway {
    pub fn new(queue: Arc<dyn OrderQueue>, queue_name: impl Into<String>) -> Self {
        Self {
            queue,
            queue_name: queue_name.into(),
        }
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Fill every absent field of `request`.
    ///
    /// Blank ids and blank customers count as absent. Negative or
    /// non-finite totals are rejected.
    pub fn complete(request: OrderMessage, now: DateTime<Utc>) -> RelayResult<OrderMessage> {
        request.validate()?;

        let order_id = request
            .resolved_order_id()
            .map(str::to_string)
            .unwrap_or_else(generate_order_id);
        let customer = request
            .resolved_customer()
            .unwrap_or(ANONYMOUS_CUSTOMER)
            .to_string();

        Ok(OrderMessage {
            order_id: Some(order_id),
            customer: Some(customer),
            total: Some(request.total.unwrap_or(0.0)),
            timestamp: Some(request.timestamp.unwrap_or(now)),
        })
    }

    /// Complete the request and publish it once to the stage-1 queue
    pub async fn enqueue(&self, request: OrderMessage) -> RelayResult<EnqueueReceipt> {
        let order = Self::complete(request, Utc::now())?;
        let payload = order.to_value()?;
        let order_id = order.order_id.unwrap_or_default();

        debug!(order_id = %order_id, queue = %self.queue_name, "Publishing order to stage-1 queue");

        let msg_id = self.queue.send_json(&self.queue_name, &payload).await?;

        info!(
            order_id = %order_id,
            queue = %self.queue_name,
            msg_id = msg_id,
            "📨 Order enqueued"
        );
        log_order_operation("enqueue", Some(&order_id), Some(&self.queue_name), "queued", None);

        Ok(EnqueueReceipt {
            order_id,
            queue: self.queue_name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;
    use crate::messaging::InMemoryQueue;
    use serde_json::json;

    async fn gateway() -> (Arc<InMemoryQueue>, EnqueueGateway) {
        let queue = Arc::new(InMemoryQueue::new());
        queue.create_queue("orders").await.unwrap();
        let gateway = EnqueueGateway::new(queue.clone(), "orders");
        (queue, gateway)
    }

    #[test]
    fn test_complete_fills_defaults() {
        let now = Utc::now();
        let order = EnqueueGateway::complete(OrderMessage::default(), now).unwrap();

        let order_id = order.order_id.unwrap();
        assert_eq!(order_id.len(), 32);
        assert!(order_id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(order.customer.as_deref(), Some("Anonymous"));
        assert_eq!(order.total, Some(0.0));
        assert_eq!(order.timestamp, Some(now));
    }

    #[test]
    fn test_complete_keeps_supplied_fields() {
        let stamp = Utc::now() - chrono::Duration::minutes(5);
        let request = OrderMessage {
            order_id: Some("A-1".to_string()),
            customer: Some("Alice".to_string()),
            total: Some(42.5),
            timestamp: Some(stamp),
        };
        let order = EnqueueGateway::complete(request.clone(), Utc::now()).unwrap();
        assert_eq!(order, request);
    }

    #[test]
    fn test_blank_fields_count_as_absent() {
        let request = OrderMessage {
            order_id: Some("  ".to_string()),
            customer: Some(String::new()),
            ..Default::default()
        };
        let order = EnqueueGateway::complete(request, Utc::now()).unwrap();
        assert_eq!(order.order_id.unwrap().len(), 32);
        assert_eq!(order.customer.as_deref(), Some("Anonymous"));
    }

    #[test]
    fn test_negative_total_is_rejected() {
        let request = OrderMessage {
            total: Some(-1.0),
            ..Default::default()
        };
        let err = EnqueueGateway::complete(request, Utc::now()).unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[tokio::test]
    async fn test_enqueue_publishes_exactly_once() {
        let (queue, gateway) = gateway().await;
        let request = OrderMessage::from_value(&json!({"customer": "Alice", "total": 42.5})).unwrap();

        let receipt = gateway.enqueue(request).await.unwrap();
        assert_eq!(receipt.queue, "orders");

        let published = queue.pending_payloads("orders");
        assert_eq!(published.len(), 1);
        assert_eq!(published[0]["order_id"], json!(receipt.order_id));
        assert_eq!(published[0]["customer"], json!("Alice"));
        assert_eq!(published[0]["total"], json!(42.5));
        assert!(published[0]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_generated_ids_are_unique() {
        let (_queue, gateway) = gateway().await;
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let receipt = gateway.enqueue(OrderMessage::default()).await.unwrap();
            assert!(!receipt.order_id.is_empty());
            assert!(seen.insert(receipt.order_id));
        }
    }

    #[tokio::test]
    async fn test_publish_failure_propagates() {
        let queue = Arc::new(InMemoryQueue::new());
        let gateway = EnqueueGateway::new(queue, "missing");

        let err = gateway.enqueue(OrderMessage::default()).await.unwrap_err();
        assert!(matches!(err, RelayError::Messaging(_)));
    }
}
