//! # Finalize Consumer
//!
//! Stage-2 handler. Marks a seeded order `Processed`.
//!
//! The merge is conditional on the version token read just before it, so a
//! concurrent write surfaces as [`RelayError::ConcurrencyConflict`](crate::error::RelayError::ConcurrencyConflict). That error
//! goes back to the queue worker and the redelivery reads fresh state.
//! Messages without an id, or for an order that has no row, are dropped.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use super::worker::MessageHandler;
use crate::database::OrderTableStore;
use crate::error::RelayResult;
use crate::logging::log_order_operation;
use crate::messaging::OrderMessage;
use crate::models::{OrderPatch, OrderRow};

#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeOutcome {
    Finalized(OrderRow),
    /// The message carried no usable order id
    MissingOrderId,
    /// No row exists for the id
    OrderNotFound { order_id: String },
}

pub struct FinalizeConsumer {
    store: Arc<dyn OrderTableStore>,
}

impl std::fmt::Debug for FinalizeConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinalizeConsumer")
            .field("store", &self.store.store_type())
            .finish()
    }
}

impl FinalizeConsumer {
    pub fn new(store: Arc<dyn OrderTableStore>) -> Self {
        Self { store }
    }

    pub async fn finalize(&self, payload: &Value) -> RelayResult<FinalizeOutcome> {
        let message = OrderMessage::from_value(payload)?;

        let Some(order_id) = message.resolved_order_id() else {
            warn!("Finalize message without order id, dropping");
            return Ok(FinalizeOutcome::MissingOrderId);
        };

        let Some(current) = self.store.get(order_id).await? else {
            warn!(order_id = %order_id, "Finalize for unknown order, dropping");
            return Ok(FinalizeOutcome::OrderNotFound {
                order_id: order_id.to_string(),
            });
        };

        let patch = OrderPatch::processed(Utc::now());
        let row = self
            .store
            .merge_if_match(order_id, &patch, current.etag)
            .await?;

        info!(order_id = %order_id, "✅ Order processed");
        log_order_operation("finalize", Some(order_id), None, row.status.as_str(), None);

        Ok(FinalizeOutcome::Finalized(row))
    }
}

#[async_trait]
impl MessageHandler for FinalizeConsumer {
    fn name(&self) -> &'static str {
        "finalize"
    }

    async fn handle_message(&self, payload: &Value) -> RelayResult<()> {
        self.finalize(payload).await.map(|_| ())
    }
}
