//! # In-Process Order Table
//!
//! [`OrderTableStore`] over a `DashMap`. Each row sits behind its shard
//! lock, so the version check and the merge happen atomically.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::OrderTableStore;
use crate::error::{RelayError, RelayResult};
use crate::models::{OrderPatch, OrderRow, OrderSeed};

#[derive(Debug, Default)]
pub struct InMemoryOrderTable {
    rows: DashMap<String, OrderRow>,
}

impl InMemoryOrderTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl OrderTableStore for InMemoryOrderTable {
    async fn ensure_table(&self) -> RelayResult<()> {
        Ok(())
    }

    async fn upsert(&self, seed: OrderSeed) -> RelayResult<OrderRow> {
        let row = seed.into_row(Uuid::new_v4());
        self.rows.insert(row.order_id.clone(), row.clone());
        Ok(row)
    }

    async fn get(&self, order_id: &str) -> RelayResult<Option<OrderRow>> {
        Ok(self.rows.get(order_id).map(|row| row.clone()))
    }

    async fn merge_if_match(
        &self,
        order_id: &str,
        patch: &OrderPatch,
        etag: Uuid,
    ) -> RelayResult<OrderRow> {
        match self.rows.get_mut(order_id) {
            Some(mut row) if row.etag == etag => {
                patch.apply(&mut row);
                row.etag = Uuid::new_v4();
                Ok(row.clone())
            }
            _ => Err(RelayError::conflict(order_id)),
        }
    }

    async fn query(&self, status: Option<&str>) -> RelayResult<Vec<OrderRow>> {
        Ok(self
            .rows
            .iter()
            .filter(|row| status.map_or(true, |wanted| row.status.as_str() == wanted))
            .map(|row| row.clone())
            .collect())
    }

    async fn health_check(&self) -> RelayResult<()> {
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "in_memory"
    }
}
