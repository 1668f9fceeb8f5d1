//! # Order Model
//!
//! Row shape of the orders table and the views derived from it.
//!
//! ## Database Schema
//!
//! Maps to the `orders` table (name configurable):
//! ```sql
//! CREATE TABLE orders (
//!   partition_key TEXT NOT NULL,
//!   row_key TEXT NOT NULL,          -- order id
//!   customer TEXT NOT NULL,
//!   total DOUBLE PRECISION NOT NULL,
//!   status TEXT NOT NULL,
//!   created_utc TIMESTAMPTZ NOT NULL,
//!   processed_utc TIMESTAMPTZ,
//!   etag UUID NOT NULL,
//!   PRIMARY KEY (partition_key, row_key)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{OrderStatus, ORDERS_PARTITION};

/// A persisted order row.
///
/// `etag` is the version token; every write replaces it, and conditional
/// merges only apply while it is unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRow {
    pub partition_key: String,
    pub order_id: String,
    pub customer: String,
    pub total: f64,
    pub status: OrderStatus,
    pub created_utc: DateTime<Utc>,
    pub processed_utc: Option<DateTime<Utc>>,
    pub etag: Uuid,
}

/// Full replacement content for an upsert
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSeed {
    pub order_id: String,
    pub customer: String,
    pub total: f64,
    pub status: OrderStatus,
    pub created_utc: DateTime<Utc>,
}

impl OrderSeed {
    pub fn pending(
        order_id: impl Into<String>,
        customer: impl Into<String>,
        total: f64,
        created_utc: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            customer: customer.into(),
            total,
            status: OrderStatus::Pending,
            created_utc,
        }
    }

    /// The row this seed becomes when written with the given version token.
    /// Replacement clears fields the seed does not carry.
    pub fn into_row(self, etag: Uuid) -> OrderRow {
        OrderRow {
            partition_key: ORDERS_PARTITION.to_string(),
            order_id: self.order_id,
            customer: self.customer,
            total: self.total,
            status: self.status,
            created_utc: self.created_utc,
            processed_utc: None,
            etag,
        }
    }
}

/// Fields written by a merge; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub processed_utc: Option<DateTime<Utc>>,
}

impl OrderPatch {
    pub fn processed(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(OrderStatus::Processed),
            processed_utc: Some(at),
        }
    }

    pub fn apply(&self, row: &mut OrderRow) {
        if let Some(status) = self.status {
            row.status = status;
        }
        if let Some(processed_utc) = self.processed_utc {
            row.processed_utc = Some(processed_utc);
        }
    }
}

/// Listing entry as returned by `GET /api/orders`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderListItem {
    pub order_id: String,
    pub customer: String,
    pub total: f64,
    pub status: String,
    pub created_utc: Option<DateTime<Utc>>,
    pub processed_utc: Option<DateTime<Utc>>,
}

impl From<OrderRow> for OrderListItem {
    fn from(row: OrderRow) -> Self {
        Self {
            order_id: row.order_id,
            customer: row.customer,
            total: row.total,
            status: row.status.as_str().to_string(),
            created_utc: Some(row.created_utc),
            processed_utc: row.processed_utc,
        }
    }
}
