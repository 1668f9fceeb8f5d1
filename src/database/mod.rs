//! # Order Table Store
//!
//! Keyed access to the single logical table of order rows. All rows live in
//! the fixed [`ORDERS_PARTITION`](crate::constants::ORDERS_PARTITION) and
//! are addressed by order id alone.
//!
//! ## Write semantics
//!
//! - [`OrderTableStore::upsert`] replaces the whole row (or inserts it) and
//!   assigns a fresh version token. Rewriting the same seed is idempotent.
//! - [`OrderTableStore::merge_if_match`] writes only the patch fields, and
//!   only while the stored version token equals the one the caller read.
//!   Otherwise it fails with [`RelayError::ConcurrencyConflict`](crate::error::RelayError).
//!
//! There are no multi-row transactions and no locks.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{RelayError, RelayResult};
use crate::models::{OrderPatch, OrderRow, OrderSeed};

pub use in_memory::InMemoryOrderTable;
pub use postgres::{run_migrations, PgOrderTable};

#[async_trait]
pub trait OrderTableStore: Send + Sync {
    /// Create the table if it doesn't exist
    async fn ensure_table(&self) -> RelayResult<()>;

    /// Insert or fully replace the row for `seed.order_id`
    async fn upsert(&self, seed: OrderSeed) -> RelayResult<OrderRow>;

    async fn get(&self, order_id: &str) -> RelayResult<Option<OrderRow>>;

    /// Apply `patch` if the row still carries `etag`
    async fn merge_if_match(
        &self,
        order_id: &str,
        patch: &OrderPatch,
        etag: Uuid,
    ) -> RelayResult<OrderRow>;

    /// All rows of the partition, optionally restricted to one status, in no particular order
    async fn query(&self, status: Option<&str>) -> RelayResult<Vec<OrderRow>>;

    async fn health_check(&self) -> RelayResult<()>;

    /// Backend name for logs and health output
    fn store_type(&self) -> &'static str;
}

/// Table names are interpolated into SQL, so they are restricted to plain identifiers.
pub fn validate_table_name(table_name: &str) -> RelayResult<()> {
    let mut chars = table_name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_lowercase() || c == '_')
        .unwrap_or(false);
    let valid_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid_start && valid_rest && table_name.len() <= 63 {
        Ok(())
    } else {
        Err(RelayError::configuration(format!(
            "invalid table name '{table_name}': use lowercase letters, digits and '_'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_validation() {
        assert!(validate_table_name("orders").is_ok());
        assert!(validate_table_name("_orders_v2").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("Orders").is_err());
        assert!(validate_table_name("2orders").is_err());
        assert!(validate_table_name("orders; drop").is_err());
    }
}
