//! # Listing Query
//!
//! Read path over the order table: optional status filter, newest first,
//! truncated to `top`. Sorting and truncation happen after the rows are
//! fetched.

use std::sync::Arc;
use tracing::debug;

use crate::constants::DEFAULT_LIST_TOP;
use crate::database::OrderTableStore;
use crate::error::RelayResult;
use crate::models::{OrderListItem, OrderRow};

/// Listing parameters as they arrive on the query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub status: Option<String>,
    pub top: i64,
}

impl Default for ListingRequest {
    fn default() -> Self {
        Self {
            status: None,
            top: DEFAULT_LIST_TOP,
        }
    }
}

impl ListingRequest {
    /// Build from raw query pairs. Keys match case-insensitively, an
    /// unparsable `top` falls back to the default and a blank `status`
    /// means no filter.
    pub fn from_query_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut request = Self::default();
        for (key, value) in pairs {
            if key.eq_ignore_ascii_case("top") {
                request.top = value.trim().parse().unwrap_or(DEFAULT_LIST_TOP);
            } else if key.eq_ignore_ascii_case("status") {
                let value = value.trim();
                request.status = (!value.is_empty()).then(|| value.to_string());
            }
        }
        request
    }
}

pub struct ListingQuery {
    store: Arc<dyn OrderTableStore>,
}

impl std::fmt::Debug for ListingQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingQuery")
            .field("store", &self.store.store_type())
            .finish()
    }
}

impl ListingQuery {
    pub fn new(store: Arc<dyn OrderTableStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, request: &ListingRequest) -> RelayResult<Vec<OrderListItem>> {
        if request.top <= 0 {
            return Ok(Vec::new());
        }

        let status = request
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let rows = self.store.query(status).await?;
        let fetched = rows.len();

        let items: Vec<OrderListItem> = newest_first(rows)
            .into_iter()
            .take(usize::try_from(request.top).unwrap_or(usize::MAX))
            .map(OrderListItem::from)
            .collect();

        debug!(
            status = status,
            top = request.top,
            fetched = fetched,
            returned = items.len(),
            "Listed orders"
        );

        Ok(items)
    }
}

/// Newest `created_utc` first; ties ordered by id so the result is stable
fn newest_first(mut rows: Vec<OrderRow>) -> Vec<OrderRow> {
    rows.sort_by(|a, b| {
        b.created_utc
            .cmp(&a.created_utc)
            .then_with(|| a.order_id.cmp(&b.order_id))
    });
    rows
}
