//! End-to-end relay behavior over the in-memory backends.

mod common;

use async_trait::async_trait;
use chrono::Utc;
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use common::{Pipeline, FINALIZE_QUEUE, ORDERS_QUEUE};
use order_relay::database::{InMemoryOrderTable, OrderTableStore};
use order_relay::error::RelayResult;
use order_relay::messaging::{OrderMessage, OrderQueue};
use order_relay::models::{OrderPatch, OrderRow, OrderSeed};
use order_relay::relay::ListingRequest;
use order_relay::OrderStatus;

#[tokio::test]
async fn test_order_flows_from_enqueue_to_processed() {
    let pipeline = Pipeline::new().await;

    let request = OrderMessage::from_json_str(r#"{"customer":"Alice","total":42.5}"#).unwrap();
    let receipt = pipeline.gateway.enqueue(request).await.unwrap();
    assert!(!receipt.order_id.is_empty());
    assert_eq!(receipt.queue, ORDERS_QUEUE);
    assert!(pipeline.table.is_empty(), "gateway must not write the table");

    assert_eq!(pipeline.run_seed().await.deleted, 1);
    let seeded = pipeline.store.get(&receipt.order_id).await.unwrap().unwrap();
    assert_eq!(seeded.status, OrderStatus::Pending);
    assert!(seeded.processed_utc.is_none());

    assert_eq!(pipeline.run_finalize().await.deleted, 1);
    let finalized = pipeline.store.get(&receipt.order_id).await.unwrap().unwrap();
    assert_eq!(finalized.status, OrderStatus::Processed);
    assert!(finalized.processed_utc.is_some());

    let items = pipeline
        .listing
        .list(&ListingRequest::default())
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].order_id, receipt.order_id);
    assert_eq!(items[0].customer, "Alice");
    assert_eq!(items[0].total, 42.5);
    assert_eq!(items[0].status, "Processed");

    assert!(pipeline.queue.is_empty(ORDERS_QUEUE));
    assert!(pipeline.queue.is_empty(FINALIZE_QUEUE));
}

#[tokio::test]
async fn test_redelivered_seed_message_keeps_one_pending_row() {
    let pipeline = Pipeline::new().await;
    let payload = json!({"order_id": "X", "customer": "Alice", "total": 10});

    pipeline.queue.send_json(ORDERS_QUEUE, &payload).await.unwrap();
    pipeline.queue.send_json(ORDERS_QUEUE, &payload).await.unwrap();
    assert_eq!(pipeline.run_seed().await.deleted, 2);

    let rows = pipeline.store.query(None).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].order_id, "X");
    assert_eq!(rows[0].status, OrderStatus::Pending);

    // Both deliveries forwarded; finalizing twice is harmless
    assert_eq!(pipeline.queue.len(FINALIZE_QUEUE), 2);
    assert_eq!(pipeline.run_finalize().await.deleted, 2);
    assert_eq!(
        pipeline.store.get("X").await.unwrap().unwrap().status,
        OrderStatus::Processed
    );
}

#[tokio::test]
async fn test_finalize_for_unknown_order_is_a_no_op() {
    let pipeline = Pipeline::new().await;
    pipeline
        .queue
        .send_json(FINALIZE_QUEUE, &json!({"order_id": "never-seeded"}))
        .await
        .unwrap();
    pipeline
        .queue
        .send_json(FINALIZE_QUEUE, &json!({"customer": "no id"}))
        .await
        .unwrap();

    let summary = pipeline.run_finalize().await;
    assert_eq!(summary.deleted, 2);
    assert!(pipeline.table.is_empty());
    assert!(pipeline.queue.archived_payloads(FINALIZE_QUEUE).is_empty());
}

#[tokio::test]
async fn test_malformed_seed_message_is_archived_after_max_deliveries() {
    let table = Arc::new(InMemoryOrderTable::new());
    let pipeline = Pipeline::with_store(table.clone(), table, 3).await;
    let poison = json!({"order_id": "bad", "total": "forty"});
    pipeline.queue.send_json(ORDERS_QUEUE, &poison).await.unwrap();

    assert_eq!(pipeline.run_seed().await.retained, 1);
    assert_eq!(pipeline.run_seed().await.retained, 1);
    assert_eq!(pipeline.run_seed().await.archived, 1);

    assert!(pipeline.queue.is_empty(ORDERS_QUEUE));
    assert_eq!(pipeline.queue.archived_payloads(ORDERS_QUEUE), vec![poison]);
    assert!(pipeline.table.is_empty());
    assert!(pipeline.queue.is_empty(FINALIZE_QUEUE));
}

/// Rewrites the row between the finalize read and its merge, a fixed
/// number of times
struct RacingStore {
    inner: Arc<InMemoryOrderTable>,
    races_left: AtomicUsize,
}

#[async_trait]
impl OrderTableStore for RacingStore {
    async fn ensure_table(&self) -> RelayResult<()> {
        self.inner.ensure_table().await
    }

    async fn upsert(&self, seed: OrderSeed) -> RelayResult<OrderRow> {
        self.inner.upsert(seed).await
    }

    async fn get(&self, order_id: &str) -> RelayResult<Option<OrderRow>> {
        let row = self.inner.get(order_id).await?;
        if let Some(current) = &row {
            let race = self
                .races_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if race {
                self.inner
                    .upsert(OrderSeed::pending(
                        current.order_id.clone(),
                        current.customer.clone(),
                        current.total,
                        current.created_utc,
                    ))
                    .await?;
            }
        }
        Ok(row)
    }

    async fn merge_if_match(
        &self,
        order_id: &str,
        patch: &OrderPatch,
        etag: Uuid,
    ) -> RelayResult<OrderRow> {
        self.inner.merge_if_match(order_id, patch, etag).await
    }

    async fn query(&self, status: Option<&str>) -> RelayResult<Vec<OrderRow>> {
        self.inner.query(status).await
    }

    async fn health_check(&self) -> RelayResult<()> {
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "racing"
    }
}

#[tokio::test]
async fn test_version_conflict_is_retried_by_redelivery() {
    let table = Arc::new(InMemoryOrderTable::new());
    let store = Arc::new(RacingStore {
        inner: table.clone(),
        races_left: AtomicUsize::new(1),
    });
    let pipeline = Pipeline::with_store(table, store, 5).await;

    pipeline
        .store
        .upsert(OrderSeed::pending("X", "Alice", 5.0, Utc::now()))
        .await
        .unwrap();
    pipeline
        .queue
        .send_json(FINALIZE_QUEUE, &json!({"order_id": "X"}))
        .await
        .unwrap();

    let first = pipeline.run_finalize().await;
    assert_eq!(first.retained, 1);
    assert_eq!(
        pipeline.table.get("X").await.unwrap().unwrap().status,
        OrderStatus::Pending
    );

    let second = pipeline.run_finalize().await;
    assert_eq!(second.deleted, 1);
    assert_eq!(
        pipeline.table.get("X").await.unwrap().unwrap().status,
        OrderStatus::Processed
    );
}

#[tokio::test]
async fn test_listing_filters_sorts_and_truncates() {
    let pipeline = Pipeline::new().await;
    let base = Utc::now();
    for i in 0..6 {
        pipeline
            .store
            .upsert(OrderSeed::pending(
                format!("o{i}"),
                "Alice",
                f64::from(i),
                base + chrono::Duration::seconds(i64::from(i)),
            ))
            .await
            .unwrap();
    }
    for id in ["o1", "o4"] {
        let row = pipeline.store.get(id).await.unwrap().unwrap();
        pipeline
            .store
            .merge_if_match(id, &OrderPatch::processed(Utc::now()), row.etag)
            .await
            .unwrap();
    }

    let pending = pipeline
        .listing
        .list(&ListingRequest::from_query_pairs([("status", "Pending"), ("top", "3")]))
        .await
        .unwrap();
    let ids: Vec<&str> = pending.iter().map(|o| o.order_id.as_str()).collect();
    assert_eq!(ids, vec!["o5", "o3", "o2"]);

    let processed = pipeline
        .listing
        .list(&ListingRequest::from_query_pairs([("STATUS", "Processed")]))
        .await
        .unwrap();
    let ids: Vec<&str> = processed.iter().map(|o| o.order_id.as_str()).collect();
    assert_eq!(ids, vec!["o4", "o1"]);
    assert!(processed.iter().all(|o| o.processed_utc.is_some()));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_enqueued_orders_get_unique_ids_and_survive_the_relay(
        bodies in prop::collection::vec(common::enqueue_body_strategy(), 1..12)
    ) {
        tokio_test::block_on(async {
            let pipeline = Pipeline::new().await;
            let mut ids = HashSet::new();

            for body in &bodies {
                let request = OrderMessage::from_value(body).unwrap();
                let receipt = pipeline.gateway.enqueue(request).await.unwrap();
                prop_assert!(!receipt.order_id.is_empty());
                prop_assert!(ids.insert(receipt.order_id));
            }

            pipeline.run_seed().await;
            pipeline.run_finalize().await;

            let rows = pipeline.store.query(Some("Processed")).await.unwrap();
            prop_assert_eq!(rows.len(), bodies.len());
            for row in rows {
                prop_assert!(ids.contains(&row.order_id));
                prop_assert!(!row.customer.trim().is_empty());
                prop_assert!(row.total >= 0.0);
            }
            Ok(())
        })?;
    }
}
