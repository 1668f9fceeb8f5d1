use std::sync::Arc;

use order_relay::config::ConsumerConfig;
use order_relay::database::{InMemoryOrderTable, OrderTableStore};
use order_relay::messaging::{InMemoryQueue, OrderQueue};
use order_relay::relay::{
    BatchSummary, EnqueueGateway, FinalizeConsumer, ListingQuery, QueueWorker, SeedConsumer,
};

pub const ORDERS_QUEUE: &str = "orders";
pub const FINALIZE_QUEUE: &str = "orders_finalize";

/// Worker settings that redeliver failed messages on the next poll
pub fn immediate_redelivery(max_delivery_count: i32) -> ConsumerConfig {
    ConsumerConfig {
        enabled: true,
        polling_interval_ms: 5,
        batch_size: 16,
        visibility_timeout_seconds: 0,
        max_delivery_count,
    }
}

/// All three stages wired to in-memory backends
pub struct Pipeline {
    pub table: Arc<InMemoryOrderTable>,
    pub store: Arc<dyn OrderTableStore>,
    pub queue: Arc<InMemoryQueue>,
    pub gateway: EnqueueGateway,
    pub seed_worker: QueueWorker,
    pub finalize_worker: QueueWorker,
    pub listing: ListingQuery,
}

impl Pipeline {
    pub async fn new() -> Self {
        let table = Arc::new(InMemoryOrderTable::new());
        Self::with_store(table.clone(), table, 5).await
    }

    /// Build around `store`; `table` is the in-memory table underneath it
    pub async fn with_store(
        table: Arc<InMemoryOrderTable>,
        store: Arc<dyn OrderTableStore>,
        max_delivery_count: i32,
    ) -> Self {
        let queue = Arc::new(InMemoryQueue::new());
        queue.create_queue(ORDERS_QUEUE).await.unwrap();
        queue.create_queue(FINALIZE_QUEUE).await.unwrap();

        let gateway = EnqueueGateway::new(queue.clone(), ORDERS_QUEUE);
        let seed_worker = QueueWorker::new(
            ORDERS_QUEUE,
            queue.clone(),
            Arc::new(SeedConsumer::new(store.clone(), queue.clone(), FINALIZE_QUEUE)),
            immediate_redelivery(max_delivery_count),
        );
        let finalize_worker = QueueWorker::new(
            FINALIZE_QUEUE,
            queue.clone(),
            Arc::new(FinalizeConsumer::new(store.clone())),
            immediate_redelivery(max_delivery_count),
        );
        let listing = ListingQuery::new(store.clone());

        Self {
            table,
            store,
            queue,
            gateway,
            seed_worker,
            finalize_worker,
            listing,
        }
    }

    pub async fn run_seed(&self) -> BatchSummary {
        self.seed_worker.poll_once().await.unwrap()
    }

    pub async fn run_finalize(&self) -> BatchSummary {
        self.finalize_worker.poll_once().await.unwrap()
    }
}
