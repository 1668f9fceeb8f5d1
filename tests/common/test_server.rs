use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use order_relay::client::{OrderRelayClient, OrderRelayClientConfig};
use order_relay::config::RelayConfig;
use order_relay::database::InMemoryOrderTable;
use order_relay::messaging::{InMemoryQueue, OrderQueue};
use order_relay::web::{create_app, handlers, AppState};

/// The relay API served on an ephemeral port over in-memory backends
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<InMemoryOrderTable>,
    pub queue: Arc<InMemoryQueue>,
    pub config: RelayConfig,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(RelayConfig::default()).await
    }

    pub async fn start_with(config: RelayConfig) -> Self {
        let (store, queue, state) = backends(&config).await;
        Self::serve(create_app(state), config, store, queue).await
    }

    /// Only the legacy function routes, as served by older deployments
    pub async fn start_legacy() -> Self {
        let config = RelayConfig::default();
        let (store, queue, state) = backends(&config).await;
        let app = Router::new()
            .route(
                "/api/Orders_Enqueue",
                post(handlers::orders::enqueue_order),
            )
            .route("/api/Orders_List", get(handlers::orders::list_orders))
            .with_state(state);
        Self::serve(app, config, store, queue).await
    }

    async fn serve(
        app: Router,
        config: RelayConfig,
        store: Arc<InMemoryOrderTable>,
        queue: Arc<InMemoryQueue>,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            store,
            queue,
            config,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn client(&self) -> OrderRelayClient {
        self.client_with_key(None)
    }

    pub fn client_with_key(&self, function_key: Option<&str>) -> OrderRelayClient {
        OrderRelayClient::new(OrderRelayClientConfig {
            base_url: self.base_url.clone(),
            timeout_ms: 5_000,
            function_key: function_key.map(str::to_string),
        })
        .unwrap()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await.unwrap();
        }
    }
}

async fn backends(config: &RelayConfig) -> (Arc<InMemoryOrderTable>, Arc<InMemoryQueue>, AppState) {
    let store = Arc::new(InMemoryOrderTable::new());
    let queue = Arc::new(InMemoryQueue::new());
    queue.create_queue(&config.queues.orders).await.unwrap();
    queue
        .create_queue(&config.queues.orders_finalize)
        .await
        .unwrap();
    let state = AppState::new(config, store.clone(), queue.clone());
    (store, queue, state)
}
