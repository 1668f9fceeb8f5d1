//! # Web API Application State
//!
//! Shared state handed to every request handler.

use std::sync::Arc;

use crate::config::{QueueNames, RelayConfig, WebConfig};
use crate::database::OrderTableStore;
use crate::messaging::OrderQueue;
use crate::relay::{EnqueueGateway, ListingQuery};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WebConfig>,
    pub queues: Arc<QueueNames>,
    pub gateway: Arc<EnqueueGateway>,
    pub listing: Arc<ListingQuery>,
    pub store: Arc<dyn OrderTableStore>,
    pub queue: Arc<dyn OrderQueue>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("bind_address", &self.config.bind_address)
            .field("auth_enabled", &self.auth_enabled())
            .field("queues", &self.queues)
            .field("store", &self.store.store_type())
            .field("queue", &self.queue.client_type())
            .finish()
    }
}

impl AppState {
    pub fn new(
        config: &RelayConfig,
        store: Arc<dyn OrderTableStore>,
        queue: Arc<dyn OrderQueue>,
    ) -> Self {
        Self {
            config: Arc::new(config.web.clone()),
            queues: Arc::new(config.queues.clone()),
            gateway: Arc::new(EnqueueGateway::new(queue.clone(), config.queues.orders.clone())),
            listing: Arc::new(ListingQuery::new(store.clone())),
            store,
            queue,
        }
    }

    pub fn auth_enabled(&self) -> bool {
        self.config.function_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryOrderTable;
    use crate::messaging::InMemoryQueue;

    #[test]
    fn test_state_follows_configuration() {
        let mut config = RelayConfig::default();
        config.queues.orders = "storefront_orders".to_string();

        let state = AppState::new(
            &config,
            Arc::new(InMemoryOrderTable::new()),
            Arc::new(InMemoryQueue::new()),
        );
        assert!(!state.auth_enabled());
        assert_eq!(state.gateway.queue_name(), "storefront_orders");

        config.web.function_key = Some("secret".to_string());
        let state = AppState::new(
            &config,
            Arc::new(InMemoryOrderTable::new()),
            Arc::new(InMemoryQueue::new()),
        );
        assert!(state.auth_enabled());
        assert!(format!("{state:?}").contains("auth_enabled: true"));
    }
}
