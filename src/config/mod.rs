//! # Relay Configuration
//!
//! Typed configuration for the order relay. Values are layered with the
//! `config` crate, later layers winning:
//!
//! 1. built-in defaults ([`RelayConfig::default`])
//! 2. an optional TOML file (`config/order-relay.toml`, or the path in
//!    `ORDER_RELAY_CONFIG`)
//! 3. environment variables prefixed `ORDER_RELAY`, sections separated by
//!    `__` (for example `ORDER_RELAY__CONSUMER__BATCH_SIZE=32`)
//! 4. `DATABASE_URL`, when set
//!
//! ## Usage
//!
//! ```rust,no_run
//! use order_relay::config::RelayConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RelayConfig::load()?;
//! println!("stage-1 queue: {}", config.queues.orders);
//! # Ok(())
//! # }
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{DEFAULT_FINALIZE_QUEUE, DEFAULT_ORDERS_QUEUE, DEFAULT_ORDERS_TABLE};
use crate::database::validate_table_name;
use crate::error::{RelayError, RelayResult};
use crate::messaging::validate_queue_name;

pub use loader::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, ENV_PREFIX};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub database: DatabaseConfig,
    pub queues: QueueNames,
    pub table: TableConfig,
    pub web: WebConfig,
    pub consumer: ConsumerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/order_relay_development".to_string(),
            max_connections: 10,
            acquire_timeout_seconds: 5,
        }
    }
}

/// Names of the two stage channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueNames {
    pub orders: String,
    pub orders_finalize: String,
}

impl Default for QueueNames {
    fn default() -> Self {
        Self {
            orders: DEFAULT_ORDERS_QUEUE.to_string(),
            orders_finalize: DEFAULT_FINALIZE_QUEUE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub name: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ORDERS_TABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub bind_address: String,
    pub request_timeout_ms: u64,
    /// When set, `/api/orders*` requires this key
    pub function_key: Option<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_ms: 30_000,
            function_key: None,
        }
    }
}

impl WebConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    pub enabled: bool,
    pub polling_interval_ms: u64,
    pub batch_size: i32,
    pub visibility_timeout_seconds: i32,
    /// Deliveries after which a failing message is archived
    pub max_delivery_count: i32,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            polling_interval_ms: 250,
            batch_size: 16,
            visibility_timeout_seconds: 30,
            max_delivery_count: 5,
        }
    }
}

impl ConsumerConfig {
    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }
}

impl RelayConfig {
    /// Load from the default file location and the process environment
    pub fn load() -> RelayResult<Self> {
        loader::load_layered(None, None)
    }

    pub fn validate(&self) -> RelayResult<()> {
        validate_queue_name(&self.queues.orders)
            .map_err(|e| RelayError::configuration(format!("queues.orders: {e}")))?;
        validate_queue_name(&self.queues.orders_finalize)
            .map_err(|e| RelayError::configuration(format!("queues.orders_finalize: {e}")))?;
        if self.queues.orders == self.queues.orders_finalize {
            return Err(RelayError::configuration(
                "queues.orders and queues.orders_finalize must differ",
            ));
        }

        validate_table_name(&self.table.name)?;

        if self.database.url.trim().is_empty() {
            return Err(RelayError::configuration("database.url must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(RelayError::configuration(
                "database.max_connections must be greater than 0",
            ));
        }

        if self.consumer.batch_size <= 0 {
            return Err(RelayError::configuration(
                "consumer.batch_size must be greater than 0",
            ));
        }
        if self.consumer.max_delivery_count <= 0 {
            return Err(RelayError::configuration(
                "consumer.max_delivery_count must be greater than 0",
            ));
        }
        if self.consumer.visibility_timeout_seconds <= 0 {
            return Err(RelayError::configuration(
                "consumer.visibility_timeout_seconds must be greater than 0",
            ));
        }

        if let Some(key) = &self.web.function_key {
            if key.trim().is_empty() {
                return Err(RelayError::configuration(
                    "web.function_key must not be blank when set",
                ));
            }
        }

        Ok(())
    }

    /// Database URL with the password masked, for logging
    pub fn redacted_database_url(&self) -> String {
        redact_url(&self.database.url)
    }
}

fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((credentials, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_string(),
    }
}
