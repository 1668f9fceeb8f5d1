//! # Order Relay API Client
//!
//! HTTP client for the relay API as used by the storefront.
//!
//! When a function key is configured it is sent on every request, both as
//! the `x-functions-key` header and as the `code` query parameter. Enqueue
//! and listing retry once against the legacy function routes
//! (`/api/Orders_Enqueue`, `/api/Orders_List`) when the current route
//! answers 404.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::decode::parse_orders;
use super::error::{ClientError, ClientResult};
use crate::messaging::OrderMessage;
use crate::models::OrderListItem;

const ENQUEUE_PATH: &str = "/api/orders/enqueue";
const LEGACY_ENQUEUE_PATH: &str = "/api/Orders_Enqueue";
const LIST_PATH: &str = "/api/orders";
const LEGACY_LIST_PATH: &str = "/api/Orders_List";
const PING_PATH: &str = "/api/ping";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRelayClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub function_key: Option<String>,
}

impl Default for OrderRelayClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 30_000,
            function_key: None,
        }
    }
}

/// Acknowledgement of an accepted enqueue. Legacy routes may not report
/// the id or the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueAck {
    pub order_id: Option<String>,
    pub queue: Option<String>,
    pub via_legacy_route: bool,
}

#[derive(Debug, Clone)]
pub struct OrderRelayClient {
    client: Client,
    base_url: Url,
    function_key: Option<String>,
}

impl OrderRelayClient {
    pub fn new(config: OrderRelayClientConfig) -> ClientResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::config_error(format!("Invalid base URL: {e}")))?;

        let function_key = config
            .function_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let mut client_builder = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(format!("order-relay-client/{}", env!("CARGO_PKG_VERSION")));

        if let Some(key) = &function_key {
            let mut default_headers = HeaderMap::new();
            default_headers.insert(
                HeaderName::from_static(crate::web::middleware::auth::FUNCTION_KEY_HEADER),
                HeaderValue::from_str(key)
                    .map_err(|e| ClientError::config_error(format!("Invalid function key: {e}")))?,
            );
            client_builder = client_builder.default_headers(default_headers);
        }

        let client = client_builder
            .build()
            .map_err(|e| ClientError::config_error(format!("Failed to create HTTP client: {e}")))?;

        info!(
            base_url = %base_url,
            timeout_ms = config.timeout_ms,
            auth_enabled = function_key.is_some(),
            "Created order relay client"
        );

        Ok(Self {
            client,
            base_url,
            function_key,
        })
    }

    /// Enqueue a typed order
    pub async fn enqueue(&self, order: &OrderMessage) -> ClientResult<EnqueueAck> {
        let body = serde_json::to_string(order)?;
        self.enqueue_raw(&body).await
    }

    /// Enqueue a raw JSON body as-is
    pub async fn enqueue_raw(&self, raw_json: &str) -> ClientResult<EnqueueAck> {
        let response = self
            .send(Method::POST, ENQUEUE_PATH, &[], Some(raw_json))
            .await?;

        let (response, via_legacy_route) = if response.status() == StatusCode::NOT_FOUND {
            warn!("Enqueue route not found, retrying legacy route");
            let legacy = self
                .send(Method::POST, LEGACY_ENQUEUE_PATH, &[], Some(raw_json))
                .await?;
            (legacy, true)
        } else {
            (response, false)
        };

        let body = self.handle_response(response, "enqueue order").await?;
        let field = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Ok(EnqueueAck {
            order_id: field("orderId"),
            queue: field("queue"),
            via_legacy_route,
        })
    }

    /// List orders, newest first
    pub async fn list_orders(
        &self,
        top: i64,
        status: Option<&str>,
    ) -> ClientResult<Vec<OrderListItem>> {
        let top = top.to_string();
        let mut query = vec![("top", top.as_str())];
        if let Some(status) = status.map(str::trim).filter(|s| !s.is_empty()) {
            query.push(("status", status));
        }

        let response = self.send(Method::GET, LIST_PATH, &query, None).await?;
        let response = if response.status() == StatusCode::NOT_FOUND {
            warn!("Listing route not found, retrying legacy route");
            self.send(Method::GET, LEGACY_LIST_PATH, &query, None).await?
        } else {
            response
        };

        let body = self.handle_response(response, "list orders").await?;
        Ok(parse_orders(&body))
    }

    /// `true` when the service answers its ping route
    pub async fn ping(&self) -> ClientResult<bool> {
        let response = self.send(Method::GET, PING_PATH, &[], None).await?;
        Ok(response.status().is_success())
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> ClientResult<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::config_error(format!("Failed to construct URL: {e}")))?;

        {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in query {
                query_pairs.append_pair(key, value);
            }
            if let Some(key) = &self.function_key {
                query_pairs.append_pair(crate::web::middleware::auth::FUNCTION_KEY_QUERY, key);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        json_body: Option<&str>,
    ) -> ClientResult<reqwest::Response> {
        let url = self.url(path, query)?;
        debug!(method = %method, path = %path, "Sending relay API request");

        let mut request = self.client.request(method, url);
        if let Some(body) = json_body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }

        Ok(request.send().await?)
    }

    async fn handle_response(
        &self,
        response: reqwest::Response,
        operation: &str,
    ) -> ClientResult<Value> {
        let status = response.status();
        if status.is_success() {
            let text = response.text().await?;
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            // Legacy routes sometimes answer with plain text
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            debug!("Successfully completed operation: {}", operation);
            return Ok(body);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!(status = %status, error = %error_text, "Failed operation: {}", operation);

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::AuthError(error_text));
        }
        Err(ClientError::api_error(status.as_u16(), error_text))
    }
}
