//! # Order Handlers
//!
//! `POST /api/orders/enqueue` and `GET /api/orders`.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::messaging::OrderMessage;
use crate::models::OrderListItem;
use crate::relay::ListingRequest;
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResponse {
    pub queued: bool,
    pub queue: String,
    pub order_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub count: usize,
    pub items: Vec<OrderListItem>,
}

/// Enqueue an order: POST /api/orders/enqueue
///
/// The body may be empty or `null`; every missing field is defaulted.
pub async fn enqueue_order(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<EnqueueResponse>)> {
    let raw = std::str::from_utf8(&body)
        .map_err(|_| ApiError::bad_request("request body is not valid UTF-8"))?;
    let request = OrderMessage::from_json_str(raw)?;

    let receipt = state.gateway.enqueue(request).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(EnqueueResponse {
            queued: true,
            queue: receipt.queue,
            order_id: receipt.order_id,
        }),
    ))
}

/// List orders: GET /api/orders?top=25&status=Pending
pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<OrderListResponse>> {
    let request =
        ListingRequest::from_query_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    debug!(status = ?request.status, top = request.top, "Listing orders");

    let items = state.listing.list(&request).await?;

    Ok(Json(OrderListResponse {
        count: items.len(),
        items,
    }))
}
