//! # Tolerant Listing Decoder
//!
//! Decodes order listings from deployments that predate the current response
//! shape. Accepted bodies:
//!
//! - `{"items": [...]}` (current)
//! - a bare array of orders
//! - a single order object
//!
//! Each field is looked up under a list of aliases, first by exact name and
//! then case-insensitively. Numbers may arrive as strings and timestamps as
//! RFC 3339 text, offset-less text (taken as UTC) or Unix milliseconds.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::models::OrderListItem;

const ORDER_ID_KEYS: &[&str] = &[
    "orderId", "orderID", "order_id", "id", "Id", "rowKey", "RowKey", "reference", "ref",
];
const CUSTOMER_KEYS: &[&str] = &["customer", "customerName", "name", "buyer", "client"];
const TOTAL_KEYS: &[&str] = &[
    "total",
    "amount",
    "grandTotal",
    "value",
    "price",
    "sum",
    "totalAmount",
    "total_value",
];
const STATUS_KEYS: &[&str] = &["status", "state"];
const CREATED_KEYS: &[&str] = &[
    "createdUtc",
    "created",
    "createdAt",
    "created_at",
    "timestamp",
    "ts",
    "timeCreated",
];
const PROCESSED_KEYS: &[&str] = &[
    "processedUtc",
    "processed",
    "processedAt",
    "processed_at",
    "updatedAt",
    "completedAt",
];

/// Decode every order found in a listing body
pub fn parse_orders(body: &Value) -> Vec<OrderListItem> {
    let entries: Vec<&Value> = match body {
        Value::Object(root) => match root.get("items") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => vec![body],
        },
        Value::Array(items) => items.iter().collect(),
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(Value::as_object)
        .map(map_order)
        .collect()
}

fn map_order(obj: &Map<String, Value>) -> OrderListItem {
    OrderListItem {
        order_id: find_string(obj, ORDER_ID_KEYS).unwrap_or_default(),
        customer: find_string(obj, CUSTOMER_KEYS).unwrap_or_default(),
        total: find_f64(obj, TOTAL_KEYS).unwrap_or(0.0),
        status: find_string(obj, STATUS_KEYS).unwrap_or_else(|| "Pending".to_string()),
        created_utc: find_datetime(obj, CREATED_KEYS),
        processed_utc: find_datetime(obj, PROCESSED_KEYS),
    }
}

/// First alias present, exact match preferred over a case-insensitive one
fn find<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| {
        obj.get(*key).or_else(|| {
            obj.iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(key))
                .map(|(_, value)| value)
        })
    })
}

fn find_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match find(obj, keys)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn find_f64(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    match find(obj, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn find_datetime(obj: &Map<String, Value>, keys: &[&str]) -> Option<DateTime<Utc>> {
    match find(obj, keys)? {
        Value::String(s) => parse_datetime(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}
