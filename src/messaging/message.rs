//! # Order Message Envelope
//!
//! The record that travels through both relay queues. Encoding is canonical
//! snake_case JSON; decoding is stricter about types than about names:
//! field names are matched case-insensitively (and ignoring `_`/`-`) so that
//! payloads produced by PascalCase or camelCase publishers still decode,
//! while a field of the wrong type is rejected as malformed.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{RelayError, RelayResult};

/// Order record carried on the stage-1 and stage-2 queues
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    /// When the gateway accepted the order
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_timestamp"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

impl OrderMessage {
    /// Decode a queue payload or request body that has already been parsed as JSON.
    ///
    /// `null` decodes to an empty message, and a JSON string is treated as
    /// text-encoded JSON and decoded once more.
    pub fn from_value(value: &Value) -> RelayResult<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::String(text) => {
                let inner: Value = serde_json::from_str(text).map_err(|e| {
                    RelayError::malformed(format!("text payload is not JSON: {e}"))
                })?;
                match inner {
                    Value::String(_) => Err(RelayError::malformed(
                        "text payload decodes to another string",
                    )),
                    other => Self::from_value(&other),
                }
            }
            Value::Object(fields) => {
                let normalized = normalize_fields(fields);
                serde_json::from_value(Value::Object(normalized))
                    .map_err(|e| RelayError::malformed(format!("order message: {e}")))
            }
            other => Err(RelayError::malformed(format!(
                "expected a JSON object, got {}",
                json_kind(other)
            ))),
        }
    }

    /// Decode raw text. Blank input is an empty message.
    pub fn from_json_str(raw: &str) -> RelayResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| RelayError::malformed(format!("invalid JSON: {e}")))?;
        Self::from_value(&value)
    }

    pub fn to_value(&self) -> RelayResult<Value> {
        serde_json::to_value(self)
            .map_err(|e| RelayError::internal(format!("order message encoding failed: {e}")))
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    /// The order id, treating blank ids as missing.
    pub fn resolved_order_id(&self) -> Option<&str> {
        self.order_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }

    /// The customer, treating blank names as missing.
    pub fn resolved_customer(&self) -> Option<&str> {
        self.customer
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    /// Totals must be finite and non-negative.
    pub fn validate(&self) -> RelayResult<()> {
        if let Some(total) = self.total {
            if !total.is_finite() {
                return Err(RelayError::invalid_order("total", "must be a finite number"));
            }
            if total < 0.0 {
                return Err(RelayError::invalid_order("total", "must not be negative"));
            }
        }
        Ok(())
    }
}

/// Map a publisher's field name onto the canonical one.
fn canonical_field(name: &str) -> Option<&'static str> {
    let folded: String = name
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect();

    match folded.as_str() {
        "orderid" => Some("order_id"),
        "customer" => Some("customer"),
        "total" => Some("total"),
        "timestamp" | "timestamputc" => Some("timestamp"),
        _ => None,
    }
}

/// Rename known fields to their canonical names and drop unknown ones.
/// When two spellings of the same field are present the canonical spelling wins.
fn normalize_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    let mut normalized = Map::new();
    for (name, value) in fields {
        let Some(canonical) = canonical_field(name) else {
            continue;
        };
        if name == canonical {
            normalized.insert(canonical.to_string(), value.clone());
        } else if !normalized.contains_key(canonical) {
            normalized.insert(canonical.to_string(), value.clone());
        }
    }
    normalized
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// RFC 3339 timestamps, or offset-less ISO timestamps taken as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| D::Error::custom(format!("invalid timestamp '{raw}'")))
}
