//! # Relay Constants
//!
//! Fixed identifiers and defaults shared by the gateway, the consumers and
//! the storage layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Partition key shared by every order row.
pub const ORDERS_PARTITION: &str = "ORDER";

/// Customer written by the gateway when the request names none.
pub const ANONYMOUS_CUSTOMER: &str = "Anonymous";

/// Customer written by the seed consumer when a stage-1 message names none.
pub const UNKNOWN_CUSTOMER: &str = "Unknown";

pub const DEFAULT_ORDERS_QUEUE: &str = "orders";
pub const DEFAULT_FINALIZE_QUEUE: &str = "orders_finalize";
pub const DEFAULT_ORDERS_TABLE: &str = "orders";

/// Listing size when `top` is missing or unparsable.
pub const DEFAULT_LIST_TOP: i64 = 25;

/// Lifecycle status of an order row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Processed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processed => "Processed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Processed" => Ok(OrderStatus::Processed),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_forms() {
        assert_eq!(OrderStatus::Pending.as_str(), "Pending");
        assert_eq!(OrderStatus::Processed.to_string(), "Processed");
        assert_eq!("Processed".parse::<OrderStatus>(), Ok(OrderStatus::Processed));
        assert!("processed".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_as_pascal_name() {
        let json = serde_json::to_string(&OrderStatus::Pending).unwrap();
        assert_eq!(json, "\"Pending\"");
    }
}
