use proptest::prelude::*;
use serde_json::{json, Map, Value};

/// Customer names, including blank ones the gateway must default
pub fn customer_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop_oneof![
        "[A-Z][a-z]{1,12}( [A-Z][a-z]{1,12})?",
        Just(String::new()),
        Just("   ".to_string()),
    ])
}

/// Non-negative totals with cent precision
pub fn total_strategy() -> impl Strategy<Value = Option<f64>> {
    prop::option::of((0u32..1_000_000).prop_map(|cents| f64::from(cents) / 100.0))
}

/// Enqueue request bodies without an order id, in the key spellings
/// publishers use
pub fn enqueue_body_strategy() -> impl Strategy<Value = Value> {
    (customer_strategy(), total_strategy(), any::<bool>()).prop_map(
        |(customer, total, pascal_case)| {
            let (customer_key, total_key) = if pascal_case {
                ("Customer", "Total")
            } else {
                ("customer", "total")
            };
            let mut body = Map::new();
            if let Some(customer) = customer {
                body.insert(customer_key.to_string(), json!(customer));
            }
            if let Some(total) = total {
                body.insert(total_key.to_string(), json!(total));
            }
            Value::Object(body)
        },
    )
}
