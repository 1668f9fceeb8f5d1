pub mod order;

pub use order::{OrderListItem, OrderPatch, OrderRow, OrderSeed};
