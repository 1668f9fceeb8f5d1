#![allow(dead_code)]

pub mod harness;
pub mod strategies;
pub mod test_server;

pub use harness::*;
pub use strategies::*;
pub use test_server::*;
