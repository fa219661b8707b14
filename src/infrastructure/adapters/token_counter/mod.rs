//! Token Counter Adapter - token 数估算

mod approx_counter;
mod http_counter;

pub use approx_counter::ApproxTokenCounter;
pub use http_counter::{HttpTokenCounter, HttpTokenCounterConfig};
