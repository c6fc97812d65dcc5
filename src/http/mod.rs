//! HTTP client layer — `PriceWatchHttp` with per-endpoint retry policies.

pub mod client;
pub mod retry;

pub use client::PriceWatchHttp;
pub use retry::{RetryConfig, RetryPolicy};
