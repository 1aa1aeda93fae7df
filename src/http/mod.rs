//! HTTP client module
//!
//! Transport for the warehouse client: retries with backoff, token bucket rate limiting and
//! authentication. Retry policy lives here, never in the ingestion loop.

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
