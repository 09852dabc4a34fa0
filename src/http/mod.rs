//! HTTP client module
//!
//! Authenticated GET client for the WorkRamp API.
//!
//! # Features
//!
//! - **Bounded Retries**: fixed cooldowns for 429 and 5xx, one shared attempt budget
//! - **Explicit Exhaustion**: running out of attempts is an error
//! - **Rate Limiting**: optional governor token bucket, ahead of every attempt

mod client;

pub use client::{
    HttpClient, HttpClientConfig, HttpClientConfigBuilder, RetryCounts, RetryPolicy, BASE_URL,
};
