//! HTTP client used by [`HttpTransfer`](crate::transfer::HttpTransfer).
//!
//! Requests go through `reqwest-middleware` with tracing and exponential
//! backoff retries, so flaky media hosts do not fail a download on the first
//! transient error.
//!
//! # Examples
//!
//! ```rust
//! use vidqueue::http::{create_http_client, HttpClientConfig};
//! use vidqueue::transfer::HttpTransfer;
//! use reqwest::header::{HeaderMap, USER_AGENT};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut headers = HeaderMap::new();
//! headers.insert(USER_AGENT, "vidqueue/0.1".parse()?);
//!
//! let config = HttpClientConfig {
//!     retries: 5,
//!     proxy: None,
//!     headers: Some(headers),
//! };
//!
//! let transfer = HttpTransfer::with_client(create_http_client(config)?);
//! # Ok(())
//! # }
//! ```

pub mod client;

pub use client::{create_http_client, HttpClientConfig};
