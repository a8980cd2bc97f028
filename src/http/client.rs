//! HTTP client setup and middleware configuration.
//!
//! - **Retry Logic**: Exponential backoff retry policy for transient failures
//! - **Tracing**: Request/response spans through `reqwest-tracing`
//! - **Proxy Support**: Optional HTTP/HTTPS proxy configuration
//! - **Custom Headers**: Default headers applied to all requests
//!
//! # Examples
//!
//! ## Basic Client Creation
//!
//! ```rust
//! use vidqueue::http::{create_http_client, HttpClientConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpClientConfig::default();
//! let client = create_http_client(config)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Client with Custom Configuration
//!
//! ```rust
//! use vidqueue::http::{create_http_client, HttpClientConfig};
//! use reqwest::header::{HeaderMap, USER_AGENT, ACCEPT};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut headers = HeaderMap::new();
//! headers.insert(USER_AGENT, "vidqueue/0.1".parse()?);
//! headers.insert(ACCEPT, "*/*".parse()?);
//!
//! let config = HttpClientConfig {
//!     retries: 5,
//!     proxy: None,
//!     headers: Some(headers),
//! };
//!
//! let client = create_http_client(config)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Client with Proxy
//!
//! ```rust,no_run
//! use vidqueue::http::{create_http_client, HttpClientConfig};
//! use reqwest::Proxy;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let proxy = Proxy::http("http://proxy.example.com:8080")?;
//! let config = HttpClientConfig {
//!     retries: 3,
//!     proxy: Some(proxy),
//!     headers: None,
//! };
//!
//! let client = create_http_client(config)?;
//! # Ok(())
//! # }
//! ```

use reqwest::{header::HeaderMap, Proxy};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use reqwest_tracing::TracingMiddleware;
use std::time::Duration;

/// User agent sent when no default headers override it.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Configuration for HTTP client setup.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Number of retries for transient failures.
    pub retries: u32,
    /// Optional proxy configuration.
    pub proxy: Option<Proxy>,
    /// Default headers to include with all requests.
    pub headers: Option<HeaderMap>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            proxy: None,
            headers: None,
        }
    }
}

/// Connection timeout; streams themselves may take arbitrarily long.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Creates an HTTP client with tracing and retry middleware.
///
/// # Example
///
/// ```rust
/// use vidqueue::http::client::{create_http_client, HttpClientConfig};
///
/// let config = HttpClientConfig::default();
/// let client = create_http_client(config).unwrap();
/// ```
pub fn create_http_client(
    config: HttpClientConfig,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.retries);

    let mut builder = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT);
    if let Some(proxy) = config.proxy {
        builder = builder.proxy(proxy);
    }
    if let Some(headers) = config.headers {
        builder = builder.default_headers(headers);
    }

    let client = ClientBuilder::new(builder.build()?)
        // Trace HTTP requests. See the tracing crate to make use of these traces.
        .with(TracingMiddleware::default())
        // Retry failed requests.
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build();

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, USER_AGENT as USER_AGENT_HEADER};

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert_eq!(config.retries, 3);
        assert!(config.proxy.is_none());
        assert!(config.headers.is_none());
    }

    #[test]
    fn test_user_agent_names_the_crate() {
        assert!(USER_AGENT.starts_with("vidqueue/"));
    }

    #[test]
    fn test_create_http_client_with_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT_HEADER, HeaderValue::from_static("test-agent"));

        let config = HttpClientConfig {
            retries: 0,
            proxy: None,
            headers: Some(headers),
        };
        assert!(create_http_client(config).is_ok());
    }
}
