//! Tests for HTTP module functionality.

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use vidqueue::download::DownloadOption;
use vidqueue::http::client::{create_http_client, HttpClientConfig};
use vidqueue::http::client::USER_AGENT as VIDQUEUE_USER_AGENT;
use vidqueue::media::{Container, Video};
use vidqueue::transfer::{HttpTransfer, QualityPreset, TransferRequest};

mod common;
use common::helpers::*;

/// Answer one request with the raw request head as the body.
async fn echo_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            request.len()
        );
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.write_all(&request).await;
        let _ = socket.shutdown().await;
    });

    format!("http://{}/echo", addr)
}

fn transfer_request(option: DownloadOption, format: &str) -> TransferRequest {
    TransferRequest {
        video: Video::new(TEST_VIDEO_ID, "Title"),
        option,
        path: "out.bin".into(),
        format: format.into(),
        preset: QualityPreset::default(),
    }
}

#[test]
fn test_default_config() {
    let config = HttpClientConfig::default();
    assert_eq!(config.retries, 3);
    assert!(config.proxy.is_none());
    assert!(config.headers.is_none());
}

#[test]
fn test_create_http_client_default() {
    let config = HttpClientConfig::default();
    let client = create_http_client(config);
    assert!(client.is_ok());
}

#[test]
fn test_create_http_client_with_headers() {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("custom-test-agent"));
    let config = HttpClientConfig {
        retries: 0,
        proxy: None,
        headers: Some(headers),
    };
    assert!(create_http_client(config).is_ok());
}

#[test]
fn test_user_agent_names_the_crate() {
    assert!(VIDQUEUE_USER_AGENT.starts_with("vidqueue/"));
}

#[tokio::test]
async fn test_client_sends_default_user_agent() {
    let url = echo_server().await;
    let client = create_http_client(HttpClientConfig::default()).unwrap();

    let echoed = client.get(&url).send().await.unwrap().text().await.unwrap();
    let expected = format!("user-agent: {}", VIDQUEUE_USER_AGENT);
    assert!(
        echoed.to_lowercase().contains(&expected.to_lowercase()),
        "request head was: {}",
        echoed
    );
}

#[tokio::test]
async fn test_custom_headers_override_user_agent() {
    let url = echo_server().await;
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("custom-test-agent"));
    let client = create_http_client(HttpClientConfig {
        headers: Some(headers),
        ..HttpClientConfig::default()
    })
    .unwrap();

    let echoed = client.get(&url).send().await.unwrap().text().await.unwrap();
    assert!(echoed.to_lowercase().contains("user-agent: custom-test-agent"));
}

#[test]
fn test_http_transfer_supports_only_direct_saves() {
    let manifest = create_test_manifest();
    let options = vidqueue::download::download_options(&manifest);

    let paired = options.find_by_format("mp4").cloned().unwrap();
    assert_eq!(paired.label(), "720p");
    assert!(!HttpTransfer::supports(&transfer_request(paired, "mp4")));

    let single = DownloadOption::single("webm", "audio", audio("a", Container::webm(), 1));
    assert!(HttpTransfer::supports(&transfer_request(single.clone(), "webm")));
    assert!(!HttpTransfer::supports(&transfer_request(single, "mp3")));
}
