//! Direct HTTP transfer of a single stream.
//!
//! Used when the chosen option is one stream whose container is already the
//! requested format, so no muxing or transcoding is needed. The body is
//! written chunk by chunk to the destination placeholder.

use super::{Transfer, TransferRequest};
use crate::download::OptionStreams;
use crate::error::{Error, Result};
use crate::http::{create_http_client, HttpClientConfig};
use crate::progress::ProgressSink;
use crate::utils::content_length::total_size;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest_middleware::ClientWithMiddleware;
use std::fmt;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Streams a single media stream to disk over HTTP.
#[derive(Clone)]
pub struct HttpTransfer {
    client: ClientWithMiddleware,
}

impl fmt::Debug for HttpTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransfer").finish_non_exhaustive()
    }
}

impl HttpTransfer {
    /// Creates a transfer with its own HTTP client.
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        Ok(Self {
            client: create_http_client(config)?,
        })
    }

    /// Creates a transfer sharing an existing client.
    pub fn with_client(client: ClientWithMiddleware) -> Self {
        Self { client }
    }

    /// Returns `true` if this transfer can produce `request` without
    /// conversion.
    pub fn supports(request: &TransferRequest) -> bool {
        match request.option.streams() {
            OptionStreams::Single(stream) => {
                stream.container.name().eq_ignore_ascii_case(&request.format)
            }
            OptionStreams::Pair { .. } => false,
        }
    }
}

#[async_trait]
impl Transfer for HttpTransfer {
    async fn run(
        &self,
        request: &TransferRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let stream = match request.option.streams() {
            OptionStreams::Single(stream) if Self::supports(request) => stream,
            _ => {
                return Err(Error::Unsupported(format!(
                    "option {} cannot be saved as {} without conversion",
                    request.option, request.format
                )))
            }
        };

        debug!("Fetching {}", stream.url);
        let res = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            res = self.client.get(stream.url.as_str()).send() => res?,
        };
        let res = res.error_for_status()?;
        let size = total_size(&res, stream.size);

        debug!("Writing to {:?}", request.path);
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(&request.path)
            .await?;

        let mut written: u64 = 0;
        let mut body = res.bytes_stream();
        loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                item = body.next() => item,
            };
            let Some(chunk) = item else { break };
            let mut chunk = chunk?;
            written += chunk.len() as u64;
            file.write_all_buf(&mut chunk).await?;

            if let Some(size) = size.filter(|s| *s > 0) {
                progress.report(written as f64 / size as f64);
            }
        }
        file.flush().await?;
        progress.report(1.0);

        debug!("Wrote {} bytes to {:?}", written, request.path);
        Ok(())
    }
}
