/// file: src/transport.rs
/// description: authenticated streaming GET used as the server-push transport
use crate::error::StreamError;
use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL},
};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// Raw body chunks of an open stream. Dropping it closes the connection.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, StreamError>>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens the stream; resolves once response headers are in.
    async fn open(&self, url: &Url, token: &str) -> Result<ByteStream, StreamError>;
}

/// Bearer auth travels in the `Authorization` header, so this uses a plain
/// streaming request rather than a header-less push primitive.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration) -> Result<Self, StreamError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(StreamError::from)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, url: &Url, token: &str) -> Result<ByteStream, StreamError> {
        let response = self
            .client
            .get(url.clone())
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| {
                error!("Failed to open notification stream: {}", e);
                StreamError::from(e)
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StreamError::AuthRejected {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(StreamError::Http {
                status: status.as_u16(),
            });
        }

        debug!("Notification stream opened with status {}", status);
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(StreamError::from))
            .boxed())
    }
}
