//! Transport trait and error types.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use reqwest::StatusCode;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::model::StreamRequest;

/// Errors that can occur while opening or reading a stream.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("HTTP {}: {}", .0.as_u16(), .0.canonical_reason().unwrap_or("Unknown"))]
    Status(StatusCode),

    #[error("Stream cancelled")]
    StreamCancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Body of an opened stream: byte chunks in arrival order.
pub type ByteStream = BoxStream<'static, Result<Bytes, ClientError>>;

/// A response whose body has not been read yet.
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: ByteStream,
}

impl TransportResponse {
    /// Create a response from a status and body stream.
    pub fn new(status: StatusCode, body: ByteStream) -> Self {
        Self { status, body }
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Opens a streamed request/response exchange.
///
/// Implementations must return as soon as the response head is available;
/// the body is consumed lazily by the session. When `cancel` fires before the
/// head arrives, return [`ClientError::StreamCancelled`].
///
/// # Example
/// ```rust,ignore
/// struct Canned(Vec<&'static str>);
///
/// #[async_trait]
/// impl Transport for Canned {
///     async fn open(
///         &self,
///         _request: &StreamRequest,
///         _cancel: &CancellationToken,
///     ) -> Result<TransportResponse, ClientError> {
///         let chunks = self.0.iter().map(|c| Ok(Bytes::from_static(c.as_bytes())));
///         Ok(TransportResponse::new(StatusCode::OK, stream::iter(chunks.collect::<Vec<_>>()).boxed()))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(
        &self,
        request: &StreamRequest,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse, ClientError>;
}
