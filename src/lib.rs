//! # thinkstream - incremental consumer for reasoning model streams
//!
//! Reads a server-sent event stream in which a model reports its output on
//! two channels, reasoning ("think") and answer, and folds it into a state
//! snapshot that a UI or CLI can poll or watch.
//!
//! ## Features
//! - Chunk-boundary independent SSE framing, including split UTF-8
//! - Separate reasoning and answer text, each append-only per stream
//! - Throttled publication with guaranteed flush before `done` / `error`
//! - At most one live stream per consumer: starting a new one supersedes the
//!   old one, whose late output is discarded
//! - Silent user cancellation, distinct from failure and from truncation
//!
//! ## Wire format
//!
//! ```text
//! data: {"type":"delta","content":"...","isThink":true}
//!
//! data: {"type":"delta","content":"...","isThink":false}
//!
//! data: {"type":"done"}
//! ```
//!
//! An `{"type":"error","code":"...","message":"..."}` record ends the stream
//! with a failure.
//!
//! ## Example
//! ```no_run
//! use serde_json::json;
//! use thinkstream::{HttpClient, StreamConsumer, StreamRequest};
//! use thinkstream::options::TransportOptions;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpClient::new(TransportOptions::default().with_bearer_token("token"))?;
//!     let consumer = StreamConsumer::new(transport);
//!
//!     let request = StreamRequest::new(
//!         "http://localhost:8000/api/v1/ai/stream",
//!         json!({"prompt": "Summarize this article"}),
//!     );
//!     let outcome = consumer.stream(request).await;
//!
//!     let state = consumer.state();
//!     println!("{:?}\nthinking: {}\nanswer: {}", outcome, state.think_content, state.content);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod consumer;
pub mod event;
pub mod http;
pub mod model;
pub mod options;
pub mod session;
pub mod sink;
pub mod sse;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use cache::ResponseCache;
pub use client::{ClientError, Transport, TransportResponse};
pub use consumer::StreamConsumer;
pub use http::HttpClient;
pub use model::{EventRecord, Outcome, SessionStatus, StreamRequest, StreamState};
pub use session::StreamSession;
