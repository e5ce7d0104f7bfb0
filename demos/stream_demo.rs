//! Streams a canned reasoning/answer response from a local mock server and
//! prints the state as it is published.
//!
//! Run with:
//! ```bash
//! RUST_LOG=thinkstream=debug cargo run --example stream_demo
//! ```
//!
//! Pass a URL as the first argument to stream from a real endpoint instead.

use std::time::Duration;

use serde_json::json;
use thinkstream::options::{StreamOptions, TransportOptions};
use thinkstream::{HttpClient, StreamConsumer, StreamRequest};
use tracing_subscriber::EnvFilter;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const CANNED: &str = concat!(
    "data: {\"type\":\"delta\",\"content\":\"The user wants a haiku. \",\"isThink\":true}\n\n",
    "data: {\"type\":\"delta\",\"content\":\"Five, seven, five.\",\"isThink\":true}\n\n",
    "data: {\"type\":\"delta\",\"content\":\"Borrowed, never owned,\\n\"}\n\n",
    "data: not-json\n\n",
    "data: {\"type\":\"delta\",\"content\":\"lifetimes end where scopes close,\\n\"}\n\n",
    "data: {\"type\":\"delta\",\"content\":\"the checker rests.\"}\n\n",
    "data: {\"type\":\"done\"}\n\n",
);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Keep the server alive until the stream is finished.
    let mut _server = None;
    let url = match std::env::args().nth(1) {
        Some(url) => url,
        None => {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_raw(CANNED.as_bytes().to_vec(), "text/event-stream"),
                )
                .mount(&server)
                .await;
            let url = format!("{}/api/v1/ai/stream", server.uri());
            _server = Some(server);
            url
        }
    };

    let mut transport_options = TransportOptions::default().with_timeout(Duration::from_secs(120));
    if let Ok(token) = std::env::var("THINKSTREAM_TOKEN") {
        transport_options = transport_options.with_bearer_token(token);
    }

    let consumer = StreamConsumer::with_options(
        HttpClient::new(transport_options)?,
        StreamOptions::default().with_flush_interval(Duration::from_millis(20)),
    );

    let mut updates = consumer.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            println!(
                "[{:?}] thinking={} think={}B answer={}B",
                state.status,
                state.is_thinking,
                state.think_content.len(),
                state.content.len()
            );
            if state.status.is_terminal() {
                break;
            }
        }
    });

    let request = StreamRequest::new(url, json!({"prompt": "Write a haiku about Rust"}));
    let outcome = consumer.stream(request).await;
    printer.await?;

    let state = consumer.state();
    println!("\n=== Reasoning ===\n{}", state.think_content);
    println!("\n=== Answer ===\n{}", state.content);
    println!("\nOutcome: {:?}", outcome);

    Ok(())
}
