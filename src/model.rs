//! Data models shared by the parser, sink and session.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifies the current stream attempt of a consumer.
pub type Generation = u64;

/// An immutable streaming request. One per session.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    /// Endpoint URL
    pub url: String,

    /// HTTP method, `POST` unless overridden
    pub method: Method,

    /// JSON request body; `Value::Null` sends no body
    pub body: Value,
}

impl StreamRequest {
    /// Create a `POST` request with a JSON body.
    pub fn new(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            method: Method::POST,
            body,
        }
    }

    /// Override the HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }
}

/// One interpreted stream record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRecord {
    /// Incremental output, on the reasoning or the answer channel.
    Delta { content: String, is_reasoning: bool },

    /// The server finished the response.
    Done,

    /// The server reported a failure.
    Error {
        code: Option<String>,
        message: Option<String>,
    },
}

impl EventRecord {
    /// User-facing text of an error record: message, then code.
    pub fn error_message(&self) -> Option<String> {
        match self {
            EventRecord::Error { code, message } => Some(
                message
                    .clone()
                    .filter(|m| !m.is_empty())
                    .or_else(|| code.clone().filter(|c| !c.is_empty()))
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ),
            _ => None,
        }
    }
}

/// Lifecycle position of the most recent session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Active,
    Completed,
    Failed,
    Aborted,
    /// The transport ended without a `done` or `error` record.
    Incomplete,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Idle | SessionStatus::Active)
    }
}

/// Consumer-visible accumulated output.
///
/// `content` and `think_content` only grow while a session is running; they
/// are cleared together when the next session starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamState {
    /// Answer channel text
    pub content: String,

    /// Reasoning channel text
    pub think_content: String,

    /// Whether the most recent delta was on the reasoning channel
    pub is_thinking: bool,

    pub is_loading: bool,

    pub is_done: bool,

    pub error: Option<String>,

    pub status: SessionStatus,
}

impl StreamState {
    /// The transport ended without the server finishing or failing.
    pub fn is_incomplete(&self) -> bool {
        self.status == SessionStatus::Incomplete
    }
}

/// How a session ended, as seen by the caller of `run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed(String),
    Aborted,
    Incomplete,
    /// A newer session took over; nothing more was published.
    Superseded,
}

impl Outcome {
    /// Status recorded in the state for this outcome. `Superseded` has none:
    /// the state belongs to the newer session.
    pub fn status(&self) -> Option<SessionStatus> {
        match self {
            Outcome::Completed => Some(SessionStatus::Completed),
            Outcome::Failed(_) => Some(SessionStatus::Failed),
            Outcome::Aborted => Some(SessionStatus::Aborted),
            Outcome::Incomplete => Some(SessionStatus::Incomplete),
            Outcome::Superseded => None,
        }
    }
}
