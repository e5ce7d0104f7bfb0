//! Interpretation of stream payloads into [`EventRecord`]s.

use serde::Deserialize;

use crate::client::ClientError;
use crate::model::EventRecord;

/// Wire shape of one payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireEvent {
    Delta {
        #[serde(default)]
        content: Option<String>,
        #[serde(default, rename = "isThink")]
        is_think: Option<bool>,
    },
    Done,
    Error {
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(other)]
    Other,
}

impl WireEvent {
    fn into_record(self) -> Option<EventRecord> {
        match self {
            WireEvent::Delta { content, is_think } => Some(EventRecord::Delta {
                content: content.unwrap_or_default(),
                is_reasoning: is_think.unwrap_or(false),
            }),
            WireEvent::Done => Some(EventRecord::Done),
            WireEvent::Error { code, message } => Some(EventRecord::Error { code, message }),
            WireEvent::Other => None,
        }
    }
}

/// Deserialize one `data: ` payload.
///
/// Returns `Ok(None)` for record types this client does not know, so newer
/// servers can add records without breaking older consumers. Malformed JSON
/// and objects without a `type` are reported as [`ClientError::Parse`]; the
/// caller decides whether to skip them.
///
/// # Example
/// ```
/// use thinkstream::event::parse_event;
/// use thinkstream::model::EventRecord;
///
/// let record = parse_event(r#"{"type":"delta","content":"Hi","isThink":false}"#).unwrap();
/// assert_eq!(
///     record,
///     Some(EventRecord::Delta { content: "Hi".to_string(), is_reasoning: false })
/// );
/// ```
pub fn parse_event(payload: &str) -> Result<Option<EventRecord>, ClientError> {
    let event: WireEvent = serde_json::from_str(payload)?;
    Ok(event.into_record())
}
