//! Transport and stream configuration.

use std::collections::HashMap;
use std::time::Duration;

/// Default minimum interval between two throttled flushes.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(50);

/// A secret string type for sensitive data like bearer tokens.
/// Prevents accidental logging or display of secrets.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret string.
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Get the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// HTTP transport configuration used by [`crate::http::HttpClient`].
///
/// # Example
/// ```rust
/// use thinkstream::options::TransportOptions;
/// use std::time::Duration;
///
/// let options = TransportOptions::default()
///     .with_timeout(Duration::from_secs(120))
///     .with_bearer_token("token")
///     .with_header("X-Request-Source".to_string(), "admin".to_string());
/// assert!(options.bearer_token.is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Whole-request timeout, including the time spent streaming the body
    pub timeout: Option<Duration>,

    /// Sent as `Authorization: Bearer <token>` when present
    pub bearer_token: Option<SecretString>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,
}

impl TransportOptions {
    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the bearer token.
    pub fn with_bearer_token(mut self, token: impl Into<SecretString>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }
}

/// Options controlling how a consumer publishes stream output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    /// Minimum time between two throttled flushes of pending text.
    /// Terminal events always flush regardless of this interval.
    pub flush_interval: Duration,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

impl StreamOptions {
    /// Set the flush interval.
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_string_is_redacted() {
        let secret = SecretString::from("sk-123");
        assert_eq!(format!("{:?}", secret), "SecretString([REDACTED])");
        assert_eq!(secret.expose_secret(), "sk-123");
    }

    #[test]
    fn test_with_header_accumulates() {
        let options = TransportOptions::default()
            .with_header("a".to_string(), "1".to_string())
            .with_header("b".to_string(), "2".to_string());
        let headers = options.extra_headers.unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["b"], "2");
    }

    #[test]
    fn test_stream_options_default_interval() {
        assert_eq!(
            StreamOptions::default().flush_interval,
            Duration::from_millis(50)
        );
    }
}
