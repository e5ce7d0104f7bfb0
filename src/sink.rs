//! Throttled publication of stream text.
//!
//! Deltas are collected per channel and moved into the [`StreamState`] in
//! batches, so a fast stream produces at most one visible update per flush
//! interval. Terminal records bypass the throttle.

use std::time::Duration;

use tokio::time::Instant;

use crate::model::StreamState;

/// Pending text for one session.
#[derive(Debug)]
pub struct OutputSink {
    content: String,
    reasoning: String,
    reasoning_active: bool,
    dirty: bool,
    last_flush: Option<Instant>,
    interval: Duration,
}

impl OutputSink {
    /// Create an empty sink flushing at most once per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            content: String::new(),
            reasoning: String::new(),
            reasoning_active: false,
            dirty: false,
            last_flush: None,
            interval,
        }
    }

    /// Buffer one delta. The channel of the latest delta decides the
    /// published `is_thinking` flag.
    pub fn push(&mut self, content: &str, is_reasoning: bool) {
        if is_reasoning {
            self.reasoning.push_str(content);
        } else {
            self.content.push_str(content);
        }
        self.reasoning_active = is_reasoning;
        self.dirty = true;
    }

    /// Whether a throttled flush is due at `now`.
    pub fn should_flush(&self, now: Instant) -> bool {
        self.dirty
            && self
                .last_flush
                .map_or(true, |last| now.duration_since(last) > self.interval)
    }

    /// Move pending text into `state` and clear the buffers.
    ///
    /// `is_thinking` is written even when nothing is pending.
    pub fn flush_into(&mut self, state: &mut StreamState, now: Instant) {
        if !self.content.is_empty() {
            state.content.push_str(&self.content);
            self.content.clear();
        }
        if !self.reasoning.is_empty() {
            state.think_content.push_str(&self.reasoning);
            self.reasoning.clear();
        }
        state.is_thinking = self.reasoning_active;
        self.dirty = false;
        self.last_flush = Some(now);
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(50);

    #[test]
    fn test_channels_are_separated() {
        let mut sink = OutputSink::new(INTERVAL);
        let mut state = StreamState::default();

        sink.push("think-1 ", true);
        sink.push("answer-1 ", false);
        sink.push("think-2", true);
        sink.push("answer-2", false);
        sink.flush_into(&mut state, Instant::now());

        assert_eq!(state.think_content, "think-1 think-2");
        assert_eq!(state.content, "answer-1 answer-2");
        assert!(!state.is_thinking);

        let snapshot = state.clone();
        sink.flush_into(&mut state, Instant::now());
        assert_eq!(state, snapshot);
    }

    #[test]
    fn test_flush_appends() {
        let mut sink = OutputSink::new(INTERVAL);
        let mut state = StreamState {
            content: "Hel".to_string(),
            ..Default::default()
        };

        sink.push("lo", false);
        sink.flush_into(&mut state, Instant::now());
        assert_eq!(state.content, "Hello");
    }

    #[test]
    fn test_empty_flush_still_updates_thinking_flag() {
        let mut sink = OutputSink::new(INTERVAL);
        let mut state = StreamState::default();

        sink.push("", true);
        sink.flush_into(&mut state, Instant::now());
        assert!(state.is_thinking);
        assert!(state.think_content.is_empty());
    }

    #[test]
    fn test_throttle_window() {
        let start = Instant::now();
        let mut sink = OutputSink::new(INTERVAL);
        let mut state = StreamState::default();

        assert!(!sink.should_flush(start), "nothing pending");

        sink.push("a", false);
        assert!(sink.should_flush(start), "first batch flushes immediately");
        sink.flush_into(&mut state, start);

        sink.push("b", false);
        assert!(!sink.should_flush(start + Duration::from_millis(10)));
        assert!(!sink.should_flush(start + INTERVAL));
        assert!(sink.should_flush(start + Duration::from_millis(51)));
    }
}
