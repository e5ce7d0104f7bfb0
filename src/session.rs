//! One stream attempt: transport → frames → records → sink → state.

use std::sync::Arc;

use futures::StreamExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::ResponseCache;
use crate::client::{ClientError, Transport};
use crate::consumer::Shared;
use crate::event::parse_event;
use crate::model::{EventRecord, Generation, Outcome, SessionStatus, StreamRequest, StreamState};
use crate::options::StreamOptions;
use crate::sink::OutputSink;
use crate::sse::FrameParser;

/// A started stream, created by
/// [`StreamConsumer::start`](crate::consumer::StreamConsumer::start).
///
/// Consumed by [`run`](StreamSession::run); a session is never reused.
pub struct StreamSession<T> {
    generation: Generation,
    request: StreamRequest,
    cancel: CancellationToken,
    transport: Arc<T>,
    shared: Arc<Shared>,
    options: StreamOptions,
    cache: Option<ResponseCache>,
    settled: bool,
}

impl<T> std::fmt::Debug for StreamSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("generation", &self.generation)
            .field("url", &self.request.url)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> StreamSession<T> {
    pub(crate) fn new(
        generation: Generation,
        request: StreamRequest,
        cancel: CancellationToken,
        transport: Arc<T>,
        shared: Arc<Shared>,
        options: StreamOptions,
        cache: Option<ResponseCache>,
    ) -> Self {
        Self {
            generation,
            request,
            cancel,
            transport,
            shared,
            options,
            cache,
            settled: false,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Whether this session was aborted or superseded.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive the stream until the server finishes, fails, the transport
    /// ends, or the session is cancelled.
    ///
    /// Never returns an error: failures are recorded in the consumer state
    /// and summarized by the returned [`Outcome`].
    ///
    /// Dropping the session, or the future returned here, before it settles
    /// ends the stream as [`Outcome::Aborted`] if it is still current.
    pub async fn run(mut self) -> Outcome {
        let cached = self.cache.as_ref().and_then(|cache| cache.get(&self.request));
        let outcome = match cached {
            Some(state) => self.replay(state),
            None => self.drive().await,
        };
        self.settle(&outcome);
        outcome
    }

    async fn drive(&self) -> Outcome {
        let opened = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return self.cancelled(),
            opened = self.transport.open(&self.request, &self.cancel) => opened,
        };

        let response = match opened {
            Ok(response) => response,
            Err(ClientError::StreamCancelled) => return self.cancelled(),
            Err(e) => {
                warn!(generation = self.generation, error = %e, "failed to open stream");
                return self.fail(e.to_string());
            }
        };

        if !response.status.is_success() {
            warn!(generation = self.generation, status = %response.status, "stream rejected");
            return self.fail(ClientError::Status(response.status).to_string());
        }

        let mut body = response.body;
        let mut parser = FrameParser::new();
        let mut sink = OutputSink::new(self.options.flush_interval);

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return self.cancelled(),
                next = body.next() => next,
            };

            if !self.shared.is_current(self.generation) {
                return Outcome::Superseded;
            }

            let payloads = match next {
                Some(Ok(chunk)) => parser.feed(&chunk),
                Some(Err(ClientError::StreamCancelled)) => return self.cancelled(),
                Some(Err(e)) => {
                    warn!(generation = self.generation, error = %e, "stream transport failed");
                    return self.fail(e.to_string());
                }
                None => {
                    if let Some(outcome) = self.process(parser.finish(), &mut sink) {
                        return outcome;
                    }
                    return if self.flush(&mut sink) {
                        Outcome::Incomplete
                    } else {
                        Outcome::Superseded
                    };
                }
            };

            if let Some(outcome) = self.process(payloads, &mut sink) {
                return outcome;
            }
            if sink.should_flush(Instant::now()) && !self.flush(&mut sink) {
                return Outcome::Superseded;
            }
        }
    }

    /// Feed one batch of payloads through the sink. Returns the outcome once
    /// a terminal record is reached; anything after it is ignored.
    fn process(&self, payloads: Vec<String>, sink: &mut OutputSink) -> Option<Outcome> {
        for payload in payloads {
            let record = match parse_event(&payload) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    warn!(
                        generation = self.generation,
                        error = %e,
                        payload = %payload,
                        "skipping malformed stream frame"
                    );
                    continue;
                }
            };

            match record {
                EventRecord::Delta {
                    content,
                    is_reasoning,
                } => sink.push(&content, is_reasoning),
                EventRecord::Done => return Some(self.complete(sink)),
                error @ EventRecord::Error { .. } => {
                    let message = error.error_message().unwrap_or_default();
                    return Some(self.fail_with(sink, message));
                }
            }
        }
        None
    }

    fn flush(&self, sink: &mut OutputSink) -> bool {
        let now = Instant::now();
        self.shared
            .update(self.generation, |state| sink.flush_into(state, now))
    }

    fn complete(&self, sink: &mut OutputSink) -> Outcome {
        let now = Instant::now();
        let published = self.shared.update(self.generation, |state| {
            sink.flush_into(state, now);
            state.is_done = true;
        });
        if published {
            Outcome::Completed
        } else {
            Outcome::Superseded
        }
    }

    fn fail_with(&self, sink: &mut OutputSink, message: String) -> Outcome {
        let now = Instant::now();
        let published = self.shared.update(self.generation, |state| {
            sink.flush_into(state, now);
            state.error = Some(message.clone());
        });
        if published {
            Outcome::Failed(message)
        } else {
            Outcome::Superseded
        }
    }

    fn fail(&self, message: String) -> Outcome {
        let published = self
            .shared
            .update(self.generation, |state| state.error = Some(message.clone()));
        if published {
            Outcome::Failed(message)
        } else {
            Outcome::Superseded
        }
    }

    /// Cancellation from `abort` is an outcome of its own; cancellation by a
    /// newer `start` means the session was superseded.
    fn cancelled(&self) -> Outcome {
        if self.shared.is_current(self.generation) {
            Outcome::Aborted
        } else {
            Outcome::Superseded
        }
    }

    fn replay(&self, cached: StreamState) -> Outcome {
        debug!(generation = self.generation, "serving stream from cache");
        let published = self.shared.update(self.generation, |state| {
            state.content = cached.content;
            state.think_content = cached.think_content;
            state.is_thinking = cached.is_thinking;
            state.is_done = true;
        });
        if published {
            Outcome::Completed
        } else {
            Outcome::Superseded
        }
    }

    fn settle(&mut self, outcome: &Outcome) {
        debug!(generation = self.generation, ?outcome, "stream finished");
        self.settled = true;

        let Some(status) = outcome.status() else {
            return;
        };
        let Some(state) = self.shared.settle(self.generation, status) else {
            return;
        };
        if let (Outcome::Completed, Some(cache)) = (outcome, &self.cache) {
            cache.insert(&self.request, state);
        }
    }
}

impl<T> Drop for StreamSession<T> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if self
            .shared
            .settle(self.generation, SessionStatus::Aborted)
            .is_some()
        {
            debug!(generation = self.generation, "stream dropped before settling");
        }
    }
}
