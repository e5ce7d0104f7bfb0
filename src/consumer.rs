//! Consumer-facing handle owning the published stream state.
//!
//! A [`StreamConsumer`] runs at most one logical stream at a time. Every
//! [`start`](StreamConsumer::start) bumps the consumer's generation and
//! cancels the previous session's token; a session only publishes while its
//! generation is still the current one, so a superseded stream can never
//! write into the state of its successor.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::ResponseCache;
use crate::client::Transport;
use crate::model::{Generation, Outcome, SessionStatus, StreamRequest, StreamState};
use crate::options::StreamOptions;
use crate::session::StreamSession;

#[derive(Debug, Default)]
struct Control {
    generation: Generation,
    cancel: Option<CancellationToken>,
}

/// State and generation bookkeeping shared between a consumer and its
/// sessions.
#[derive(Debug)]
pub(crate) struct Shared {
    control: Mutex<Control>,
    state: watch::Sender<StreamState>,
}

impl Shared {
    fn new() -> Self {
        Self {
            control: Mutex::new(Control::default()),
            state: watch::Sender::new(StreamState::default()),
        }
    }

    pub(crate) fn is_current(&self, generation: Generation) -> bool {
        self.control.lock().generation == generation
    }

    /// Apply `f` to the state if `generation` is still current.
    ///
    /// The control lock is held across the check and the mutation, so a
    /// concurrent `start` either happens before (and the update is dropped)
    /// or after (and resets what was written).
    pub(crate) fn update(&self, generation: Generation, f: impl FnOnce(&mut StreamState)) -> bool {
        let control = self.control.lock();
        if control.generation != generation {
            return false;
        }
        self.state.send_modify(f);
        true
    }

    /// Record the terminal outcome of `generation` and release its token.
    ///
    /// Returns the final state when it was published.
    pub(crate) fn settle(&self, generation: Generation, status: SessionStatus) -> Option<StreamState> {
        let mut control = self.control.lock();
        if control.generation != generation {
            return None;
        }
        control.cancel = None;

        let mut settled = None;
        self.state.send_modify(|state| {
            state.is_loading = false;
            state.status = status;
            settled = Some(state.clone());
        });
        settled
    }
}

/// Runs streams against a transport and publishes their accumulated output.
///
/// # Example
/// ```no_run
/// use serde_json::json;
/// use thinkstream::consumer::StreamConsumer;
/// use thinkstream::http::HttpClient;
/// use thinkstream::model::StreamRequest;
/// use thinkstream::options::TransportOptions;
///
/// # async fn run() -> Result<(), thinkstream::ClientError> {
/// let consumer = StreamConsumer::new(HttpClient::new(TransportOptions::default())?);
/// let request = StreamRequest::new("http://localhost:8000/ai/stream", json!({"prompt": "hi"}));
///
/// let outcome = consumer.stream(request).await;
/// let state = consumer.state();
/// println!("{:?}: {}", outcome, state.content);
/// # Ok(())
/// # }
/// ```
pub struct StreamConsumer<T> {
    transport: Arc<T>,
    shared: Arc<Shared>,
    options: StreamOptions,
    cache: Option<ResponseCache>,
}

impl<T> Clone for StreamConsumer<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            shared: Arc::clone(&self.shared),
            options: self.options,
            cache: self.cache.clone(),
        }
    }
}

impl<T: Transport + 'static> StreamConsumer<T> {
    /// Create a consumer with default stream options.
    pub fn new(transport: T) -> Self {
        Self::with_options(transport, StreamOptions::default())
    }

    pub fn with_options(transport: T, options: StreamOptions) -> Self {
        Self {
            transport: Arc::new(transport),
            shared: Arc::new(Shared::new()),
            options,
            cache: None,
        }
    }

    /// Serve repeated requests from `cache` and store completed results in it.
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Begin a new stream, superseding any running one.
    ///
    /// The previous session is cancelled, the state is reset and marked as
    /// loading before this returns. Nothing is sent until the returned
    /// session is run.
    pub fn start(&self, request: StreamRequest) -> StreamSession<T> {
        let cancel = CancellationToken::new();
        let generation = {
            let mut control = self.shared.control.lock();
            if let Some(previous) = control.cancel.take() {
                previous.cancel();
            }
            control.generation += 1;
            control.cancel = Some(cancel.clone());
            self.shared.state.send_replace(StreamState {
                is_loading: true,
                status: SessionStatus::Active,
                ..Default::default()
            });
            control.generation
        };

        debug!(generation, url = %request.url, "starting stream");

        StreamSession::new(
            generation,
            request,
            cancel,
            Arc::clone(&self.transport),
            Arc::clone(&self.shared),
            self.options,
            self.cache.clone(),
        )
    }

    /// Start a stream and drive it to completion.
    pub async fn stream(&self, request: StreamRequest) -> Outcome {
        self.start(request).run().await
    }

    /// Start a stream and drive it on the tokio runtime.
    pub fn spawn(&self, request: StreamRequest) -> JoinHandle<Outcome> {
        tokio::spawn(self.start(request).run())
    }
}

impl<T> StreamConsumer<T> {
    /// Cancel the running stream, if any. Safe to call repeatedly.
    ///
    /// The session ends silently: no error is recorded and `is_done` stays
    /// false.
    pub fn abort(&self) {
        let mut control = self.shared.control.lock();
        if let Some(cancel) = control.cancel.take() {
            debug!(generation = control.generation, "aborting stream");
            cancel.cancel();
        }
    }

    /// Restore the initial state. The generation is left untouched.
    pub fn reset(&self) {
        let _control = self.shared.control.lock();
        self.shared.state.send_replace(StreamState::default());
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> StreamState {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<StreamState> {
        self.shared.state.subscribe()
    }

    /// The most recently allocated generation; zero before the first stream.
    pub fn generation(&self) -> Generation {
        self.shared.control.lock().generation
    }

    /// Whether a stream is running and can be aborted.
    pub fn is_active(&self) -> bool {
        self.shared.control.lock().cancel.is_some()
    }
}
