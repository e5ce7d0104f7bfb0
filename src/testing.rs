//! In-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::channel::mpsc;
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use crate::client::{ClientError, Transport, TransportResponse};
use crate::model::StreamRequest;

pub(crate) type ChunkSender = mpsc::UnboundedSender<Result<Bytes, ClientError>>;

enum Script {
    Chunks(Vec<Bytes>),
    Status(StatusCode),
    Channel(mpsc::UnboundedReceiver<Result<Bytes, ClientError>>),
    OpenError(String),
    Hang,
}

/// Answers each `open` with the next queued script.
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    opened: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_chunks<S: AsRef<str>>(&self, chunks: &[S]) {
        let chunks = chunks
            .iter()
            .map(|c| Bytes::copy_from_slice(c.as_ref().as_bytes()))
            .collect();
        self.scripts.lock().push_back(Script::Chunks(chunks));
    }

    pub(crate) fn push_bytes(&self, chunks: Vec<Vec<u8>>) {
        let chunks = chunks.into_iter().map(Bytes::from).collect();
        self.scripts.lock().push_back(Script::Chunks(chunks));
    }

    pub(crate) fn push_status(&self, status: StatusCode) {
        self.scripts.lock().push_back(Script::Status(status));
    }

    /// Queue a body fed by the returned sender; dropping it ends the body.
    pub(crate) fn push_channel(&self) -> ChunkSender {
        let (tx, rx) = mpsc::unbounded();
        self.scripts.lock().push_back(Script::Channel(rx));
        tx
    }

    pub(crate) fn push_open_error(&self, message: &str) {
        self.scripts
            .lock()
            .push_back(Script::OpenError(message.to_string()));
    }

    /// Queue an `open` that only returns once cancelled.
    pub(crate) fn push_hang(&self) {
        self.scripts.lock().push_back(Script::Hang);
    }

    pub(crate) fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(
        &self,
        _request: &StreamRequest,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse, ClientError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().pop_front();

        match script {
            Some(Script::Chunks(chunks)) => Ok(TransportResponse::new(
                StatusCode::OK,
                stream::iter(chunks.into_iter().map(Ok)).boxed(),
            )),
            Some(Script::Status(status)) => {
                Ok(TransportResponse::new(status, stream::empty().boxed()))
            }
            Some(Script::Channel(rx)) => Ok(TransportResponse::new(StatusCode::OK, rx.boxed())),
            Some(Script::OpenError(message)) => Err(ClientError::Transport(message)),
            Some(Script::Hang) => {
                cancel.cancelled().await;
                Err(ClientError::StreamCancelled)
            }
            None => Err(ClientError::Transport("no scripted response".to_string())),
        }
    }
}
