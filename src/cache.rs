//! Cache of completed stream results.
//!
//! Owned by whoever builds the consumer and attached with
//! [`StreamConsumer::with_cache`](crate::consumer::StreamConsumer::with_cache).
//! Clones share storage, so one cache can back several consumers.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::model::{StreamRequest, StreamState};

/// Default number of cached responses.
pub const DEFAULT_CAPACITY: usize = 64;

/// Bounded map from request to final state, evicting the oldest entry first.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    entries: Arc<Mutex<IndexMap<String, StreamState>>>,
    capacity: usize,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ResponseCache {
    /// Create a cache holding at most `capacity` responses.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(IndexMap::new())),
            capacity,
        }
    }

    /// Cache key: method, URL and the body serialized with sorted keys.
    fn key(request: &StreamRequest) -> String {
        format!("{} {} {}", request.method, request.url, request.body)
    }

    pub fn get(&self, request: &StreamRequest) -> Option<StreamState> {
        self.entries.lock().get(&Self::key(request)).cloned()
    }

    /// Store the final state of a request, replacing any previous entry.
    pub fn insert(&self, request: &StreamRequest, state: StreamState) {
        if self.capacity == 0 {
            return;
        }

        let mut entries = self.entries.lock();
        let key = Self::key(request);
        entries.shift_remove(&key);
        while entries.len() >= self.capacity {
            entries.shift_remove_index(0);
        }
        entries.insert(key, state);
    }

    pub fn remove(&self, request: &StreamRequest) -> Option<StreamState> {
        self.entries.lock().shift_remove(&Self::key(request))
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
