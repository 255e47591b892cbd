//! Test utilities for scribe - scripted completion backend
//!
//! Provides a deterministic `CompletionBackend` fake so operation and
//! relay tests run without network access: responses and stream
//! fragments are scripted up front, and every upstream call is counted.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::upstream::{
    ChatMessage, CompletionBackend, CompletionOptions, FragmentStream, UpstreamError,
};

type StreamScript = Result<Vec<Result<String, String>>, String>;

/// Scripted backend: pops one queued response per call, in order.
///
/// An exhausted queue yields a network error, so a test that forgets to
/// script a response fails visibly rather than hanging.
#[derive(Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<String, String>>>,
    streams: Mutex<VecDeque<StreamScript>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful completion response
    pub fn push_response(&self, text: &str) {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(Ok(text.to_string()));
    }

    /// Queue a failing completion call
    pub fn push_response_error(&self, message: &str) {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(Err(message.to_string()));
    }

    /// Queue a stream that yields the given fragments then completes
    pub fn push_fragments(&self, fragments: &[&str]) {
        let items = fragments.iter().map(|f| Ok(f.to_string())).collect();
        self.streams
            .lock()
            .expect("streams lock")
            .push_back(Ok(items));
    }

    /// Queue a stream that yields fragments then fails mid-flight
    pub fn push_fragments_then_error(&self, fragments: &[&str], message: &str) {
        let mut items: Vec<Result<String, String>> =
            fragments.iter().map(|f| Ok(f.to_string())).collect();
        items.push(Err(message.to_string()));
        self.streams
            .lock()
            .expect("streams lock")
            .push_back(Ok(items));
    }

    /// Queue a stream that fails to open at all
    pub fn push_stream_error(&self, message: &str) {
        self.streams
            .lock()
            .expect("streams lock")
            .push_back(Err(message.to_string()));
    }

    /// Number of upstream calls made so far, across all three methods
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn pop_response(&self) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.lock().expect("responses lock").pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(UpstreamError::Network(message)),
            None => Err(UpstreamError::Network("no scripted response".to_string())),
        }
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(
        &self,
        _prompt: &str,
        _opts: &CompletionOptions,
    ) -> Result<String, UpstreamError> {
        self.pop_response()
    }

    async fn complete_json(
        &self,
        _prompt: &str,
        _opts: &CompletionOptions,
    ) -> Result<String, UpstreamError> {
        self.pop_response()
    }

    async fn stream_complete(
        &self,
        _messages: &[ChatMessage],
        _opts: &CompletionOptions,
    ) -> Result<FragmentStream, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.streams.lock().expect("streams lock").pop_front() {
            Some(Ok(items)) => {
                let iter = items
                    .into_iter()
                    .map(|item| item.map_err(UpstreamError::Network));
                Ok(Box::pin(futures::stream::iter(iter)))
            }
            Some(Err(message)) => Err(UpstreamError::Network(message)),
            None => Err(UpstreamError::Network("no scripted stream".to_string())),
        }
    }
}
