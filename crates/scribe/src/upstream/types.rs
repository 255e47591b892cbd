//! Upstream request/response types and errors
//!
//! Defines the chat message and option types shared by the real client
//! and test fakes, plus the error type every upstream failure maps into.

use futures::stream::Stream;
use std::pin::Pin;

/// One message in a chat-style completion request
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    /// Build a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Build a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Per-call overrides for a completion request
///
/// Unset fields fall back to the configured defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Errors talking to the model provider
///
/// Carries the original message; never retried at this layer. Retry
/// policy, if any, belongs to the caller.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The provider answered with a non-success status
    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure (connect, timeout, mid-stream drop)
    #[error("Network error: {0}")]
    Network(String),

    /// The provider's payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

/// A lazy, forward-only, finite sequence of streamed text fragments
///
/// Ends when the provider signals completion. Not restartable; issue a
/// new call to retry.
pub type FragmentStream =
    Pin<Box<dyn Stream<Item = std::result::Result<String, UpstreamError>> + Send>>;
