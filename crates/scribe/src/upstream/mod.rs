//! Upstream model provider integration
//!
//! The single point of contact with the external LLM service. The
//! `CompletionBackend` trait is the capability seam: operations depend on
//! it, and tests substitute a deterministic scripted fake without any
//! network access.

mod client;
mod types;

pub use client::OpenAiClient;
pub use types::{ChatMessage, CompletionOptions, FragmentStream, UpstreamError};

use async_trait::async_trait;

/// Capability interface over the model provider
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Single request/response completion; blocks until the full
    /// response is available.
    async fn complete(
        &self,
        prompt: &str,
        opts: &CompletionOptions,
    ) -> Result<String, UpstreamError>;

    /// Same transport as `complete`, for prompts that instruct the model
    /// to emit a strict JSON array. Parsing and validation are the
    /// caller's responsibility, not this component's.
    async fn complete_json(
        &self,
        prompt: &str,
        opts: &CompletionOptions,
    ) -> Result<String, UpstreamError>;

    /// Open a streaming completion and return a lazy sequence of text
    /// fragments. The provider's response status is checked before the
    /// stream is handed back, so an `Err` here means nothing has been
    /// produced yet.
    async fn stream_complete(
        &self,
        messages: &[ChatMessage],
        opts: &CompletionOptions,
    ) -> Result<FragmentStream, UpstreamError>;
}
