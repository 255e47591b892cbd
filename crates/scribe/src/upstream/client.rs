//! OpenAI-compatible completion client
//!
//! Implements the `CompletionBackend` trait over HTTP. Supports any
//! OpenAI-compatible endpoint with configurable URL, model, and API key
//! via environment variable. The credential is read once at construction;
//! its absence is a fatal configuration error, not a per-request error.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::env;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::UpstreamConfig;
use crate::error::ScribeError;
use crate::upstream::types::{ChatMessage, CompletionOptions, FragmentStream, UpstreamError};
use crate::upstream::CompletionBackend;

/// Client for OpenAI-compatible chat completion APIs
#[derive(Debug)]
pub struct OpenAiClient {
    client: Client,
    config: UpstreamConfig,
    api_key: String,
}

/// OpenAI-compatible chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// One SSE chunk of a streamed completion
#[derive(Debug, Deserialize)]
struct StreamResponse {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a new client with the given configuration
    ///
    /// Reads the API key from the environment variable named in
    /// `config.api_key_env`. Returns an error if the variable is not set.
    pub fn new(config: &UpstreamConfig) -> Result<Self, ScribeError> {
        let api_key = env::var(&config.api_key_env).map_err(|_| {
            ScribeError::Config(format!("API key env var '{}' not set", config.api_key_env))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScribeError::Config(format!("Failed to create HTTP client: {e}")))?;

        info!(
            "OpenAiClient initialized with model: {}, api_url: {}",
            config.model, config.api_url
        );

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_url.trim_end_matches('/')
        )
    }

    async fn send_chat(
        &self,
        messages: &[ChatMessage],
        opts: &CompletionOptions,
        stream: bool,
    ) -> Result<reqwest::Response, UpstreamError> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: opts.temperature.unwrap_or(self.config.temperature),
            max_tokens: opts.max_tokens.unwrap_or(self.config.max_tokens),
            stream,
        };

        let url = self.completions_url();
        debug!("Calling upstream API at: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Network(format!("Request timed out: {e}"))
                } else if e.is_connect() {
                    UpstreamError::Network(format!("Failed to connect to upstream: {e}"))
                } else {
                    UpstreamError::Network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response)
    }

    async fn complete_inner(
        &self,
        prompt: &str,
        opts: &CompletionOptions,
    ) -> Result<String, UpstreamError> {
        let messages = [ChatMessage::user(prompt)];
        let response = self.send_chat(&messages, opts, false).await?;

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| UpstreamError::Decode("Empty response".to_string()))
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    async fn complete(
        &self,
        prompt: &str,
        opts: &CompletionOptions,
    ) -> Result<String, UpstreamError> {
        self.complete_inner(prompt, opts).await
    }

    async fn complete_json(
        &self,
        prompt: &str,
        opts: &CompletionOptions,
    ) -> Result<String, UpstreamError> {
        self.complete_inner(prompt, opts).await
    }

    async fn stream_complete(
        &self,
        messages: &[ChatMessage],
        opts: &CompletionOptions,
    ) -> Result<FragmentStream, UpstreamError> {
        let response = self.send_chat(messages, opts, true).await?;
        let bytes = Box::pin(response.bytes_stream());
        Ok(Box::pin(decode_sse(bytes)))
    }
}

struct SseState<S> {
    inner: S,
    buffer: String,
    pending: VecDeque<String>,
    done: bool,
}

/// Decode an SSE byte stream into content fragments
///
/// Frames are `data: {json}` lines; `data: [DONE]` terminates the
/// sequence. Lines may be split across chunk boundaries, so incomplete
/// tail bytes stay buffered until the next chunk arrives. Undecodable
/// data lines are skipped rather than surfaced.
fn decode_sse<S>(inner: S) -> impl futures::stream::Stream<Item = Result<String, UpstreamError>>
where
    S: futures::stream::Stream<Item = reqwest::Result<bytes::Bytes>> + Unpin + Send + 'static,
{
    let state = SseState {
        inner,
        buffer: String::new(),
        pending: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(fragment) = st.pending.pop_front() {
                return Some((Ok(fragment), st));
            }
            if st.done {
                return None;
            }

            match st.inner.next().await {
                None => {
                    st.done = true;
                }
                Some(Err(e)) => {
                    st.done = true;
                    return Some((Err(UpstreamError::Network(e.to_string())), st));
                }
                Some(Ok(chunk)) => {
                    st.buffer.push_str(&String::from_utf8_lossy(&chunk));

                    while let Some(pos) = st.buffer.find('\n') {
                        let line: String = st.buffer.drain(..=pos).collect();
                        let line = line.trim();

                        if let Some(data) = line.strip_prefix("data: ") {
                            if data == "[DONE]" {
                                st.done = true;
                                break;
                            }
                            if let Some(delta) = parse_stream_delta(data) {
                                if !delta.is_empty() {
                                    st.pending.push_back(delta);
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

fn parse_stream_delta(data: &str) -> Option<String> {
    let parsed: StreamResponse = serde_json::from_str(data).ok()?;
    parsed.choices.into_iter().next()?.delta.content
}
