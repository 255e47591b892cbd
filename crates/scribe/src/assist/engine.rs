//! Writing-assistance operations over a completion backend
//!
//! Three operations, one engine. Error policy differs deliberately:
//! `rewrite` and `stream_analysis` fail loud, `analyze` fails open to an
//! empty suggestion list because the frontend treats "no suggestions" as
//! a normal state.

use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::assist::parse::parse_suggestions;
use crate::assist::prompts::{
    ANALYZE_PROMPT, LIVE_ANALYSIS_SYSTEM, LIVE_ANALYSIS_USER, REWRITE_PROMPT,
};
use crate::assist::types::{AssistError, Suggestion};
use crate::upstream::{ChatMessage, CompletionBackend, CompletionOptions, FragmentStream};

/// Tone applied when the request does not name one
pub const DEFAULT_TONE: &str = "neutral";

/// The writing-assistance engine
pub struct AssistEngine {
    backend: Arc<dyn CompletionBackend>,
}

impl AssistEngine {
    /// Create a new engine over the given completion backend
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Produce one rewritten version of `text` in the given tone
    ///
    /// Returns a non-empty string or an error; never an empty string
    /// silently.
    pub async fn rewrite(&self, text: &str, tone: &str) -> Result<String, AssistError> {
        let prompt = REWRITE_PROMPT
            .replace("{tone}", tone)
            .replace("{text}", text);
        let opts = CompletionOptions {
            temperature: Some(0.7),
            max_tokens: Some(250),
        };

        let response = self.backend.complete(&prompt, &opts).await?;
        let rewritten = response.trim();
        if rewritten.is_empty() {
            return Err(AssistError::EmptyResponse);
        }

        Ok(rewritten.to_string())
    }

    /// Produce structured suggestions for `text`
    ///
    /// Never fails: malformed model output and upstream failures both
    /// degrade to an empty list, logged for observability.
    pub async fn analyze(&self, text: &str, tone: &str) -> Vec<Suggestion> {
        let prompt = ANALYZE_PROMPT
            .replace("{tone}", tone)
            .replace("{text}", text);

        let raw = match self
            .backend
            .complete_json(&prompt, &CompletionOptions::default())
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Analyze upstream call failed, returning no suggestions: {e}");
                return Vec::new();
            }
        };

        let suggestions = parse_suggestions(&raw);
        debug!("Analyze produced {} suggestions", suggestions.len());
        suggestions
    }

    /// Open the live-critique stream without consuming it
    ///
    /// An `Err` here means the upstream call failed before producing
    /// anything, so the caller still has the option of a clean error
    /// response. Dropping the returned stream tears down the upstream
    /// connection.
    pub async fn open_analysis_stream(
        &self,
        text: &str,
        tone: &str,
    ) -> Result<FragmentStream, AssistError> {
        let messages = [
            ChatMessage::system(LIVE_ANALYSIS_SYSTEM),
            ChatMessage::user(
                LIVE_ANALYSIS_USER
                    .replace("{tone}", tone)
                    .replace("{text}", text),
            ),
        ];

        let stream = self
            .backend
            .stream_complete(&messages, &CompletionOptions::default())
            .await?;
        Ok(stream)
    }

    /// Stream a live plain-text critique of `text`
    ///
    /// Invokes `on_fragment` for each fragment in arrival order without
    /// buffering the full output. Upstream failures propagate: partial
    /// output may already have reached the caller, so there is no silent
    /// empty-result fallback here.
    pub async fn stream_analysis<F>(
        &self,
        text: &str,
        tone: &str,
        mut on_fragment: F,
    ) -> Result<(), AssistError>
    where
        F: FnMut(&str) + Send,
    {
        let mut stream = self.open_analysis_stream(text, tone).await?;

        let mut produced = false;
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            produced = true;
            on_fragment(&fragment);
        }

        if !produced {
            return Err(AssistError::EmptyResponse);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBackend;

    fn engine_with(backend: ScriptedBackend) -> AssistEngine {
        AssistEngine::new(Arc::new(backend))
    }

    #[tokio::test]
    async fn test_rewrite_trims_and_returns() {
        let backend = ScriptedBackend::new();
        backend.push_response("  A clearer sentence.  ");
        let engine = engine_with(backend);

        let result = engine.rewrite("a unclear sentence", "neutral").await;
        assert_eq!(result.unwrap(), "A clearer sentence.");
    }

    #[tokio::test]
    async fn test_rewrite_blank_output_is_an_error() {
        let backend = ScriptedBackend::new();
        backend.push_response("   \n  ");
        let engine = engine_with(backend);

        let result = engine.rewrite("some text", "neutral").await;
        assert!(matches!(result, Err(AssistError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_rewrite_upstream_error_propagates() {
        let backend = ScriptedBackend::new();
        backend.push_response_error("connection refused");
        let engine = engine_with(backend);

        let result = engine.rewrite("some text", "neutral").await;
        assert!(matches!(result, Err(AssistError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_analyze_happy_path() {
        let backend = ScriptedBackend::new();
        backend.push_response(
            r#"[{"id":"x5","type":"grammar","title":"t","description":"d","original":"o","suggested":"s"}]"#,
        );
        let engine = engine_with(backend);

        let suggestions = engine.analyze("some text", "neutral").await;
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].id, "x5");
    }

    #[tokio::test]
    async fn test_analyze_swallows_upstream_error() {
        let backend = ScriptedBackend::new();
        backend.push_response_error("timed out");
        let engine = engine_with(backend);

        let suggestions = engine.analyze("some text", "neutral").await;
        assert!(suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_swallows_invalid_json() {
        let backend = ScriptedBackend::new();
        backend.push_response("I could not find any issues, great job!");
        let engine = engine_with(backend);

        let suggestions = engine.analyze("some text", "neutral").await;
        assert!(suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_stream_analysis_delivers_fragments_in_order() {
        let backend = ScriptedBackend::new();
        backend.push_fragments(&["Hel", "lo", " world"]);
        let engine = engine_with(backend);

        let mut collected = Vec::new();
        engine
            .stream_analysis("some text", "neutral", |frag| {
                collected.push(frag.to_string());
            })
            .await
            .unwrap();

        assert_eq!(collected, vec!["Hel", "lo", " world"]);
        assert_eq!(collected.concat(), "Hello world");
    }

    #[tokio::test]
    async fn test_stream_analysis_empty_stream_is_an_error() {
        let backend = ScriptedBackend::new();
        backend.push_fragments(&[]);
        let engine = engine_with(backend);

        let result = engine.stream_analysis("some text", "neutral", |_| {}).await;
        assert!(matches!(result, Err(AssistError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_stream_analysis_mid_stream_error_propagates() {
        let backend = ScriptedBackend::new();
        backend.push_fragments_then_error(&["partial"], "connection reset");
        let engine = engine_with(backend);

        let mut collected = Vec::new();
        let result = engine
            .stream_analysis("some text", "neutral", |frag| {
                collected.push(frag.to_string());
            })
            .await;

        assert_eq!(collected, vec!["partial"]);
        assert!(matches!(result, Err(AssistError::Upstream(_))));
    }
}
