//! Suggestion types and operation errors
//!
//! The wire shape of `Suggestion` is fixed by the frontend contract:
//! the kind is serialized under the `type` key, and the snippet fields
//! are named `original` and `suggested`.

use serde::{Deserialize, Serialize};

use crate::upstream::UpstreamError;

/// Category of a writing suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Grammar,
    Clarity,
    Tone,
    Improvement,
}

impl SuggestionKind {
    /// Parse a raw kind string; `None` for anything outside the four
    /// valid kinds.
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "grammar" => Some(Self::Grammar),
            "clarity" => Some(Self::Clarity),
            "tone" => Some(Self::Tone),
            "improvement" => Some(Self::Improvement),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grammar => "grammar",
            Self::Clarity => "clarity",
            Self::Tone => "tone",
            Self::Improvement => "improvement",
        }
    }
}

/// One structured writing suggestion
///
/// Produced fresh per analyze call, never persisted. The `id` is unique
/// within a single response only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub title: String,
    pub description: String,
    pub original: String,
    pub suggested: String,
}

/// Errors surfaced by the fail-loud operations
#[derive(Debug, thiserror::Error)]
pub enum AssistError {
    /// The upstream call failed
    #[error("upstream request failed: {0}")]
    Upstream(#[from] UpstreamError),

    /// The model returned blank output where text was required
    #[error("model returned empty output")]
    EmptyResponse,
}
