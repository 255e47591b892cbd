//! Prompts for the writing-assistance operations
//!
//! Each prompt carries `{placeholder}` markers substituted by the engine
//! before the upstream call.

/// Rewrite prompt: one rewritten version of the text, nothing else
///
/// Placeholders: {tone} - requested tone; {text} - the user's text
pub const REWRITE_PROMPT: &str = r#"Rewrite the following text to be clearer, more concise, and more engaging, in a {tone} tone.

Return only the rewritten text. Do not add commentary, preamble, or quotation marks.

Text:
{text}"#;

/// Analyze prompt: a flat JSON array of suggestion objects
///
/// Placeholders: {tone} - requested tone; {text} - the user's text
pub const ANALYZE_PROMPT: &str = r#"Review the following text and identify specific writing issues, considering a {tone} tone.

For each issue, provide:
1. id: a short unique identifier within this response
2. type: one of "grammar", "clarity", "tone", "improvement"
3. title: a short label for the issue
4. description: one sentence explaining the issue
5. original: the problematic snippet from the text
6. suggested: the improved replacement snippet

Text:
{text}

Respond with a flat JSON array in this exact format:
[
  {
    "id": "1",
    "type": "grammar",
    "title": "Subject-verb agreement",
    "description": "The verb does not agree with its subject.",
    "original": "the results was",
    "suggested": "the results were"
  }
]

Only include the flat JSON array. Do not nest objects, wrap the output in markdown code fences, or add any other text."#;

/// System instruction for the live streaming analysis
pub const LIVE_ANALYSIS_SYSTEM: &str = "You are a concise writing coach. Give short, plain-text, bullet-style feedback on the user's text as it is written. Keep each point to one short sentence. Do not emit JSON, markdown code fences, or headings.";

/// User message for the live streaming analysis
///
/// Placeholders: {tone} - requested tone; {text} - the user's text
pub const LIVE_ANALYSIS_USER: &str = r#"Tone: {tone}

{text}"#;
