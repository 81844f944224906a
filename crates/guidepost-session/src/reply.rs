//! Parsing the reasoning service's free-text reply.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

static RESPONSE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<response>\s*(.*?)\s*</response>").expect("response pattern is valid")
});

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("fence pattern is valid"));

const FALLBACK_NARRATION: &str = "I'll help you with that.";

/// One step of guidance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningReply {
    #[serde(default)]
    pub reasoning: String,
    /// Target identifiers in order. Only the first is acted on.
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub narration: String,
    #[serde(default)]
    pub task_accomplished: bool,
}

impl ReasoningReply {
    pub fn next_action(&self) -> Option<&str> {
        self.actions.first().map(String::as_str).filter(|a| !a.is_empty())
    }

    /// What to tell the user about this step.
    pub fn message(&self) -> &str {
        [self.narration.as_str(), self.reasoning.as_str()]
            .into_iter()
            .find(|m| !m.trim().is_empty())
            .unwrap_or(FALLBACK_NARRATION)
    }
}

/// Pull a [`ReasoningReply`] out of `raw`.
///
/// A `<response>` block wins; otherwise the first balanced `{...}` object
/// is used. Markdown JSON fences are stripped either way.
pub fn parse_reply(raw: &str) -> Result<ReasoningReply, SessionError> {
    let candidate = match RESPONSE_BLOCK.captures(raw) {
        Some(c) => c.get(1).map(|m| m.as_str()).unwrap_or_default().to_string(),
        None => first_object(raw)
            .ok_or_else(|| SessionError::MalformedReply("no JSON object in reply".to_string()))?
            .to_string(),
    };
    let cleaned = JSON_FENCE.replace_all(&candidate, "$1");
    serde_json::from_str(cleaned.trim()).map_err(|e| SessionError::MalformedReply(e.to_string()))
}

/// The first brace-balanced object in `text`, skipping braces in strings.
fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
#[path = "reply_tests.rs"]
mod tests;
