//! The reasoning service port and its HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::SessionError;
use crate::reply::{ReasoningReply, parse_reply};

/// Everything sent for one outer iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRequest {
    pub user_query: String,
    pub screenshot: String,
    pub dom_string: String,
    /// Conversation so far, as returned by the previous step.
    pub previous_messages: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sitemap: Option<String>,
}

/// A parsed reply plus the conversation to send back next time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReply {
    pub reply: ReasoningReply,
    pub messages: Vec<Value>,
}

#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn next_step(&self, request: &StepRequest) -> Result<StepReply, SessionError>;
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    result: String,
    #[serde(default)]
    messages: Vec<Value>,
}

/// Talks to an `/analyze` endpoint over HTTP.
pub struct HttpReasoningService {
    client: reqwest::Client,
    url: String,
}

impl HttpReasoningService {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReasoningService for HttpReasoningService {
    async fn next_step(&self, request: &StepRequest) -> Result<StepReply, SessionError> {
        debug!(
            url = %self.url,
            markup_bytes = request.dom_string.len(),
            prior_turns = request.previous_messages.len(),
            "Requesting next step"
        );
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(SessionError::Api { status, message });
        }

        let body: AnalyzeResponse = response.json().await?;
        Ok(StepReply {
            reply: parse_reply(&body.result)?,
            messages: body.messages,
        })
    }
}

#[cfg(test)]
#[path = "reasoning_tests.rs"]
mod tests;
