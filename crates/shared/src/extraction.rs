use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::models::{ExtractedStory, StoryDraft};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything that can go wrong with one extraction call. The caller shows
/// the `Display` text to the user as-is.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Could not reach the AI service: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("The AI service took too long to respond: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("AI service error ({status}): {message}")]
    Service { status: StatusCode, message: String },

    #[error("No data returned from AI service")]
    EmptyResponse,

    #[error("AI service returned stories in an unexpected format: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ExtractionError {
    fn from(e: reqwest::Error) -> Self {
        // A connect timeout is still an unreachable service
        if e.is_timeout() && !e.is_connect() {
            ExtractionError::Timeout(e)
        } else {
            ExtractionError::Transport(e)
        }
    }
}

/// The narrow seam between the app and the remote model.
#[async_trait]
pub trait StoryExtractor: Send + Sync {
    /// Split `full_text` into stories, in the order the model returns them.
    async fn extract(&self, full_text: &str) -> Result<Vec<ExtractedStory>, ExtractionError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct GeminiExtractor {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiExtractor {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        // Replies repeat the whole input, so only connecting is bounded
        // unless the caller asks for an overall limit
        let mut builder = Client::builder().connect_timeout(CONNECT_TIMEOUT);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: config.gemini_api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl StoryExtractor for GeminiExtractor {
    async fn extract(&self, full_text: &str) -> Result<Vec<ExtractedStory>, ExtractionError> {
        // One stamp per call; the index inside the response keeps ids apart
        let issued_at = chrono::Utc::now().timestamp_millis();

        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user".to_string(),
                parts: vec![Part {
                    text: Some(build_prompt(full_text)),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: story_schema(),
            },
        };

        tracing::info!(
            model = %self.model,
            chars = full_text.len(),
            "requesting story extraction"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            let message = service_error_message(status, &error_text);
            tracing::warn!(%status, %message, "story extraction rejected");
            return Err(ExtractionError::Service { status, message });
        }

        let body = response.text().await?;
        let envelope: GenerateContentResponse = serde_json::from_str(&body)?;
        let payload = envelope_text(envelope).ok_or(ExtractionError::EmptyResponse)?;

        let stories = decode_stories(&payload, issued_at)?;
        tracing::info!(count = stories.len(), "story extraction finished");
        Ok(stories)
    }
}

/// The instruction sent with every request, followed by the pasted text.
pub fn build_prompt(full_text: &str) -> String {
    format!(
        r#"Analyze the following text and extract all distinct stories, anecdotes, or narrative segments.

For each story you identify:
1. Extract the complete text (beginning, middle, and end).
2. Create a descriptive, engaging title.
3. Provide a one-sentence summary.

Text to analyze:
{}"#,
        full_text
    )
}

/// Declared output shape: an array of objects with required `title`,
/// `content` and `summary` strings.
pub fn story_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": {
                    "type": "STRING",
                    "description": "A descriptive title for the extracted story"
                },
                "content": {
                    "type": "STRING",
                    "description": "The full text content of the extracted story"
                },
                "summary": {
                    "type": "STRING",
                    "description": "A one-sentence summary of the story"
                }
            },
            "required": ["title", "content", "summary"]
        }
    })
}

/// Decode the model's JSON payload and attach ids. An empty array is a
/// valid, empty result.
pub fn decode_stories(
    payload: &str,
    issued_at_millis: i64,
) -> Result<Vec<ExtractedStory>, ExtractionError> {
    let json_text = strip_code_fence(payload);
    if json_text.is_empty() {
        return Err(ExtractionError::EmptyResponse);
    }

    let drafts: Vec<StoryDraft> = serde_json::from_str(json_text).map_err(|e| {
        tracing::warn!(error = %e, "could not decode story payload");
        ExtractionError::MalformedPayload(e)
    })?;

    Ok(assign_ids(drafts, issued_at_millis))
}

pub fn assign_ids(drafts: Vec<StoryDraft>, issued_at_millis: i64) -> Vec<ExtractedStory> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| {
            ExtractedStory::from_draft(format!("story-{}-{}", issued_at_millis, index), draft)
        })
        .collect()
}

fn envelope_text(envelope: GenerateContentResponse) -> Option<String> {
    let parts = envelope.candidates.into_iter().next()?.content?.parts;
    let text: String = parts.into_iter().filter_map(|p| p.text).collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

// Structured output should be bare JSON, but some models still fence it
fn strip_code_fence(payload: &str) -> &str {
    let trimmed = payload.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn service_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        body.to_string()
    }
}
