use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::services::generation::{ChatTurn, GenerationError, Generator, Role};

/// Gemini `generateContent` REST client
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::unavailable(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

fn build_request(turns: &[ChatTurn]) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: turns
            .iter()
            .map(|turn| Content {
                role: wire_role(turn.role),
                parts: vec![Part { text: &turn.text }],
            })
            .collect(),
    }
}

/// Joins the text parts of the first candidate.
fn response_text(response: GenerateResponse) -> Result<String, GenerationError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(GenerationError::unavailable(format!("response blocked: {}", reason)));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(GenerationError::unavailable("candidate carried no text"));
    }
    Ok(text)
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, turns: &[ChatTurn]) -> Result<String, GenerationError> {
        tracing::debug!("Calling generateContent with {} turns", turns.len());

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(turns))
            .send()
            .await
            .map_err(|e| GenerationError::unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::unavailable(format!("{}: {}", status, body)));
        }

        let envelope: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::unavailable(format!("malformed envelope: {}", e)))?;

        response_text(envelope)
    }
}
