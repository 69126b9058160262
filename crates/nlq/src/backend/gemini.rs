// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::{CompletionBackend, http_client, post_json};
use crate::error::SynthesisError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const NAME: &str = "gemini";

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Google Gemini `generateContent` client
pub struct GeminiBackend {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiBackend {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, SynthesisError> {
        Ok(Self {
            http_client: http_client(NAME, timeout)?,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model,
            api_key,
        })
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    fn request_body(prompt: &str) -> serde_json::Value {
        json!({
            "contents": [
                {"role": "user", "parts": [{"text": prompt}]}
            ],
            "generationConfig": {"temperature": 0.0}
        })
    }

    /// Concatenate the text parts of the first candidate
    fn parse_response(body: &str) -> Result<String, SynthesisError> {
        let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
            SynthesisError::backend(NAME, format!("Failed to parse response: {e}"))
        })?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            let reason = parsed
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(SynthesisError::backend(NAME, format!("No completion: {reason}")));
        };

        Ok(candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn complete(&self, prompt: &str) -> Result<String, SynthesisError> {
        let request = self
            .http_client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key);
        let body = post_json(NAME, request, &Self::request_body(prompt)).await?;
        Self::parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> GeminiBackend {
        GeminiBackend::new("key".to_string(), "gemini-pro".to_string(), Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_url_construction() {
        assert_eq!(
            backend().generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );
        assert_eq!(
            backend().with_endpoint("http://localhost:8080/").generate_url(),
            "http://localhost:8080/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn test_request_body_carries_prompt() {
        let body = GeminiBackend::request_body("SELECT?");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "SELECT?");
    }

    #[test]
    fn test_parse_response_joins_parts() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "SELECT *"}, {"text": " FROM ipl_matches"}], "role": "model"}}
            ]
        }"#;
        assert_eq!(
            GeminiBackend::parse_response(body).unwrap(),
            "SELECT * FROM ipl_matches"
        );
    }

    #[test]
    fn test_parse_response_reports_block_reason() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let err = GeminiBackend::parse_response(body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_parse_response_rejects_garbage() {
        assert!(GeminiBackend::parse_response("<html>").is_err());
    }
}
