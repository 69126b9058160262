// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::{CompletionBackend, http_client, post_json};
use crate::error::SynthesisError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const NAME: &str = "openai";

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI-compatible chat completions client
pub struct OpenAiBackend {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiBackend {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, SynthesisError> {
        Ok(Self {
            http_client: http_client(NAME, timeout)?,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model,
            api_key,
        })
    }

    /// Point at a compatible server (local gateways, proxies)
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.0
        })
    }

    fn parse_response(body: &str) -> Result<String, SynthesisError> {
        let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
            SynthesisError::backend(NAME, format!("Failed to parse response: {e}"))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SynthesisError::backend(NAME, "No choices in response"))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn complete(&self, prompt: &str) -> Result<String, SynthesisError> {
        let request = self
            .http_client
            .post(self.completions_url())
            .bearer_auth(&self.api_key);
        let body = post_json(NAME, request, &self.request_body(prompt)).await?;
        Self::parse_response(&body)
    }
}
