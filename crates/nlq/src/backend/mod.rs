// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Text-generation backends.
//!
//! A backend takes one rendered prompt and returns one completion. Calls are
//! made exactly once; any failure is reported to the caller without retry.

mod gemini;
mod openai;
mod scripted;

pub use gemini::{DEFAULT_MODEL as GEMINI_DEFAULT_MODEL, GeminiBackend};
pub use openai::{DEFAULT_MODEL as OPENAI_DEFAULT_MODEL, OpenAiBackend};
pub use scripted::ScriptedBackend;

use crate::config::{BackendConfig, Provider};
use crate::error::{ConfigError, SynthesisError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// One request, one text completion
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Short name used in logs and error messages
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, SynthesisError>;
}

/// Build the backend selected by configuration
pub fn build_backend(config: &BackendConfig) -> Result<Arc<dyn CompletionBackend>, ConfigError> {
    let timeout = Duration::from_secs(config.timeout_seconds);

    match config.provider {
        Provider::Gemini => {
            let api_key = config.require_api_key()?;
            let mut backend = GeminiBackend::new(api_key, config.model_or_default(), timeout)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            if let Some(endpoint) = &config.endpoint {
                backend = backend.with_endpoint(endpoint);
            }
            Ok(Arc::new(backend))
        }
        Provider::OpenAi => {
            let api_key = config.require_api_key()?;
            let mut backend = OpenAiBackend::new(api_key, config.model_or_default(), timeout)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            if let Some(endpoint) = &config.endpoint {
                backend = backend.with_endpoint(endpoint);
            }
            Ok(Arc::new(backend))
        }
        Provider::Scripted => {
            let response = config.scripted_response.clone().ok_or_else(|| {
                ConfigError::Invalid("scripted provider requires scripted_response".to_string())
            })?;
            Ok(Arc::new(ScriptedBackend::always(response)))
        }
    }
}

pub(crate) fn http_client(backend: &str, timeout: Duration) -> Result<reqwest::Client, SynthesisError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SynthesisError::backend(backend, format!("Failed to create HTTP client: {e}")))
}

/// POST a JSON body and return the response text, failing on non-2xx status
pub(crate) async fn post_json(
    backend: &str,
    request: reqwest::RequestBuilder,
    body: &serde_json::Value,
) -> Result<String, SynthesisError> {
    let payload = serde_json::to_string(body)
        .map_err(|e| SynthesisError::backend(backend, format!("Failed to encode request: {e}")))?;

    let response = request
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(payload)
        .send()
        .await
        .map_err(|e| SynthesisError::backend(backend, format!("Failed to send request: {e}")))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| SynthesisError::backend(backend, format!("Failed to read response body: {e}")))?;

    if !status.is_success() {
        return Err(SynthesisError::backend(
            backend,
            format!("HTTP {status}: {text}"),
        ));
    }

    Ok(text)
}
