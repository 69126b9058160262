// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! YAML configuration with environment expansion.
//!
//! Configuration files are rendered as Tera templates before parsing, so
//! secrets can be pulled from the environment:
//!
//! ```text
//! backend:
//!   provider: gemini
//!   api_key: "{{ env(name='GEMINI_API_KEY') }}"
//! ```

use crate::backend::{GEMINI_DEFAULT_MODEL, OPENAI_DEFAULT_MODEL};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tera::{Tera, Value};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const MODEL_ENV: &str = "NLQ_MODEL";

const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    OpenAi,
    Scripted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub provider: Provider,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Fixed completion returned by the scripted provider
    #[serde(default)]
    pub scripted_response: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_read_only")]
    pub read_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NlqConfig {
    pub backend: BackendConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_read_only() -> bool {
    true
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            read_only: default_read_only(),
        }
    }
}

impl BackendConfig {
    pub fn model_or_default(&self) -> String {
        match (&self.model, self.provider) {
            (Some(model), _) => model.clone(),
            (None, Provider::OpenAi) => OPENAI_DEFAULT_MODEL.to_string(),
            (None, _) => GEMINI_DEFAULT_MODEL.to_string(),
        }
    }

    pub(crate) fn require_api_key(&self) -> Result<String, ConfigError> {
        match &self.api_key {
            Some(key) if !key.trim().is_empty() => Ok(key.clone()),
            _ => Err(ConfigError::Invalid(format!(
                "api_key is required for the {:?} provider",
                self.provider
            ))),
        }
    }
}

impl NlqConfig {
    /// Gemini configuration from `GEMINI_API_KEY` and optional `NLQ_MODEL`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup(API_KEY_ENV)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "{API_KEY_ENV} is not set and no config file was given"
                ))
            })?;

        let config = NlqConfig {
            backend: BackendConfig {
                provider: Provider::Gemini,
                model: lookup(MODEL_ENV),
                api_key: Some(api_key),
                endpoint: None,
                timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
                scripted_response: None,
            },
            execution: ExecutionConfig::default(),
        };
        validate_config(&config)?;
        Ok(config)
    }
}

/// Load, expand and validate a configuration file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<NlqConfig, ConfigError> {
    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.as_ref().display().to_string(),
        source,
    })?;

    let expanded = expand_template(&content)?;
    let config: NlqConfig = serde_yaml_ng::from_str(&expanded)?;

    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &NlqConfig) -> Result<(), ConfigError> {
    let backend = &config.backend;

    if let Some(model) = &backend.model {
        if model.trim().is_empty() {
            return Err(ConfigError::Invalid("model cannot be empty".to_string()));
        }
    }

    if backend.timeout_seconds == 0 {
        return Err(ConfigError::Invalid(
            "timeout_seconds must be greater than 0".to_string(),
        ));
    }

    match backend.provider {
        Provider::Gemini | Provider::OpenAi => {
            let _ = backend.require_api_key()?;
        }
        Provider::Scripted => {
            if backend.scripted_response.is_none() {
                return Err(ConfigError::Invalid(
                    "scripted provider requires scripted_response".to_string(),
                ));
            }
        }
    }

    Ok(())
}

/// Write a commented example configuration
pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<(), ConfigError> {
    let example = r#"# nlq configuration
#
# Values are expanded as templates before parsing. Use the env
# function (name, optional default) to read the environment.

backend:
  # gemini, openai or scripted
  provider: gemini
  model: gemini-1.5-flash
  api_key: "{{ env(name='GEMINI_API_KEY', default='') }}"
  # endpoint: https://generativelanguage.googleapis.com
  timeout_seconds: 60

execution:
  # Reject anything other than a single query
  read_only: true
"#;

    std::fs::write(&path, example).map_err(|source| ConfigError::Read {
        path: path.as_ref().display().to_string(),
        source,
    })
}

fn expand_template(content: &str) -> Result<String, ConfigError> {
    let mut tera = Tera::default();
    tera.register_function("env", env_function);

    tera.render_str(content, &tera::Context::new())
        .map_err(|e| ConfigError::Template(error_chain(&e)))
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut chain = vec![err.to_string()];
    let mut source = err.source();
    while let Some(err) = source {
        chain.push(err.to_string());
        source = err.source();
    }
    chain.join(": ")
}

/// `{{ env(name="VAR") }}` or `{{ env(name="VAR", default="x") }}`
fn env_function(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let var_name = args
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| tera::Error::msg("env function requires 'name' parameter"))?;
    let default_value = args.get("default").and_then(|v| v.as_str());

    match std::env::var(var_name) {
        Ok(value) => Ok(Value::String(value)),
        Err(std::env::VarError::NotPresent) => default_value
            .map(|d| Value::String(d.to_string()))
            .ok_or_else(|| {
                tera::Error::msg(format!(
                    "Environment variable '{var_name}' not set and no default provided"
                ))
            }),
        Err(e) => Err(tera::Error::msg(format!(
            "Failed to read environment variable '{var_name}': {e}"
        ))),
    }
}
