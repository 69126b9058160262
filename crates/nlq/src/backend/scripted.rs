// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::CompletionBackend;
use crate::error::SynthesisError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

const NAME: &str = "scripted";

/// In-process backend that replays canned completions
///
/// Queued responses are consumed in order; once the queue is empty the
/// fallback (if any) is returned. Every prompt is recorded.
#[derive(Default)]
pub struct ScriptedBackend {
    queue: Mutex<VecDeque<Result<String, String>>>,
    fallback: Option<String>,
    prompts: Mutex<Vec<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every prompt with the same completion
    pub fn always(response: impl Into<String>) -> Self {
        Self {
            fallback: Some(response.into()),
            ..Self::default()
        }
    }

    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.queue).push_back(Ok(response.into()));
    }

    /// Queue a backend failure, e.g. to simulate an outage
    pub fn push_failure(&self, message: impl Into<String>) {
        lock(&self.queue).push_back(Err(message.into()));
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn complete(&self, prompt: &str) -> Result<String, SynthesisError> {
        lock(&self.prompts).push(prompt.to_string());

        match lock(&self.queue).pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(SynthesisError::backend(NAME, message)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| SynthesisError::backend(NAME, "no scripted response left")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_then_fallback() {
        let backend = ScriptedBackend::always("SELECT 2");
        backend.push_response("SELECT 1");

        let first = tokio_test::block_on(backend.complete("p1")).unwrap();
        let second = tokio_test::block_on(backend.complete("p2")).unwrap();
        assert_eq!(first, "SELECT 1");
        assert_eq!(second, "SELECT 2");
        assert_eq!(backend.prompts(), vec!["p1".to_string(), "p2".to_string()]);
    }

    #[test]
    fn test_exhausted_without_fallback() {
        let backend = ScriptedBackend::new();
        let err = tokio_test::block_on(backend.complete("p")).unwrap_err();
        assert!(matches!(err, SynthesisError::Backend { .. }));
    }

    #[test]
    fn test_scripted_failure() {
        let backend = ScriptedBackend::always("SELECT 1");
        backend.push_failure("service unavailable");
        let err = tokio_test::block_on(backend.complete("p")).unwrap_err();
        assert!(err.to_string().contains("service unavailable"));
    }
}
