// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::backend::CompletionBackend;
use crate::error::SynthesisError;
use crate::prompt::render_prompt;
use crate::query::GeneratedQuery;
use crate::schema::SchemaDescription;
use diagnostics::{debug, info};
use std::sync::Arc;

/// Turns questions into SQL text by way of one backend call each
#[derive(Clone)]
pub struct Synthesizer {
    backend: Arc<dyn CompletionBackend>,
}

impl Synthesizer {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Build the prompt, ask the backend once, and clean up what comes back
    ///
    /// The returned text is not validated against the schema; hallucinated
    /// names surface later as engine errors.
    pub async fn synthesize(
        &self,
        schema: &SchemaDescription,
        question: &str,
    ) -> Result<GeneratedQuery, SynthesisError> {
        if question.trim().is_empty() {
            return Err(SynthesisError::EmptyQuestion);
        }

        let prompt = render_prompt(schema, question)?;
        info!(
            "Requesting SQL from {backend} ({prompt_len} byte prompt)",
            backend: self.backend.name(),
            prompt_len: prompt.len()
        );

        let raw = self.backend.complete(&prompt).await?;
        let sql = clean_completion(&raw);
        if sql.is_empty() {
            return Err(SynthesisError::EmptyCompletion);
        }

        debug!("Generated SQL: {sql}", sql: sql.as_str());
        Ok(GeneratedQuery::new(sql))
    }
}

/// Strip markdown code fences and surrounding whitespace
pub fn clean_completion(raw: &str) -> String {
    raw.trim()
        .replace("```sql", "")
        .replace("```SQL", "")
        .replace("```", "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ScriptedBackend;
    use crate::schema::ColumnSchema;

    fn schema() -> SchemaDescription {
        SchemaDescription::new(
            "ipl_matches",
            vec![ColumnSchema {
                name: "target_runs".to_string(),
                data_type: "BIGINT".to_string(),
            }],
            "",
        )
    }

    #[test]
    fn test_clean_completion() {
        assert_eq!(clean_completion("```sql\nSELECT 1;\n```"), "SELECT 1;");
        assert_eq!(clean_completion("```SQL\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(clean_completion("```\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(clean_completion("  SELECT 1  \n"), "SELECT 1");
        assert_eq!(clean_completion("```sql\n```"), "");
    }

    #[test]
    fn test_synthesize_strips_fences() {
        let backend = Arc::new(ScriptedBackend::always(
            "```sql\nSELECT * FROM ipl_matches WHERE target_runs > 200\n```",
        ));
        let synth = Synthesizer::new(backend.clone());

        let query = tokio_test::block_on(synth.synthesize(&schema(), "Targets over 200?")).unwrap();
        assert_eq!(
            query.sql(),
            "SELECT * FROM ipl_matches WHERE target_runs > 200"
        );

        let prompts = backend.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Targets over 200?"));
        assert!(prompts[0].contains("target_runs (BIGINT)"));
    }

    #[test]
    fn test_empty_question_skips_backend() {
        let backend = Arc::new(ScriptedBackend::always("SELECT 1"));
        let synth = Synthesizer::new(backend.clone());

        let err = tokio_test::block_on(synth.synthesize(&schema(), "   ")).unwrap_err();
        assert!(matches!(err, SynthesisError::EmptyQuestion));
        assert!(backend.prompts().is_empty());
    }

    #[test]
    fn test_empty_completion() {
        let synth = Synthesizer::new(Arc::new(ScriptedBackend::always("```sql\n\n```")));
        let err = tokio_test::block_on(synth.synthesize(&schema(), "anything")).unwrap_err();
        assert!(matches!(err, SynthesisError::EmptyCompletion));
    }

    #[test]
    fn test_backend_failure_is_not_retried() {
        let backend = Arc::new(ScriptedBackend::always("SELECT 1"));
        backend.push_failure("quota exceeded");
        let synth = Synthesizer::new(backend.clone());

        let err = tokio_test::block_on(synth.synthesize(&schema(), "anything")).unwrap_err();
        assert!(matches!(err, SynthesisError::Backend { .. }));
        assert_eq!(backend.prompts().len(), 1);
    }
}
