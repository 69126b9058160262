// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::Result;
use crate::query::GeneratedQuery;
use crate::result::ResultSet;
use crate::session::Session;
use crate::synth::Synthesizer;

/// A generated statement together with what it returned
#[derive(Debug)]
pub struct Answer {
    pub query: GeneratedQuery,
    pub result: ResultSet,
}

/// Describe the loaded table and synthesize a statement, without running it
pub async fn generate(
    session: &Session,
    synthesizer: &Synthesizer,
    question: &str,
) -> Result<GeneratedQuery> {
    let schema = session.describe()?;
    Ok(synthesizer.synthesize(&schema, question).await?)
}

/// Describe, synthesize and execute in one step
pub async fn ask(session: &Session, synthesizer: &Synthesizer, question: &str) -> Result<Answer> {
    let query = generate(session, synthesizer, question).await?;
    let result = session.execute(&query)?;
    Ok(Answer { query, result })
}
