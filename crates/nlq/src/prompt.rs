// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Instruction template sent to the language model.
//!
//! The template is a fixed contract. The schema text is the only grounding
//! the model gets, so it is embedded whole, followed by the literal question.
//! Bump [`PROMPT_VERSION`] whenever the wording changes.

use crate::error::SynthesisError;
use crate::schema::SchemaDescription;
use tera::{Context, Tera};

pub const PROMPT_VERSION: &str = "v1";

const PROMPT_TEMPLATE: &str = "\
You are an SQL expert. Given the following SQL table schema and sample data for IPL matches:
{{ schema }}

Generate a SQL query to answer this question: {{ question }}

Requirements:
1. Use only the columns and table shown in the schema
2. Return a valid SQL query that can be executed against the table
3. Do not use any tables or columns not shown in the schema
4. Return ONLY the SQL query without any markdown tags or explanations
5. The table name is '{{ table }}'
6. Make sure column names match exactly with the schema
7. Return exactly one SQL statement
8. The query runs on DuckDB, so use DuckDB SQL syntax
SQL Query:";

/// Render the prompt for a schema and question
///
/// Pure: the same inputs always give the same text. Values are inserted
/// verbatim, so braces in a question are not interpreted.
pub fn render_prompt(schema: &SchemaDescription, question: &str) -> Result<String, SynthesisError> {
    let mut context = Context::new();
    context.insert("schema", &schema.render());
    context.insert("question", question.trim());
    context.insert("table", schema.table());

    Tera::one_off(PROMPT_TEMPLATE, &context, false)
        .map_err(|e| SynthesisError::Template(e.to_string()))
}
