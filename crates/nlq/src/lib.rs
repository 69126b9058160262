// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Natural-language questions over a single uploaded table.
//!
//! The flow is load, describe, synthesize, execute:
//!
//! - [`Session::load`] parses a delimited file into the session's in-memory
//!   DuckDB store as `ipl_matches`, normalizing column names and dates.
//! - [`Session::describe`] produces a [`SchemaDescription`] from the catalog.
//! - [`Synthesizer::synthesize`] renders a prompt and asks a
//!   [`CompletionBackend`] for one SQL statement.
//! - [`Session::execute`] runs it and materializes a [`ResultSet`].

pub mod backend;
pub mod config;
mod dataset;
pub mod error;
mod executor;
pub mod guard;
pub mod loader;
mod pipeline;
pub mod prompt;
mod query;
mod result;
mod schema;
mod session;
mod synth;

pub use backend::{CompletionBackend, GeminiBackend, OpenAiBackend, ScriptedBackend, build_backend};
pub use config::{NlqConfig, load_config};
pub use dataset::{Column, ColumnType, Dataset};
pub use error::{
    ConfigError, Error, ExecutionError, ExportError, IntrospectionError, LoadError, Result,
    SynthesisError,
};
pub use guard::check_read_only;
pub use loader::{CsvOptions, RawTable};
pub use pipeline::{Answer, ask, generate};
pub use prompt::{PROMPT_VERSION, render_prompt};
pub use query::GeneratedQuery;
pub use result::ResultSet;
pub use schema::{ColumnSchema, SAMPLE_ROWS, SchemaDescription};
pub use session::{Session, SessionOptions, TABLE_NAME};
pub use synth::{Synthesizer, clean_completion};
