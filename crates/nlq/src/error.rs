// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Error kinds, one per pipeline stage.
//!
//! Each stage returns its own enum so callers can branch on the failure kind.
//! [`Error`] wraps all of them for code that drives the whole pipeline.

use thiserror::Error;

/// The delimited input could not be turned into a table
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to parse CSV input: {0}")]
    Csv(String),

    #[error("CSV {option} must be a single ASCII character, got '{value}'")]
    InvalidDialect { option: &'static str, value: char },

    #[error("Input has no columns")]
    NoColumns,

    #[error("Column {position} has an empty name")]
    EmptyColumnName { position: usize },

    #[error("Duplicate column name '{name}' after normalization")]
    DuplicateColumn { name: String },

    #[error("Cannot parse '{value}' as a date in column 'date' (row {row})")]
    InvalidDate { row: usize, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write table to the store: {0}")]
    Store(String),
}

/// The loaded table could not be described
#[derive(Debug, Error)]
pub enum IntrospectionError {
    #[error("No dataset has been loaded")]
    NoDataset,

    #[error("Failed to read table schema: {0}")]
    Store(String),
}

/// No usable statement came back from the language model
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Question is empty")]
    EmptyQuestion,

    #[error("Prompt rendering failed: {0}")]
    Template(String),

    #[error("Backend '{backend}' failed: {message}")]
    Backend { backend: String, message: String },

    #[error("Backend returned no SQL statement")]
    EmptyCompletion,
}

/// The engine refused or failed the statement
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Query failed: {0}")]
    Engine(String),

    #[error("Statement rejected: {reason}")]
    Rejected { reason: String },
}

/// A result set could not be written out
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write CSV: {0}")]
    Csv(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration file problems
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Template expansion failed: {0}")]
    Template(String),

    #[error("Failed to parse YAML configuration: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Any failure from the pipeline
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Introspection(#[from] IntrospectionError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl SynthesisError {
    pub(crate) fn backend(backend: &str, message: impl Into<String>) -> Self {
        SynthesisError::Backend {
            backend: backend.to_string(),
            message: message.into(),
        }
    }
}
