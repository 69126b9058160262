// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Schema introspection: the text the language model sees about the data.
//!
//! The description is built from the engine catalog rather than from the
//! loader's view, so it always reflects what a generated query will run
//! against.

use crate::dataset::{Dataset, quote_ident};
use crate::error::IntrospectionError;
use diagnostics::debug;
use duckdb::Connection;
use duckdb::arrow::record_batch::RecordBatch;
use duckdb::arrow::util::pretty::pretty_format_batches;
use serde::Serialize;
use std::fmt;

/// Number of leading rows included as sample data
pub const SAMPLE_ROWS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Engine type name, e.g. BIGINT or DATE
    pub data_type: String,
}

/// Immutable snapshot of a table's columns and first rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDescription {
    table: String,
    columns: Vec<ColumnSchema>,
    sample: String,
}

impl SchemaDescription {
    pub fn new(table: impl Into<String>, columns: Vec<ColumnSchema>, sample: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns,
            sample: sample.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Sample rows rendered as an ASCII table
    pub fn sample(&self) -> &str {
        &self.sample
    }

    /// Text form embedded in the prompt
    pub fn render(&self) -> String {
        let mut text = String::from("Table Schema:\n");
        text.push_str(&format!("Table name: {}\n", self.table));
        text.push_str("Columns:\n");
        for column in &self.columns {
            text.push_str(&format!("- {} ({})\n", column.name, column.data_type));
        }
        text.push_str(&format!("\nSample data (first {SAMPLE_ROWS} rows):\n"));
        text.push_str(&self.sample);
        text
    }
}

impl fmt::Display for SchemaDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn store_error(e: impl fmt::Display) -> IntrospectionError {
    IntrospectionError::Store(e.to_string())
}

/// Describe a loaded table from the engine catalog
pub(crate) fn describe(
    conn: &Connection,
    dataset: &Dataset,
) -> Result<SchemaDescription, IntrospectionError> {
    let table = dataset.table();

    let mut stmt = conn
        .prepare(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_schema = 'main' AND table_name = ? \
             ORDER BY ordinal_position",
        )
        .map_err(store_error)?;
    let columns = stmt
        .query_map(duckdb::params![table], |row| {
            Ok(ColumnSchema {
                name: row.get(0)?,
                data_type: row.get(1)?,
            })
        })
        .map_err(store_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(store_error)?;

    if columns.is_empty() {
        // Catalog and session disagree; the table is gone
        return Err(IntrospectionError::NoDataset);
    }

    let mut stmt = conn
        .prepare(&format!(
            "SELECT * FROM {} LIMIT {SAMPLE_ROWS}",
            quote_ident(table)
        ))
        .map_err(store_error)?;
    let arrow = stmt.query_arrow([]).map_err(store_error)?;
    let schema = arrow.get_schema();
    let mut batches: Vec<RecordBatch> = arrow.collect();
    if batches.is_empty() {
        batches.push(RecordBatch::new_empty(schema));
    }
    let sample = pretty_format_batches(&batches)
        .map_err(store_error)?
        .to_string();

    debug!(
        "Described {table} with {column_count} columns",
        table: table,
        column_count: columns.len()
    );

    Ok(SchemaDescription::new(table, columns, sample))
}
