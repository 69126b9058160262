// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Materialized query results and their CSV export.

use crate::error::ExportError;
use arrow::util::pretty::pretty_format_batches;
use arrow_array::{Array, RecordBatch};
use arrow_cast::display::{ArrayFormatter, FormatOptions};
use arrow_csv::WriterBuilder;
use arrow_schema::SchemaRef;
use std::io::Write;

/// Fully materialized output of one statement
#[derive(Debug, Clone)]
pub struct ResultSet {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl ResultSet {
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self { schema, batches }
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    /// Display strings for one column, in row order; None for missing values
    pub fn column_values(&self, name: &str) -> Option<Vec<Option<String>>> {
        let index = self.schema.index_of(name).ok()?;
        let options = FormatOptions::default();
        let mut values = Vec::with_capacity(self.num_rows());

        for batch in &self.batches {
            let column = batch.column(index);
            let formatter = ArrayFormatter::try_new(column.as_ref(), &options).ok()?;
            for row in 0..batch.num_rows() {
                if column.is_null(row) {
                    values.push(None);
                } else {
                    values.push(Some(formatter.value(row).to_string()));
                }
            }
        }

        Some(values)
    }

    /// ASCII table rendering; an empty result still shows the header
    pub fn pretty(&self) -> Result<String, ExportError> {
        let rendered = if self.batches.is_empty() {
            pretty_format_batches(&[RecordBatch::new_empty(self.schema.clone())])
        } else {
            pretty_format_batches(&self.batches)
        };
        rendered
            .map(|table| table.to_string())
            .map_err(|e| ExportError::Csv(e.to_string()))
    }

    /// Write header plus rows as CSV, mirroring column and row order
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let mut csv_writer = WriterBuilder::new().with_header(true).build(writer);

        // The header is emitted with the first batch, so an empty result needs one
        if self.batches.is_empty() {
            csv_writer
                .write(&RecordBatch::new_empty(self.schema.clone()))
                .map_err(|e| ExportError::Csv(e.to_string()))?;
        }

        for batch in &self.batches {
            csv_writer
                .write(batch)
                .map_err(|e| ExportError::Csv(e.to_string()))?;
        }

        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String, ExportError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ExportError::Csv(e.to_string()))
    }
}
