// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Tabular loader: delimited text in, normalized engine table out.
//!
//! Loading happens in two phases. [`prepare`] parses the whole input with
//! arrow_csv, normalizes column names and coerces the `date` column, all
//! without touching the store. [`replace_table`] then swaps the prepared batch
//! into DuckDB inside one transaction through the Arrow appender, so a failed
//! load never leaves a partial table behind.

use crate::dataset::{ColumnType, Dataset, quote_ident};
use crate::error::LoadError;
use arrow_array::{Array, ArrayRef, Date32Array, RecordBatch, StringArray};
use arrow_csv::reader::Format;
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use diagnostics::debug;
use duckdb::Connection;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

/// Name of the column that gets coerced to a calendar date
pub const DATE_COLUMN: &str = "date";

/// Values treated as missing, in addition to empty fields
const NULL_PATTERN: &str = r"^(|NA|N/A|NaN|nan|null|NULL)$";

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// CSV dialect options
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CsvOptions {
    /// Field delimiter (default: ',')
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Whether the first row names the columns (default: true)
    #[serde(default = "default_has_header")]
    pub has_header: bool,

    /// Quote character (default: '"')
    #[serde(default = "default_quote")]
    pub quote: char,
}

fn default_delimiter() -> char {
    ','
}
fn default_has_header() -> bool {
    true
}
fn default_quote() -> char {
    '"'
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            has_header: default_has_header(),
            quote: default_quote(),
        }
    }
}

/// Raw delimited input, as uploaded
#[derive(Debug, Clone)]
pub struct RawTable {
    bytes: Vec<u8>,
    options: CsvOptions,
}

impl RawTable {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            options: CsvOptions::default(),
        }
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, LoadError> {
        let mut bytes = Vec::new();
        let _ = reader.read_to_end(&mut bytes)?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path.as_ref())?;
        Ok(Self::from_bytes(bytes))
    }

    #[must_use]
    pub fn with_options(mut self, options: CsvOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.iter().all(u8::is_ascii_whitespace)
    }
}

/// Parsed input with normalized names and coerced types
#[derive(Debug)]
pub(crate) struct PreparedTable {
    pub(crate) batch: RecordBatch,
}

impl PreparedTable {
    pub(crate) fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub(crate) fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }
}

/// Normalize a header cell into an engine-safe column name
///
/// Trims surrounding whitespace and replaces spaces and slashes with
/// underscores. Deterministic, so the same source always yields the same
/// schema.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().replace([' ', '/'], "_")
}

/// Parse a single `date` cell
///
/// Returns None when no accepted format matches.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|datetime| datetime.date_naive())
}

fn null_regex() -> Result<Regex, LoadError> {
    Regex::new(NULL_PATTERN).map_err(|e| LoadError::Csv(e.to_string()))
}

/// The CSV reader works on bytes, so dialect characters must be ASCII
fn dialect_byte(option: &'static str, value: char) -> Result<u8, LoadError> {
    if value.is_ascii() {
        Ok(value as u8)
    } else {
        Err(LoadError::InvalidDialect { option, value })
    }
}

fn csv_error(e: impl std::fmt::Display) -> LoadError {
    LoadError::Csv(e.to_string())
}

/// Rename inferred fields and check the naming invariants
///
/// The `date` column is read as text so that coercion failures can name the
/// offending value.
fn normalized_schema(inferred: &Schema) -> Result<Schema, LoadError> {
    if inferred.fields().is_empty() {
        return Err(LoadError::NoColumns);
    }

    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(inferred.fields().len());

    for (index, field) in inferred.fields().iter().enumerate() {
        let name = normalize_column_name(field.name());
        if name.is_empty() {
            return Err(LoadError::EmptyColumnName {
                position: index + 1,
            });
        }
        if !seen.insert(name.clone()) {
            return Err(LoadError::DuplicateColumn { name });
        }

        let data_type = match field.data_type() {
            _ if name == DATE_COLUMN => DataType::Utf8,
            // Columns with no values at all are kept as text
            DataType::Null => DataType::Utf8,
            other => other.clone(),
        };
        fields.push(Field::new(name, data_type, true));
    }

    Ok(Schema::new(fields))
}

/// Coerce a text column into calendar dates, failing on the first bad value
fn coerce_dates(column: &ArrayRef) -> Result<ArrayRef, LoadError> {
    let strings = column
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| LoadError::Csv("date column was not read as text".to_string()))?;

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| LoadError::Csv("invalid epoch".to_string()))?;

    let mut days = Vec::with_capacity(strings.len());
    for (index, value) in strings.iter().enumerate() {
        let parsed = match value {
            None => None,
            Some(text) => {
                let date = parse_date(text).ok_or_else(|| LoadError::InvalidDate {
                    row: index + 1,
                    value: text.to_string(),
                })?;
                Some((date - epoch).num_days() as i32)
            }
        };
        days.push(parsed);
    }

    Ok(Arc::new(Date32Array::from(days)))
}

/// Parse and normalize a raw table without touching any store
pub(crate) fn prepare(raw: &RawTable) -> Result<PreparedTable, LoadError> {
    if raw.is_empty() {
        return Err(LoadError::NoColumns);
    }

    let options = &raw.options;
    let delimiter = dialect_byte("delimiter", options.delimiter)?;
    let quote = dialect_byte("quote", options.quote)?;
    let format = Format::default()
        .with_header(options.has_header)
        .with_delimiter(delimiter)
        .with_quote(quote)
        .with_null_regex(null_regex()?);

    // Infer over every record so a late non-numeric value still yields text
    let (inferred, _) = format
        .infer_schema(Cursor::new(&raw.bytes), None)
        .map_err(csv_error)?;
    let read_schema = Arc::new(normalized_schema(&inferred)?);

    let reader = arrow_csv::ReaderBuilder::new(read_schema.clone())
        .with_header(options.has_header)
        .with_delimiter(delimiter)
        .with_quote(quote)
        .with_null_regex(null_regex()?)
        .build(Cursor::new(&raw.bytes))
        .map_err(csv_error)?;

    let batches = reader
        .collect::<Result<Vec<RecordBatch>, _>>()
        .map_err(csv_error)?;
    let batch = arrow_select::concat::concat_batches(&read_schema, &batches).map_err(csv_error)?;

    let Some(date_index) = read_schema
        .fields()
        .iter()
        .position(|f| f.name() == DATE_COLUMN)
    else {
        return Ok(PreparedTable { batch });
    };

    debug!("Coercing {rows} values in the date column", rows: batch.num_rows());

    let mut columns = batch.columns().to_vec();
    columns[date_index] = coerce_dates(&columns[date_index])?;

    let mut fields: Vec<Field> = read_schema
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    fields[date_index] = Field::new(DATE_COLUMN, DataType::Date32, true);

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(csv_error)?;
    Ok(PreparedTable { batch })
}

fn store_error(e: duckdb::Error) -> LoadError {
    LoadError::Store(e.to_string())
}

/// Cast every column to the Arrow type matching its declared engine type
fn storage_batch(batch: &RecordBatch, column_types: &[ColumnType]) -> Result<RecordBatch, LoadError> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(column_types.len());
    let mut columns = Vec::with_capacity(column_types.len());

    for ((field, column), ty) in schema.fields().iter().zip(batch.columns()).zip(column_types) {
        let data_type = ty.arrow_type();
        columns.push(arrow_cast::cast(column.as_ref(), &data_type).map_err(csv_error)?);
        fields.push(Field::new(field.name(), data_type, true));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(csv_error)
}

/// Atomically replace `table` with the prepared rows
///
/// Drop, create and append share one transaction. Any error rolls it back,
/// leaving whatever table was visible before.
pub(crate) fn replace_table(
    conn: &mut Connection,
    table: &str,
    prepared: &PreparedTable,
) -> Result<Dataset, LoadError> {
    let schema = prepared.schema();
    let ident = quote_ident(table);
    let column_types: Vec<ColumnType> = schema
        .fields()
        .iter()
        .map(|f| ColumnType::from_arrow(f.data_type()))
        .collect();

    let column_defs: Vec<String> = schema
        .fields()
        .iter()
        .zip(&column_types)
        .map(|(field, ty)| format!("{} {}", quote_ident(field.name()), ty.sql_type()))
        .collect();

    let batch = storage_batch(&prepared.batch, &column_types)?;

    let tx = conn.transaction().map_err(store_error)?;

    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {ident}; CREATE TABLE {ident} ({});",
        column_defs.join(", ")
    ))
    .map_err(store_error)?;

    if batch.num_rows() > 0 {
        let mut appender = tx.appender(table).map_err(store_error)?;
        appender.append_record_batch(batch).map_err(store_error)?;
        appender.flush().map_err(store_error)?;
    }

    tx.commit().map_err(store_error)?;

    Ok(Dataset::from_schema(table, &schema, prepared.num_rows()))
}
