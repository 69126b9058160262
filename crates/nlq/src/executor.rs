// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::ExecutionError;
use crate::query::GeneratedQuery;
use crate::result::ResultSet;
use diagnostics::{debug, info};
use duckdb::Connection;
use duckdb::arrow::record_batch::RecordBatch;

fn engine_error(e: duckdb::Error) -> ExecutionError {
    ExecutionError::Engine(e.to_string())
}

/// Run a statement verbatim and materialize the whole result
///
/// Binding errors (unknown column or table) fail at prepare time and runtime
/// errors fail before any batch is handed out, so a result is either complete
/// or absent.
pub(crate) fn run(conn: &Connection, query: &GeneratedQuery) -> Result<ResultSet, ExecutionError> {
    let sql = query.sql();
    debug!("Executing SQL query: {sql}", sql: sql);

    let mut stmt = conn.prepare(sql).map_err(engine_error)?;
    let arrow = stmt.query_arrow([]).map_err(engine_error)?;
    let schema = arrow.get_schema();
    let batches: Vec<RecordBatch> = arrow.collect();

    let result = ResultSet::new(schema, batches);
    info!("Query returned {rows} rows", rows: result.num_rows());

    Ok(result)
}
