// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Session context owning one in-memory engine.
//!
//! A session holds at most one dataset. Loading replaces it; describing and
//! executing read it. Separate sessions never share tables.

use crate::dataset::Dataset;
use crate::error::{ExecutionError, IntrospectionError, LoadError};
use crate::executor;
use crate::guard;
use crate::loader::{self, RawTable};
use crate::query::GeneratedQuery;
use crate::result::ResultSet;
use crate::schema::{self, SchemaDescription};
use diagnostics::{debug, info, warn};
use duckdb::{Config, Connection};

/// Logical name of the loaded table
pub const TABLE_NAME: &str = "ipl_matches";

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub table_name: String,

    /// Pass statements through the read-only guard before execution
    pub read_only: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            table_name: TABLE_NAME.to_string(),
            read_only: true,
        }
    }
}

pub struct Session {
    id: uuid7::Uuid,
    conn: Connection,
    options: SessionOptions,
    dataset: Option<Dataset>,
}

fn store_error(e: duckdb::Error) -> LoadError {
    LoadError::Store(e.to_string())
}

impl Session {
    /// Open a fresh in-memory store
    ///
    /// The store cannot reach files, URLs or extensions, so generated SQL only
    /// sees the loaded table.
    pub fn open(options: SessionOptions) -> Result<Self, LoadError> {
        let config = Config::default()
            .enable_external_access(false)
            .and_then(|config| config.enable_autoload_extension(false))
            .map_err(store_error)?;
        let conn = Connection::open_in_memory_with_flags(config).map_err(store_error)?;
        let id = uuid7::uuid7();
        info!(
            "Opened session {id} (read_only: {read_only})",
            id: id.to_string(),
            read_only: options.read_only
        );

        Ok(Self {
            id,
            conn,
            options,
            dataset: None,
        })
    }

    pub fn open_in_memory() -> Result<Self, LoadError> {
        Self::open(SessionOptions::default())
    }

    pub fn id(&self) -> uuid7::Uuid {
        self.id
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// The current dataset, if a load has succeeded
    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Parse, normalize and store `raw`, replacing any previous dataset
    ///
    /// On failure the previous dataset (if any) is still loaded.
    pub fn load(&mut self, raw: &RawTable) -> Result<Dataset, LoadError> {
        let table = self.options.table_name.as_str();
        info!("Loading {bytes} bytes into {table}", bytes: raw.len(), table: table);

        let prepared = loader::prepare(raw)?;
        let dataset = loader::replace_table(&mut self.conn, table, &prepared)?;

        info!(
            "Loaded {rows} rows and {columns} columns into {table}",
            rows: dataset.row_count(),
            columns: dataset.columns().len(),
            table: table
        );

        self.dataset = Some(dataset.clone());
        Ok(dataset)
    }

    pub fn describe(&self) -> Result<SchemaDescription, IntrospectionError> {
        let dataset = self.dataset.as_ref().ok_or(IntrospectionError::NoDataset)?;
        schema::describe(&self.conn, dataset)
    }

    /// Run a statement against the session's store
    ///
    /// Read-only sessions reject anything other than a single query first.
    pub fn execute(&self, query: &GeneratedQuery) -> Result<ResultSet, ExecutionError> {
        if self.options.read_only {
            guard::verify_read_only(&self.conn, query)?;
        }
        executor::run(&self.conn, query)
    }

    /// Release the store, discarding all tables
    pub fn close(self) {
        let id = self.id.to_string();
        match self.conn.close() {
            Ok(()) => debug!("Closed session {id}", id: id.as_str()),
            Err((_, e)) => warn!(
                "Failed to close session {id}: {error}",
                id: id.as_str(),
                error: e.to_string()
            ),
        }
    }
}
