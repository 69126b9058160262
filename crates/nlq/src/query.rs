// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use std::fmt;

/// A single SQL statement, ready for execution
///
/// Normally produced by the synthesizer. Nothing checks that it only names
/// the described table and columns; a wrong column surfaces at execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GeneratedQuery(String);

impl GeneratedQuery {
    /// Wrap hand-written SQL
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn sql(&self) -> &str {
        &self.0
    }

    pub fn into_sql(self) -> String {
        self.0
    }
}

impl fmt::Display for GeneratedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for GeneratedQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
