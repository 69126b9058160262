// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Read-only allowlist applied between synthesis and execution.
//!
//! The engine will run whatever it is handed, including DROP or DELETE. When a
//! session is read-only, statements must parse as exactly one query before
//! they reach the engine. DuckDB accepts syntax the SQL parser does not know
//! (FROM-first queries, sample clauses). Such a statement is still allowed if
//! it is a single statement that the engine can prepare as a subquery, which
//! only read-only statements can be. Everything else is rejected.

use crate::error::ExecutionError;
use crate::query::GeneratedQuery;
use diagnostics::warn;
use duckdb::Connection;
use sqlparser::ast::Statement;
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Location, Token, Tokenizer};

fn reject(reason: impl Into<String>) -> ExecutionError {
    let reason = reason.into();
    warn!("Rejected statement: {reason}", reason: reason.as_str());
    ExecutionError::Rejected { reason }
}

/// Pass only a single read-only query, judged by the SQL parser alone
pub fn check_read_only(query: &GeneratedQuery) -> Result<(), ExecutionError> {
    let statements = Parser::parse_sql(&DuckDbDialect {}, query.sql())
        .map_err(|e| reject(format!("could not verify statement is read-only: {e}")))?;
    classify(&statements)
}

/// Like [`check_read_only`], but consults the engine for DuckDB-only syntax
///
/// The engine only prepares the statement wrapped in a subquery. Nothing is
/// executed.
pub(crate) fn verify_read_only(
    conn: &Connection,
    query: &GeneratedQuery,
) -> Result<(), ExecutionError> {
    let parse_error = match Parser::parse_sql(&DuckDbDialect {}, query.sql()) {
        Ok(statements) => return classify(&statements),
        Err(e) => e,
    };

    let body = single_statement(query.sql())?;
    if body.is_empty() {
        return Err(reject("no statement found"));
    }

    prepare_as_subquery(conn, body).map_err(|e| {
        reject(format!(
            "could not verify statement is read-only: {parse_error}; {e}"
        ))
    })
}

fn classify(statements: &[Statement]) -> Result<(), ExecutionError> {
    match statements {
        [] => Err(reject("no statement found")),
        [Statement::Query(_)] => Ok(()),
        [other] => Err(reject(format!(
            "only queries are allowed in a read-only session, found: {}",
            statement_keyword(other)
        ))),
        many => Err(reject(format!(
            "expected exactly one statement, found {}",
            many.len()
        ))),
    }
}

/// Only a query may appear inside `FROM ( ... )`
///
/// `body` must be a single statement: preparing several would run all but
/// the last.
fn prepare_as_subquery(conn: &Connection, body: &str) -> Result<(), duckdb::Error> {
    // Newlines keep a trailing line comment from swallowing the paren
    let wrapped = format!("SELECT * FROM (\n{body}\n) AS read_only_check LIMIT 0");
    conn.prepare(&wrapped).map(|_| ())
}

/// Text of the only statement in `sql`, without trailing terminators
///
/// Tokenizing first means semicolons inside strings and comments do not
/// count as separators.
fn single_statement(sql: &str) -> Result<&str, ExecutionError> {
    let tokens = Tokenizer::new(&DuckDbDialect {}, sql)
        .tokenize_with_location()
        .map_err(|e| reject(format!("could not tokenize statement: {e}")))?;

    let Some(end) = tokens.iter().position(|t| t.token == Token::SemiColon) else {
        return Ok(sql.trim());
    };

    let trailing_only = tokens[end..]
        .iter()
        .all(|t| matches!(t.token, Token::SemiColon | Token::Whitespace(_)));
    if !trailing_only {
        return Err(reject("expected exactly one statement, found several"));
    }

    let offset = byte_offset(sql, &tokens[end].location)
        .ok_or_else(|| reject("could not locate end of statement"))?;
    Ok(sql[..offset].trim())
}

/// Convert a 1-based line and character column into a byte offset
fn byte_offset(sql: &str, location: &Location) -> Option<usize> {
    let line = usize::try_from(location.line.checked_sub(1)?).ok()?;
    let column = usize::try_from(location.column.checked_sub(1)?).ok()?;

    let line_start: usize = sql.split_inclusive('\n').take(line).map(str::len).sum();
    sql.get(line_start..)?
        .char_indices()
        .nth(column)
        .map(|(index, _)| line_start + index)
}

/// Leading keyword(s) of a statement, for error messages
fn statement_keyword(statement: &Statement) -> String {
    statement
        .to_string()
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(sql: &str) -> Result<(), ExecutionError> {
        check_read_only(&GeneratedQuery::new(sql))
    }

    #[test]
    fn test_queries_pass() {
        assert!(check("SELECT * FROM ipl_matches WHERE target_runs > 200;").is_ok());
        assert!(check("SELECT winner, count(*) AS wins FROM ipl_matches GROUP BY winner ORDER BY wins DESC").is_ok());
        assert!(
            check("WITH high AS (SELECT * FROM ipl_matches WHERE target_runs > 200) SELECT count(*) FROM high")
                .is_ok()
        );
        assert!(check("SELECT team FROM ipl_matches UNION SELECT winner FROM ipl_matches").is_ok());
    }

    #[test]
    fn test_writes_are_rejected() {
        for sql in [
            "DROP TABLE ipl_matches",
            "DELETE FROM ipl_matches",
            "UPDATE ipl_matches SET target_runs = 0",
            "INSERT INTO ipl_matches VALUES ('C', 1, '2023-01-03')",
            "CREATE TABLE t AS SELECT * FROM ipl_matches",
        ] {
            let err = check(sql).unwrap_err();
            assert!(
                matches!(err, ExecutionError::Rejected { .. }),
                "{sql} should be rejected"
            );
        }
    }

    #[test]
    fn test_multiple_statements_are_rejected() {
        let err = check("SELECT 1; DROP TABLE ipl_matches").unwrap_err();
        match err {
            ExecutionError::Rejected { reason } => assert!(reason.contains("exactly one")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unparseable_is_rejected() {
        let err = check("this is not sql").unwrap_err();
        assert!(matches!(err, ExecutionError::Rejected { .. }));
    }

    #[test]
    fn test_rejection_names_statement_kind() {
        match check("DELETE FROM ipl_matches").unwrap_err() {
            ExecutionError::Rejected { reason } => assert!(reason.contains("DELETE")),
            other => panic!("unexpected error: {other}"),
        }
    }

    fn connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE ipl_matches (team VARCHAR, target_runs BIGINT);
             INSERT INTO ipl_matches VALUES ('A', 180), ('B', 205);",
        )
        .unwrap();
        conn
    }

    fn verify(conn: &Connection, sql: &str) -> Result<(), ExecutionError> {
        verify_read_only(conn, &GeneratedQuery::new(sql))
    }

    fn row_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT count(*) FROM ipl_matches", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_duckdb_only_queries_pass() {
        let conn = connection();
        for sql in [
            "FROM ipl_matches SELECT team",
            "FROM ipl_matches",
            "SELECT * FROM ipl_matches USING SAMPLE 1",
            "FROM ipl_matches SELECT team; -- latest season",
            "FROM ipl_matches SELECT team WHERE team <> 'x;y';",
        ] {
            assert!(verify(&conn, sql).is_ok(), "{sql} should pass");
        }
    }

    #[test]
    fn test_duckdb_only_syntax_cannot_smuggle_writes() {
        let conn = connection();
        for sql in [
            "FROM ipl_matches SELECT team; DROP TABLE ipl_matches",
            "FROM ipl_matches SELECT team; DELETE FROM ipl_matches;",
            "DELETE FROM ipl_matches",
            "this is not sql",
            "FROM ipl_matches SELECT team /* unterminated",
        ] {
            let err = verify(&conn, sql).unwrap_err();
            assert!(
                matches!(err, ExecutionError::Rejected { .. }),
                "{sql} should be rejected"
            );
        }
        assert_eq!(row_count(&conn), 2);
    }

    #[test]
    fn test_subquery_preparation_refuses_writes() {
        let conn = connection();
        assert!(prepare_as_subquery(&conn, "FROM ipl_matches SELECT team").is_ok());
        for body in [
            "DELETE FROM ipl_matches",
            "UPDATE ipl_matches SET target_runs = 0",
            "INSERT INTO ipl_matches VALUES ('C', 1)",
            "DROP TABLE ipl_matches",
        ] {
            assert!(prepare_as_subquery(&conn, body).is_err(), "{body} should fail");
        }
        assert_eq!(row_count(&conn), 2);
    }

    #[test]
    fn test_single_statement_strips_terminators() {
        assert_eq!(single_statement("SELECT 1;").unwrap(), "SELECT 1");
        assert_eq!(single_statement("  FROM t ;; -- done\n").unwrap(), "FROM t");
        assert_eq!(
            single_statement("FROM t\nWHERE name = 'é;'; ").unwrap(),
            "FROM t\nWHERE name = 'é;'"
        );
        assert!(single_statement("FROM t; FROM u").is_err());
    }
}
