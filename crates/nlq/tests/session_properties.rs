// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use nlq::{
    ExecutionError, GeneratedQuery, IntrospectionError, LoadError, RawTable, Session,
    SessionOptions,
};
use std::collections::HashSet;
use std::io::Write;
use tempfile::NamedTempFile;

const MATCHES: &str = "team,target_runs,date\nA,180,2023-01-01\nB,205,2023-01-02\n";

const MESSY_HEADER: &str = "\
 Match ID ,Team 1/Team 2,target runs,venue city,date
1,CSK/MI,180,Chennai,2023-04-01
2,RCB/KKR,205,Bengaluru,04/02/2023
3,DC/PBKS,NA,Delhi,03 Apr 2023
4,GT/RR,162,Ahmedabad,
";

fn csv_file(content: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

#[test]
fn test_describe_lists_every_column_once() -> Result<()> {
    let file = csv_file(MESSY_HEADER)?;
    let mut session = Session::open_in_memory()?;
    let dataset = session.load(&RawTable::from_path(file.path())?)?;
    assert_eq!(dataset.row_count(), 4);

    let schema = session.describe()?;
    let names = schema.column_names();
    assert_eq!(
        names,
        vec!["Match_ID", "Team_1_Team_2", "target_runs", "venue_city", "date"]
    );

    let unique: HashSet<&str> = names.iter().copied().collect();
    assert_eq!(unique.len(), names.len());
    for name in &names {
        assert!(!name.contains(' '), "{name} contains a space");
        assert!(!name.contains('/'), "{name} contains a slash");
    }

    // Every column name appears in the rendered text, untruncated
    let rendered = schema.render();
    for name in &names {
        assert!(rendered.contains(&format!("- {name} (")));
    }
    assert!(rendered.contains("Sample data (first 3 rows):"));
    Ok(())
}

#[test]
fn test_reload_yields_identical_schema() -> Result<()> {
    let raw = RawTable::from_bytes(MESSY_HEADER);
    let mut session = Session::open_in_memory()?;

    let _ = session.load(&raw)?;
    let first = session.describe()?;
    let _ = session.load(&raw)?;
    let second = session.describe()?;

    assert_eq!(first, second);
    assert_eq!(first.render(), second.render());

    // Replaced, not appended
    let all = session.execute(&GeneratedQuery::new("SELECT * FROM ipl_matches"))?;
    assert_eq!(all.num_rows(), 4);
    Ok(())
}

#[test]
fn test_invalid_date_leaves_no_table() -> Result<()> {
    let mut session = Session::open_in_memory()?;
    let err = session
        .load(&RawTable::from_bytes(
            "team,date\nA,2023-01-01\nB,someday\n",
        ))
        .unwrap_err();

    match err {
        LoadError::InvalidDate { row, value } => {
            assert_eq!(row, 2);
            assert_eq!(value, "someday");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(matches!(
        session.describe(),
        Err(IntrospectionError::NoDataset)
    ));
    let err = session
        .execute(&GeneratedQuery::new("SELECT * FROM ipl_matches"))
        .unwrap_err();
    assert!(matches!(err, ExecutionError::Engine(_)));
    Ok(())
}

#[test]
fn test_failed_reload_keeps_previous_table() -> Result<()> {
    let mut session = Session::open_in_memory()?;
    let _ = session.load(&RawTable::from_bytes(MATCHES))?;
    let before = session.describe()?;

    assert!(session
        .load(&RawTable::from_bytes("team,date\nC,31/31/2023\n"))
        .is_err());

    assert_eq!(session.describe()?, before);
    let rows = session.execute(&GeneratedQuery::new("SELECT team FROM ipl_matches"))?;
    assert_eq!(rows.num_rows(), 2);
    Ok(())
}

#[test]
fn test_sessions_are_isolated() -> Result<()> {
    let mut first = Session::open_in_memory()?;
    let second = Session::open_in_memory()?;
    assert_ne!(first.id(), second.id());

    let _ = first.load(&RawTable::from_bytes(MATCHES))?;

    assert!(first.describe().is_ok());
    assert!(matches!(
        second.describe(),
        Err(IntrospectionError::NoDataset)
    ));
    assert!(second
        .execute(&GeneratedQuery::new("SELECT * FROM ipl_matches"))
        .is_err());

    first.close();
    second.close();
    Ok(())
}

#[test]
fn test_allow_writes_executes_verbatim() -> Result<()> {
    let mut guarded = Session::open_in_memory()?;
    let _ = guarded.load(&RawTable::from_bytes(MATCHES))?;
    let drop = GeneratedQuery::new("DROP TABLE ipl_matches");
    assert!(matches!(
        guarded.execute(&drop),
        Err(ExecutionError::Rejected { .. })
    ));
    assert!(guarded.describe().is_ok());

    let mut open = Session::open(SessionOptions {
        read_only: false,
        ..SessionOptions::default()
    })?;
    let _ = open.load(&RawTable::from_bytes(MATCHES))?;
    let _ = open.execute(&GeneratedQuery::new("DELETE FROM ipl_matches"))?;

    let remaining = open.execute(&GeneratedQuery::new("SELECT * FROM ipl_matches"))?;
    assert!(remaining.is_empty());
    Ok(())
}

#[test]
fn test_csv_export_mirrors_result() -> Result<()> {
    let mut session = Session::open_in_memory()?;
    let _ = session.load(&RawTable::from_bytes(MATCHES))?;

    let result = session.execute(&GeneratedQuery::new(
        "SELECT team, target_runs FROM ipl_matches ORDER BY target_runs DESC",
    ))?;

    let out = NamedTempFile::new()?;
    result.write_csv(std::fs::File::create(out.path())?)?;
    let written = std::fs::read_to_string(out.path())?;
    assert_eq!(written, "team,target_runs\nB,205\nA,180\n");

    let empty = session.execute(&GeneratedQuery::new(
        "SELECT team FROM ipl_matches WHERE target_runs > 1000",
    ))?;
    assert_eq!(empty.to_csv_string()?, "team\n");
    Ok(())
}
