// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use clap::ValueEnum;
use nlq::{CsvOptions, NlqConfig, RawTable, ResultSet, Session, SessionOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// How query results are printed
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table followed by the record count
    Table,
    /// CSV with a header row
    Csv,
    /// Record count only
    Count,
}

/// Settings shared by every subcommand
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config_path: Option<PathBuf>,
    pub allow_writes: bool,
    pub delimiter: char,
}

impl CommandContext {
    /// Configuration from `--config`, or from the environment
    pub fn load_config(&self) -> Result<NlqConfig> {
        match &self.config_path {
            Some(path) => nlq::load_config(path)
                .with_context(|| format!("Failed to load config {}", path.display())),
            None => Ok(NlqConfig::from_env()?),
        }
    }

    /// Open a session and load `csv` into it
    pub fn open_session(&self, csv: &Path, config: Option<&NlqConfig>) -> Result<Session> {
        let configured_read_only = config.is_none_or(|c| c.execution.read_only);
        let options = SessionOptions {
            read_only: configured_read_only && !self.allow_writes,
            ..SessionOptions::default()
        };

        let raw = RawTable::from_path(csv)
            .with_context(|| format!("Failed to read {}", csv.display()))?
            .with_options(CsvOptions {
                delimiter: self.delimiter,
                ..CsvOptions::default()
            });

        let mut session = Session::open(options)?;
        let _ = session
            .load(&raw)
            .with_context(|| format!("Failed to load {}", csv.display()))?;
        Ok(session)
    }
}

/// Print results in the requested format, optionally exporting CSV
pub fn print_result<W: Write>(
    result: &ResultSet,
    format: OutputFormat,
    output: Option<&Path>,
    out: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if result.is_empty() {
                writeln!(out, "No results found.")?;
            } else {
                writeln!(out, "{}", result.pretty()?)?;
            }
            writeln!(out, "Total Records: {}", result.num_rows())?;
        }
        OutputFormat::Csv => result.write_csv(&mut *out)?,
        OutputFormat::Count => writeln!(out, "{}", result.num_rows())?,
    }

    if let Some(path) = output {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        result.write_csv(file)?;
        writeln!(out, "Results written to {}", path.display())?;
    }

    Ok(())
}
