// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "nlq")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to GEMINI_API_KEY from the environment)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Execute statements verbatim, including writes and DDL
    #[arg(long, global = true)]
    pub allow_writes: bool,

    /// Field delimiter of the input file
    #[arg(long, global = true, default_value_t = ',')]
    pub delimiter: char,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a CSV file and print its schema description
    Schema {
        /// Input CSV file
        csv: PathBuf,
    },
    /// Print the prompt that would be sent for a question
    Prompt {
        /// Input CSV file
        csv: PathBuf,
        /// Question in natural language
        question: String,
    },
    /// Generate SQL for a question, optionally running it
    Ask(AskArgs),
    /// Run a hand-written SQL statement
    Sql(SqlArgs),
    /// Write an example configuration file
    InitConfig {
        /// Destination path
        #[arg(default_value = "nlq.yaml")]
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Also write the results as CSV to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Input CSV file
    pub csv: PathBuf,

    /// Question in natural language
    pub question: String,

    /// Run the generated statement and print its results
    #[arg(short, long)]
    pub execute: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug)]
pub struct SqlArgs {
    /// Input CSV file
    pub csv: PathBuf,

    /// SQL statement against table ipl_matches
    pub sql: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from([
            "nlq",
            "ask",
            "matches.csv",
            "Which team won most?",
            "--execute",
            "--format",
            "csv",
            "--delimiter",
            ";",
        ])
        .unwrap();

        assert_eq!(cli.delimiter, ';');
        assert!(!cli.allow_writes);
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.csv, PathBuf::from("matches.csv"));
                assert_eq!(args.question, "Which team won most?");
                assert!(args.execute);
                assert_eq!(args.output.format, OutputFormat::Csv);
                assert!(args.output.output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["nlq", "init-config"]).unwrap();
        assert_eq!(cli.delimiter, ',');
        match cli.command {
            Commands::InitConfig { path } => assert_eq!(path, PathBuf::from("nlq.yaml")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_sql_with_globals() {
        let cli = Cli::try_parse_from([
            "nlq",
            "--allow-writes",
            "--config",
            "nlq.yaml",
            "sql",
            "m.csv",
            "SELECT 1",
            "--format",
            "count",
            "-o",
            "out.csv",
        ])
        .unwrap();
        assert!(cli.allow_writes);
        assert_eq!(cli.config, Some(PathBuf::from("nlq.yaml")));
        match cli.command {
            Commands::Sql(args) => {
                assert_eq!(args.output.format, OutputFormat::Count);
                assert_eq!(args.output.output, Some(PathBuf::from("out.csv")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["nlq", "sql", "m.csv", "SELECT 1", "--format", "json"]).is_err());
    }
}
