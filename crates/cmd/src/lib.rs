// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod cli;
pub mod commands;
pub mod common;

pub use cli::{Cli, Commands};

use anyhow::Result;
use common::CommandContext;
use std::io::Write;

/// Dispatch a parsed command line, writing user-facing output to `out`
pub async fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    let ctx = CommandContext {
        config_path: cli.config,
        allow_writes: cli.allow_writes,
        delimiter: cli.delimiter,
    };

    match cli.command {
        Commands::Schema { csv } => commands::schema_command(&ctx, &csv, out),
        Commands::Prompt { csv, question } => {
            commands::prompt_command(&ctx, &csv, &question, out)
        }
        Commands::Ask(args) => commands::ask_command(&ctx, &args, out).await,
        Commands::Sql(args) => commands::sql_command(&ctx, &args, out),
        Commands::InitConfig { path } => commands::init_config_command(&path, out),
    }
}
