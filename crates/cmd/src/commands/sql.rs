// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::cli::SqlArgs;
use crate::common::{CommandContext, print_result};
use anyhow::Result;
use nlq::GeneratedQuery;
use std::io::Write;

/// Run a hand-written statement through the same executor as generated ones
pub fn sql_command<W: Write>(ctx: &CommandContext, args: &SqlArgs, out: &mut W) -> Result<()> {
    let config = match &ctx.config_path {
        Some(_) => Some(ctx.load_config()?),
        None => None,
    };
    let session = ctx.open_session(&args.csv, config.as_ref())?;

    let result = session.execute(&GeneratedQuery::new(args.sql.as_str()))?;
    print_result(
        &result,
        args.output.format,
        args.output.output.as_deref(),
        out,
    )?;

    session.close();
    Ok(())
}
