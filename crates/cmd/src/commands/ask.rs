// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::cli::AskArgs;
use crate::common::{CommandContext, print_result};
use anyhow::Result;
use diagnostics::info;
use nlq::{Synthesizer, build_backend};
use std::io::Write;

/// Generate SQL for a question; with `--execute`, also run it
pub async fn ask_command<W: Write>(ctx: &CommandContext, args: &AskArgs, out: &mut W) -> Result<()> {
    let config = ctx.load_config()?;
    let synthesizer = Synthesizer::new(build_backend(&config.backend)?);
    let session = ctx.open_session(&args.csv, Some(&config))?;

    info!("Asking {backend}", backend: synthesizer.backend_name());

    if !args.execute {
        let query = nlq::generate(&session, &synthesizer, &args.question).await?;
        writeln!(out, "Generated SQL Query:")?;
        writeln!(out, "{query}")?;
        session.close();
        return Ok(());
    }

    let answer = nlq::ask(&session, &synthesizer, &args.question).await?;
    writeln!(out, "Generated SQL Query:")?;
    writeln!(out, "{}", answer.query)?;
    writeln!(out)?;
    print_result(
        &answer.result,
        args.output.format,
        args.output.output.as_deref(),
        out,
    )?;

    session.close();
    Ok(())
}
