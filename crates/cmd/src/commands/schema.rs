// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::CommandContext;
use anyhow::Result;
use std::io::Write;
use std::path::Path;

/// Load a file and print the description the model would see
pub fn schema_command<W: Write>(ctx: &CommandContext, csv: &Path, out: &mut W) -> Result<()> {
    let session = ctx.open_session(csv, None)?;
    let schema = session.describe()?;
    writeln!(out, "{schema}")?;
    session.close();
    Ok(())
}
