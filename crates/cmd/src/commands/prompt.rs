// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::CommandContext;
use anyhow::Result;
use nlq::{PROMPT_VERSION, render_prompt};
use std::io::Write;
use std::path::Path;

/// Render the prompt for a question without contacting any backend
pub fn prompt_command<W: Write>(
    ctx: &CommandContext,
    csv: &Path,
    question: &str,
    out: &mut W,
) -> Result<()> {
    let session = ctx.open_session(csv, None)?;
    let schema = session.describe()?;
    let prompt = render_prompt(&schema, question)?;

    diagnostics::debug!("Rendered prompt version {version}", version: PROMPT_VERSION);
    writeln!(out, "{prompt}")?;
    session.close();
    Ok(())
}
