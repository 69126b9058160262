// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Result, bail};
use nlq::config::create_example_config;
use std::io::Write;
use std::path::Path;

/// Write an example configuration, refusing to overwrite an existing file
pub fn init_config_command<W: Write>(path: &Path, out: &mut W) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    create_example_config(path)?;
    writeln!(out, "Example configuration written to {}", path.display())?;
    writeln!(out, "Set GEMINI_API_KEY or edit the file before running 'nlq ask'.")?;
    Ok(())
}
