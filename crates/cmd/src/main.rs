// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::Parser;
use cmd::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init_diagnostics();

    let cli = Cli::parse();
    let mut stdout = std::io::stdout();
    cmd::run(cli, &mut stdout).await
}
