// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! gdrive-transfer binary.
//!
//! Exit codes:
//!   0 - Run completed (individual item failures are listed in the summary)
//!   1 - Setup failed (bad arguments, configuration, or credentials)

use clap::Parser;
use std::process::ExitCode;

use gdrive_transfer::cli::{self, Cli};
use gdrive_transfer::config::Settings;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file
    dotenvy::dotenv().ok();

    let args = Cli::parse();

    let settings = match Settings::new(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Logger is not up yet; the configured level is part of what failed.
            eprintln!("Configuration error: {}", e);
            return ExitCode::from(cli::EXIT_SETUP_FAILURE);
        }
    };

    let level = args.log_level.clone().unwrap_or_else(|| settings.log.level.clone());
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(level));

    ExitCode::from(cli::finish(cli::run(&args, &settings).await))
}
