// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::auth::AuthError;
use crate::drive::DriveError;

/// Failures that stop the tool before any item is touched. These are the
/// only errors that reach `main` and produce a non-zero exit code.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Credential error: {0}")]
    Credentials(#[from] AuthError),

    #[error("Failed to initialise Drive client: {0}")]
    Client(#[from] DriveError),
}
