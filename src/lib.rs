// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Library core for gdrive-transfer.

// --- Modules ---
pub mod auth;
pub mod cli;
pub mod config;
pub mod drive;
pub mod error;
pub mod transfer;

pub mod prelude {
    // Config
    pub use crate::config::Settings;
    pub use crate::error::SetupError;

    // Auth
    pub use crate::auth::{AccessTokenSource, AuthError, CredentialProvider};

    // Drive
    pub use crate::drive::{DriveError, HttpDriveClient, Item, ItemKind, ItemPage, ListingClient, Permission, TransferClient};

    // Transfer
    pub use crate::transfer::{BatchRunner, Outcome, RunOptions, TransferSummary};

    // Common Libs
    pub use log::{debug, error, info, trace, warn};
    pub use std::sync::Arc;
}
