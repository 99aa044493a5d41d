// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use client::{HttpDriveClient, ListingClient, TransferClient};
pub use error::DriveError;
pub use retry::RetryPolicy;
pub use types::{Item, ItemKind, ItemPage, Permission};
