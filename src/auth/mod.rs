// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! OAuth2 credentials for the Drive API.

pub mod client_secret;
pub mod error;
pub mod loopback;
pub mod oauth_service;
pub mod provider;
pub mod token_store;

use async_trait::async_trait;

pub use client_secret::{ClientSecret, DRIVE_SCOPE};
pub use error::AuthError;
pub use provider::{CredentialProvider, GoogleOAuthFlow, OAuthFlow, StaticTokenSource};
pub use token_store::{CredentialStore, FileTokenStore, MemoryTokenStore, StoredToken};

/// Something that can hand out a currently valid bearer token.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}
