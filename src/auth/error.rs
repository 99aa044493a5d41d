// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Errors from OAuth2 authorization and credential persistence.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to read client secret file {path}: {source}")]
    ClientSecretRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid client secret file: {0}")]
    InvalidClientSecret(String),
    #[error("Token store IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Token store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),
    #[error("Invalid state parameter (possible CSRF)")]
    InvalidState,
    #[error("Malformed authorization callback: {0}")]
    InvalidCallback(String),
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),
    #[error("Re-authorization required: {0}")]
    ReauthorizationRequired(String),
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}
