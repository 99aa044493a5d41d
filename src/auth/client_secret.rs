// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Google OAuth client descriptor (`client_secret.json`).
//!
//! The file is downloaded from the Cloud console and is only ever read.
//! Both the "installed" (desktop) and "web" layouts are accepted.

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::AuthError;

pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Full read/write Drive scope; permission changes need it.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientSecret {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    pub fn from_json(contents: &str) -> Result<Self, AuthError> {
        let file: ClientSecretFile = serde_json::from_str(contents)
            .map_err(|e| AuthError::InvalidClientSecret(e.to_string()))?;

        let secret = file.installed.or(file.web).ok_or_else(|| {
            AuthError::InvalidClientSecret(
                "expected an \"installed\" or \"web\" client section".to_string(),
            )
        })?;

        if secret.client_id.trim().is_empty() {
            return Err(AuthError::InvalidClientSecret("client_id is empty".to_string()));
        }
        Ok(secret)
    }

    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        debug!("Loading OAuth client secret from {:?}", path);
        let contents = std::fs::read_to_string(path).map_err(|source| AuthError::ClientSecretRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }
}
