// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Token cache persistence.
//!
//! The on-disk layout is the google-auth "authorized user" JSON, so a
//! `token.json` written by the Python client libraries can be reused.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs as async_fs;

use super::client_secret::ClientSecret;
use super::error::AuthError;
use super::oauth_service::TokenResponse;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredToken {
    /// The access token.
    pub token: String,
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    pub fn from_response(client: &ClientSecret, scopes: &[String], response: TokenResponse) -> Self {
        let mut token = Self {
            token: String::new(),
            refresh_token: None,
            token_uri: client.token_uri.clone(),
            client_id: client.client_id.clone(),
            client_secret: client.client_secret.clone(),
            scopes: scopes.to_vec(),
            expiry: None,
        };
        token.apply_response(response);
        token
    }

    /// Fold a token endpoint response into this record. A refresh response
    /// usually omits the refresh token, in which case the old one is kept.
    pub fn apply_response(&mut self, response: TokenResponse) {
        self.token = response.access_token;
        if let Some(refresh_token) = response.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        self.expiry = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs as i64));
        if let Some(scope) = response.scope {
            self.scopes = scope.split_whitespace().map(str::to_string).collect();
        }
    }

    /// True if the token is expired or expires within `margin`. A token with
    /// no recorded expiry is treated as valid.
    pub fn is_expired(&self, margin: Duration) -> bool {
        match self.expiry {
            Some(expiry) => expiry - margin <= Utc::now(),
            None => false,
        }
    }

    /// An empty scope list means the cache did not record scopes.
    pub fn grants(&self, required: &[String]) -> bool {
        self.scopes.is_empty() || required.iter().all(|s| self.scopes.contains(s))
    }
}

/// Where the token cache lives.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> Result<Option<StoredToken>, AuthError>;
    async fn save(&self, token: &StoredToken) -> Result<(), AuthError>;
}

/// JSON file store (`token.json`).
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileTokenStore {
    async fn load(&self) -> Result<Option<StoredToken>, AuthError> {
        if !async_fs::try_exists(&self.path).await? {
            debug!("No cached token at {:?}", self.path);
            return Ok(None);
        }

        let contents = async_fs::read_to_string(&self.path).await?;
        let token: StoredToken = serde_json::from_str(&contents)?;
        debug!("Loaded cached token from {:?}", self.path);
        Ok(Some(token))
    }

    /// Atomic write: temp file with owner-only permissions, then rename.
    async fn save(&self, token: &StoredToken) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                async_fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(token)?;
        let temp_path = self.path.with_extension("tmp");
        async_fs::write(&temp_path, json.as_bytes()).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = async_fs::metadata(&temp_path).await?;
            let mut permissions = metadata.permissions();
            permissions.set_mode(0o600);
            async_fs::set_permissions(&temp_path, permissions).await?;
        }

        async_fs::rename(&temp_path, &self.path).await?;
        info!("Saved OAuth token to {:?}", self.path);
        Ok(())
    }
}

/// In-memory store, mostly for tests.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<StoredToken>>,
    saves: Mutex<usize>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<StoredToken>) -> Self {
        Self {
            token: Mutex::new(token),
            saves: Mutex::new(0),
        }
    }

    pub fn current(&self) -> Option<StoredToken> {
        self.token.lock().map(|t| (*t).clone()).unwrap_or(None)
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or(0)
    }
}

#[async_trait]
impl CredentialStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<StoredToken>, AuthError> {
        Ok(self.current())
    }

    async fn save(&self, token: &StoredToken) -> Result<(), AuthError> {
        if let Ok(mut slot) = self.token.lock() {
            *slot = Some(token.clone());
        }
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}
