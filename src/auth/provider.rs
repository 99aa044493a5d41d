// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Credential provider: cached token → refresh → browser authorization.

use async_trait::async_trait;
use chrono::Duration;
use log::{info, warn};
use tokio::sync::Mutex;

use super::client_secret::ClientSecret;
use super::error::AuthError;
use super::loopback::LoopbackListener;
use super::oauth_service::{OAuthService, TokenResponse};
use super::token_store::{CredentialStore, StoredToken};
use super::AccessTokenSource;

/// The interactive half of OAuth: obtaining and refreshing tokens.
#[async_trait]
pub trait OAuthFlow: Send + Sync {
    /// Run a full user authorization and return fresh tokens.
    async fn authorize(&self) -> Result<TokenResponse, AuthError>;

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError>;
}

/// Installed-app flow: print the consent URL, catch the redirect on a
/// loopback port, exchange the code.
pub struct GoogleOAuthFlow {
    service: OAuthService,
    redirect_host: String,
}

impl GoogleOAuthFlow {
    pub fn new(service: OAuthService, redirect_host: impl Into<String>) -> Self {
        Self {
            service,
            redirect_host: redirect_host.into(),
        }
    }
}

#[async_trait]
impl OAuthFlow for GoogleOAuthFlow {
    async fn authorize(&self) -> Result<TokenResponse, AuthError> {
        let listener = LoopbackListener::bind(&self.redirect_host).await?;
        let request = self.service.authorization_request(listener.redirect_uri());

        eprintln!("Please visit this URL to authorize this application:\n\n{}\n", request.url);
        info!("Waiting for OAuth redirect on {}", listener.redirect_uri());

        let code = listener.wait_for_code(&request.state).await?;
        self.service
            .exchange_code(&code, &request.code_verifier, &request.redirect_uri)
            .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        self.service.refresh_token(refresh_token).await
    }
}

pub struct CredentialProvider {
    store: Box<dyn CredentialStore>,
    flow: Box<dyn OAuthFlow>,
    client: ClientSecret,
    scopes: Vec<String>,
    expiry_margin: Duration,
    current: Mutex<Option<StoredToken>>,
}

impl CredentialProvider {
    pub fn new(
        store: Box<dyn CredentialStore>,
        flow: Box<dyn OAuthFlow>,
        client: ClientSecret,
        scopes: Vec<String>,
        expiry_margin_secs: i64,
    ) -> Self {
        Self {
            store,
            flow,
            client,
            scopes,
            expiry_margin: Duration::seconds(expiry_margin_secs),
            current: Mutex::new(None),
        }
    }

    /// Make sure a usable token exists before any Drive work starts.
    pub async fn ensure_authorized(&self) -> Result<(), AuthError> {
        self.access_token().await.map(|_| ())
    }

    /// `interactive` is false once a token has been handed out: a run that
    /// is already under way must not stall on a browser prompt.
    async fn obtain(&self, cached: Option<StoredToken>, interactive: bool) -> Result<StoredToken, AuthError> {
        if let Some(mut token) = cached {
            if !token.grants(&self.scopes) {
                if !interactive {
                    return Err(AuthError::ReauthorizationRequired(
                        "cached token lacks the required scopes".to_string(),
                    ));
                }
                info!("Cached token lacks the required scopes, re-authorizing");
            } else if !token.is_expired(self.expiry_margin) {
                return Ok(token);
            } else if let Some(refresh_token) = token.refresh_token.clone() {
                match self.flow.refresh(&refresh_token).await {
                    Ok(response) => {
                        token.apply_response(response);
                        self.store.save(&token).await?;
                        return Ok(token);
                    }
                    Err(e) if !interactive => return Err(e),
                    Err(e) => warn!("Token refresh failed ({}), falling back to authorization", e),
                }
            }
        }

        if !interactive {
            return Err(AuthError::ReauthorizationRequired(
                "token expired and could not be refreshed".to_string(),
            ));
        }

        let response = self.flow.authorize().await?;
        let token = StoredToken::from_response(&self.client, &self.scopes, response);
        self.store.save(&token).await?;
        Ok(token)
    }
}

#[async_trait]
impl AccessTokenSource for CredentialProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        let mut current = self.current.lock().await;

        if let Some(token) = current.as_ref() {
            if !token.is_expired(self.expiry_margin) {
                return Ok(token.token.clone());
            }
        }

        // The in-memory token is kept on failure so later calls stay
        // non-interactive too.
        let interactive = current.is_none();
        let cached = match current.clone() {
            Some(token) => Some(token),
            None => self.store.load().await?,
        };
        let token = self.obtain(cached, interactive).await?;
        let access = token.token.clone();
        *current = Some(token);
        Ok(access)
    }
}

/// A fixed bearer token; never refreshes.
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl AccessTokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String, AuthError> {
        Ok(self.token.clone())
    }
}
