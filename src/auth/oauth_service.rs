// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! OAuth2 service for the Google installed-app authorization code flow with PKCE.
//!
//! Handles:
//! - Generating authorization URLs with PKCE + state
//! - Exchanging authorization codes for tokens
//! - Refreshing expired access tokens

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL};
use log::{debug, error, info};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Digest};

use super::client_secret::ClientSecret;
use super::error::AuthError;

/// Token response from the Google OAuth2 token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

/// Everything the callback needs to finish an authorization started with
/// [`OAuthService::authorization_request`].
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub code_verifier: String,
    pub redirect_uri: String,
}

pub struct OAuthService {
    client: ClientSecret,
    scopes: Vec<String>,
    http_client: reqwest::Client,
}

impl OAuthService {
    pub fn new(client: ClientSecret, scopes: Vec<String>) -> Self {
        Self {
            client,
            scopes,
            http_client: reqwest::Client::new(),
        }
    }

    /// Build an authorization URL for the given loopback redirect.
    ///
    /// `access_type=offline` + `prompt=consent` make Google return a refresh
    /// token every time, so the cached token keeps working across runs.
    pub fn authorization_request(&self, redirect_uri: &str) -> AuthorizationRequest {
        let state = generate_random_string(32);
        let code_verifier = generate_code_verifier();
        let code_challenge = compute_code_challenge(&code_verifier);
        let scopes = self.scopes.join(" ");

        let url = format!(
            "{}?client_id={}&response_type=code&redirect_uri={}&scope={}&state={}&code_challenge={}&code_challenge_method=S256&access_type=offline&prompt=consent",
            self.client.auth_uri,
            urlencoding::encode(&self.client.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes),
            urlencoding::encode(&state),
            urlencoding::encode(&code_challenge),
        );

        debug!("Generated Google OAuth2 authorization URL (state={})", &state[..8]);
        AuthorizationRequest {
            url,
            state,
            code_verifier,
            redirect_uri: redirect_uri.to_string(),
        }
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AuthError> {
        let params = [
            ("client_id", self.client.client_id.as_str()),
            ("client_secret", self.client.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
            ("code_verifier", code_verifier),
        ];

        info!("Exchanging authorization code for tokens");

        let response = self.http_client
            .post(&self.client.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Token exchange failed: HTTP {} - {}", status, body);
            return Err(AuthError::TokenExchangeFailed(
                format!("HTTP {}: {}", status, body)
            ));
        }

        let token_response: TokenResponse = response.json().await
            .map_err(|e| AuthError::TokenExchangeFailed(format!("JSON parse: {}", e)))?;

        info!("Successfully exchanged authorization code for tokens");
        Ok(token_response)
    }

    /// Refresh an access token using a refresh token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        let params = [
            ("client_id", self.client.client_id.as_str()),
            ("client_secret", self.client.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        debug!("Refreshing Google OAuth2 access token");

        let response = self.http_client
            .post(&self.client.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Token refresh failed: HTTP {} - {}", status, body);
            return Err(AuthError::TokenRefreshFailed(
                format!("HTTP {}: {}", status, body)
            ));
        }

        let token_response: TokenResponse = response.json().await
            .map_err(|e| AuthError::TokenRefreshFailed(format!("JSON parse: {}", e)))?;

        info!("Successfully refreshed Google OAuth2 access token");
        Ok(token_response)
    }
}

/// Generate a cryptographically random URL-safe string of the given byte length.
fn generate_random_string(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE64URL.encode(&bytes)
}

/// Generate an OAuth2 PKCE code verifier (43-128 character URL-safe string).
fn generate_code_verifier() -> String {
    generate_random_string(32) // 32 bytes → 43 base64url characters
}

/// Compute the S256 code challenge from a code verifier.
fn compute_code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let hash = hasher.finalize();
    BASE64URL.encode(hash)
}
