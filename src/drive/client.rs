// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Drive v3 REST client.
//!
//! The walker and the transfer state machine only see the [`ListingClient`]
//! and [`TransferClient`] traits; [`HttpDriveClient`] implements both over
//! reqwest with bearer auth and retry/backoff.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::RETRY_AFTER;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::error::DriveError;
use super::retry::{is_retryable, parse_retry_after, RetryPolicy};
use super::types::{FileListDto, ItemPage, Permission};
use crate::auth::AccessTokenSource;
use crate::config::Settings;

const FILE_FIELDS: &str = "nextPageToken, files(id, name, mimeType, owners(emailAddress), parents)";
const PERMISSION_FIELDS: &str = "id, role, type, emailAddress, pendingOwner";

/// Read-only enumeration of Drive items.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingClient: Send + Sync {
    /// One page of the non-trashed children of `folder_id`.
    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<String>,
    ) -> Result<ItemPage, DriveError>;

    /// One page of every non-trashed item owned by `email`, across the account.
    async fn list_owned_by(
        &self,
        email: &str,
        page_token: Option<String>,
    ) -> Result<ItemPage, DriveError>;
}

/// The two mutating calls of an ownership transfer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransferClient: Send + Sync {
    /// Create a `writer` permission for `email` on the item.
    async fn grant_editor(&self, item_id: &str, email: &str) -> Result<Permission, DriveError>;

    /// Flag an existing permission as pending owner.
    async fn request_ownership(
        &self,
        item_id: &str,
        permission_id: &str,
    ) -> Result<Permission, DriveError>;
}

/// Escape a literal for use inside a single-quoted Drive query string.
pub fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

pub fn children_query(folder_id: &str) -> String {
    format!("'{}' in parents and trashed = false", escape_query_value(folder_id))
}

pub fn owned_by_query(email: &str) -> String {
    format!("'{}' in owners and trashed = false", escape_query_value(email))
}

struct AttemptError {
    error: DriveError,
    retry_after: Option<Duration>,
}

impl From<DriveError> for AttemptError {
    fn from(error: DriveError) -> Self {
        Self { error, retry_after: None }
    }
}

pub struct HttpDriveClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn AccessTokenSource>,
    retry: RetryPolicy,
    folder_page_size: u32,
    owner_page_size: u32,
}

impl HttpDriveClient {
    pub fn new(settings: &Settings, tokens: Arc<dyn AccessTokenSource>) -> Result<Self, DriveError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            tokens,
            retry: RetryPolicy::from(&settings.retry),
            folder_page_size: settings.folder_page_size,
            owner_page_size: settings.owner_page_size,
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn list_files(
        &self,
        query: String,
        page_size: u32,
        page_token: Option<String>,
    ) -> Result<ItemPage, DriveError> {
        let url = self.url("/files");
        let page_size = page_size.to_string();
        debug!("Listing files: q=[{}] pageToken={:?}", query, page_token);

        let dto: FileListDto = self
            .execute(Method::GET, &url, |request| {
                let mut params = vec![
                    ("q", query.as_str()),
                    ("pageSize", page_size.as_str()),
                    ("fields", FILE_FIELDS),
                    ("supportsAllDrives", "true"),
                    ("includeItemsFromAllDrives", "true"),
                ];
                if let Some(token) = page_token.as_deref() {
                    params.push(("pageToken", token));
                }
                request.query(&params)
            })
            .await?;

        Ok(ItemPage::from(dto))
    }

    /// Send a request, retrying rate-limited and transient failures.
    async fn execute<T, F>(&self, method: Method, url: &str, build: F) -> Result<T, DriveError>
    where
        T: DeserializeOwned,
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let token = self.tokens.access_token().await?;
            let request = build(self.http.request(method.clone(), url)).bearer_auth(token);

            match Self::send_once(request).await {
                Ok(value) => return Ok(value),
                Err(failure) if attempt < self.retry.max_retries && is_retryable(&failure.error) => {
                    let delay = self.retry.delay(attempt, failure.retry_after);
                    warn!(
                        "{} {} failed ({}), retrying in {:?} (attempt {}/{})",
                        method,
                        url,
                        failure.error,
                        delay,
                        attempt + 1,
                        self.retry.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    async fn send_once<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, AttemptError> {
        let response = request.send().await.map_err(DriveError::from)?;
        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError {
                error: DriveError::from_response(status.as_u16(), &body),
                retry_after,
            });
        }

        let body = response.text().await.map_err(DriveError::from)?;
        serde_json::from_str(&body)
            .map_err(|e| DriveError::Decode(e.to_string()).into())
    }
}

#[async_trait]
impl ListingClient for HttpDriveClient {
    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<String>,
    ) -> Result<ItemPage, DriveError> {
        self.list_files(children_query(folder_id), self.folder_page_size, page_token)
            .await
    }

    async fn list_owned_by(
        &self,
        email: &str,
        page_token: Option<String>,
    ) -> Result<ItemPage, DriveError> {
        self.list_files(owned_by_query(email), self.owner_page_size, page_token)
            .await
    }
}

#[async_trait]
impl TransferClient for HttpDriveClient {
    async fn grant_editor(&self, item_id: &str, email: &str) -> Result<Permission, DriveError> {
        let url = self.url(&format!("/files/{}/permissions", urlencoding::encode(item_id)));
        let body = json!({
            "type": "user",
            "role": "writer",
            "emailAddress": email,
        });

        self.execute(Method::POST, &url, |request| {
            request
                .query(&[
                    ("supportsAllDrives", "true"),
                    ("sendNotificationEmail", "false"),
                    ("fields", PERMISSION_FIELDS),
                ])
                .json(&body)
        })
        .await
    }

    async fn request_ownership(
        &self,
        item_id: &str,
        permission_id: &str,
    ) -> Result<Permission, DriveError> {
        let url = self.url(&format!(
            "/files/{}/permissions/{}",
            urlencoding::encode(item_id),
            urlencoding::encode(permission_id)
        ));
        let body = json!({
            "role": "writer",
            "pendingOwner": true,
        });

        self.execute(Method::PATCH, &url, |request| {
            request
                .query(&[("supportsAllDrives", "true"), ("fields", PERMISSION_FIELDS)])
                .json(&body)
        })
        .await
    }
}
