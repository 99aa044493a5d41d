// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Token cache on disk, refresh against a fake token endpoint, and the
//! refreshed token reaching Drive requests.

use chrono::{Duration, Utc};
use mockito::Matcher;
use std::sync::Arc;
use tempfile::TempDir;

use gdrive_transfer::auth::oauth_service::OAuthService;
use gdrive_transfer::auth::{
    AccessTokenSource, ClientSecret, CredentialProvider, CredentialStore, FileTokenStore, GoogleOAuthFlow,
    StoredToken, DRIVE_SCOPE,
};
use gdrive_transfer::config::Settings;
use gdrive_transfer::drive::{HttpDriveClient, ListingClient};

fn client_secret(token_uri: &str) -> ClientSecret {
    let json = format!(
        r#"{{"installed": {{"client_id": "cid.apps.googleusercontent.com", "client_secret": "shh", "token_uri": "{}"}}}}"#,
        token_uri
    );
    ClientSecret::from_json(&json).unwrap()
}

fn stored(token_uri: &str, expires_in_secs: i64) -> StoredToken {
    StoredToken {
        token: "stale-token".to_string(),
        refresh_token: Some("1//keep-me".to_string()),
        token_uri: token_uri.to_string(),
        client_id: "cid.apps.googleusercontent.com".to_string(),
        client_secret: "shh".to_string(),
        scopes: vec![DRIVE_SCOPE.to_string()],
        expiry: Some(Utc::now() + Duration::seconds(expires_in_secs)),
    }
}

fn provider(client: ClientSecret, token_path: &std::path::Path) -> CredentialProvider {
    let scopes = vec![DRIVE_SCOPE.to_string()];
    let service = OAuthService::new(client.clone(), scopes.clone());
    CredentialProvider::new(
        Box::new(FileTokenStore::new(token_path)),
        Box::new(GoogleOAuthFlow::new(service, "127.0.0.1")),
        client,
        scopes,
        60,
    )
}

#[tokio::test]
async fn test_expired_token_is_refreshed_persisted_and_used() {
    let mut server = mockito::Server::new_async().await;
    let token_uri = format!("{}/token", server.url());

    let token_mock = server
        .mock("POST", "/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            Matcher::UrlEncoded("refresh_token".into(), "1//keep-me".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "fresh-token", "expires_in": 3599, "token_type": "Bearer"}"#)
        .expect(1)
        .create_async()
        .await;
    let files_mock = server
        .mock("GET", "/files")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer fresh-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"files": []}"#)
        .expect(2)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let token_path = dir.path().join("token.json");
    let store = FileTokenStore::new(&token_path);
    store.save(&stored(&token_uri, -30)).await.unwrap();

    let provider = Arc::new(provider(client_secret(&token_uri), &token_path));
    provider.ensure_authorized().await.unwrap();

    let settings = Settings {
        api_base_url: server.url(),
        ..Settings::default()
    };
    let drive = HttpDriveClient::new(&settings, provider).unwrap();
    drive.list_children("F", None).await.unwrap();
    drive.list_children("F", None).await.unwrap();

    token_mock.assert_async().await;
    files_mock.assert_async().await;

    let saved = store.load().await.unwrap().unwrap();
    assert_eq!(saved.token, "fresh-token");
    assert_eq!(saved.refresh_token.as_deref(), Some("1//keep-me"));
    assert!(saved.expiry.unwrap() > Utc::now());
}

#[tokio::test]
async fn test_valid_cached_token_needs_no_token_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let token_uri = format!("{}/token", server.url());
    let token_mock = server.mock("POST", "/token").expect(0).create_async().await;

    let dir = TempDir::new().unwrap();
    let token_path = dir.path().join("token.json");
    FileTokenStore::new(&token_path)
        .save(&stored(&token_uri, 3600))
        .await
        .unwrap();

    let provider = provider(client_secret(&token_uri), &token_path);
    assert_eq!(provider.access_token().await.unwrap(), "stale-token");
    token_mock.assert_async().await;
}
