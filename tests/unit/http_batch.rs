// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A whole batch over the real HTTP client against a mock Drive API.

use mockito::Matcher;
use std::sync::Arc;

use gdrive_transfer::auth::StaticTokenSource;
use gdrive_transfer::config::Settings;
use gdrive_transfer::drive::HttpDriveClient;
use gdrive_transfer::transfer::{BatchRunner, Outcome, RunOptions};

use super::common::{ALICE, BOB};

const FOLDER_LISTING: &str = r#"{
    "files": [
        {"id": "A", "name": "a.txt", "mimeType": "text/plain",
         "owners": [{"emailAddress": "alice@example.com"}], "parents": ["F"]},
        {"id": "B", "name": "b.txt", "mimeType": "text/plain",
         "owners": [{"emailAddress": "carol@example.com"}], "parents": ["F"]}
    ]
}"#;

fn options(dry_run: bool) -> RunOptions {
    RunOptions {
        source_email: ALICE.to_string(),
        target_email: BOB.to_string(),
        folder_ids: vec!["F".to_string()],
        dry_run,
    }
}

fn drive(server: &mockito::ServerGuard) -> HttpDriveClient {
    let settings = Settings {
        api_base_url: server.url(),
        ..Settings::default()
    };
    HttpDriveClient::new(&settings, Arc::new(StaticTokenSource::new("test-token"))).unwrap()
}

async fn mock_listing(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("GET", "/files")
        .match_query(Matcher::UrlEncoded(
            "q".into(),
            "'F' in parents and trashed = false".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(FOLDER_LISTING)
        .create_async()
        .await
}

#[tokio::test]
async fn test_live_run_grants_then_requests_ownership() {
    let mut server = mockito::Server::new_async().await;
    let listing = mock_listing(&mut server).await;
    let grant = server
        .mock("POST", "/files/A/permissions")
        .match_query(Matcher::UrlEncoded("sendNotificationEmail".into(), "false".into()))
        .match_body(Matcher::PartialJsonString(
            r#"{"type": "user", "role": "writer", "emailAddress": "bob@example.com"}"#.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "perm-A", "role": "writer", "type": "user"}"#)
        .expect(1)
        .create_async()
        .await;
    let request = server
        .mock("PATCH", "/files/A/permissions/perm-A")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJsonString(r#"{"pendingOwner": true}"#.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "perm-A", "role": "writer", "pendingOwner": true}"#)
        .expect(1)
        .create_async()
        .await;
    let foreign = server
        .mock("POST", "/files/B/permissions")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let drive = drive(&server);
    let summary = BatchRunner::new(&drive, &drive).run(&options(false)).await;

    listing.assert_async().await;
    grant.assert_async().await;
    request.assert_async().await;
    foreign.assert_async().await;
    assert_eq!(summary.transferred(), 1);
    assert_eq!(summary.skipped_not_owner(), 1);
    assert_eq!(summary.outcome_for("A"), Some(&Outcome::Transferred));
}

#[tokio::test]
async fn test_dry_run_sends_only_listing_requests() {
    let mut server = mockito::Server::new_async().await;
    let listing = mock_listing(&mut server).await;
    let mutations = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let patches = server
        .mock("PATCH", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let drive = drive(&server);
    let summary = BatchRunner::new(&drive, &drive).run(&options(true)).await;

    listing.assert_async().await;
    mutations.assert_async().await;
    patches.assert_async().await;
    assert_eq!(summary.skipped_dry_run(), 1);
    assert_eq!(summary.planned_actions.len(), 2);
}

#[tokio::test]
async fn test_ownership_rejection_is_reported_per_item() {
    let mut server = mockito::Server::new_async().await;
    let _listing = mock_listing(&mut server).await;
    let _grant = server
        .mock("POST", "/files/A/permissions")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "perm-A"}"#)
        .create_async()
        .await;
    let _request = server
        .mock("PATCH", "/files/A/permissions/perm-A")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"error": {"code": 403, "message": "Consent is required to transfer ownership",
                "errors": [{"reason": "consentRequiredForOwnershipTransfer"}]}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let drive = drive(&server);
    let summary = BatchRunner::new(&drive, &drive).run(&options(false)).await;

    assert_eq!(summary.failed(), 1);
    match summary.outcome_for("A") {
        Some(Outcome::Failed { error, .. }) => assert!(error.contains("Consent is required")),
        other => panic!("expected a failed outcome, got {:?}", other),
    }
}
