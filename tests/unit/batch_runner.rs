// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! End-to-end batch behaviour against the in-memory Drive.

use gdrive_transfer::transfer::{BatchRunner, Outcome, RunOptions, TransferSummary};

use super::common::{Call, FakeDrive, ALICE, BOB, CAROL};

fn options(folder_ids: &[&str], dry_run: bool) -> RunOptions {
    RunOptions {
        source_email: ALICE.to_string(),
        target_email: BOB.to_string(),
        folder_ids: folder_ids.iter().map(|s| s.to_string()).collect(),
        dry_run,
    }
}

async fn run(drive: &FakeDrive, options: &RunOptions) -> TransferSummary {
    BatchRunner::new(drive, drive).run(options).await
}

fn assert_counts_add_up(summary: &TransferSummary) {
    assert_eq!(
        summary.transferred() + summary.skipped_not_owner() + summary.failed() + summary.skipped_dry_run(),
        summary.total()
    );
}

fn scenario_drive() -> FakeDrive {
    FakeDrive::new().file("F", "A", ALICE).file("F", "B", CAROL)
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_folder_run_transfers_owned_and_skips_foreign() {
    let drive = scenario_drive();
    let summary = run(&drive, &options(&["F"], false)).await;

    assert_eq!(summary.transferred(), 1);
    assert_eq!(summary.skipped_not_owner(), 1);
    assert_eq!(summary.failed(), 0);
    assert_eq!(summary.outcome_for("A"), Some(&Outcome::Transferred));
    assert_eq!(drive.granted(), vec!["A".to_string()]);
    assert_eq!(drive.ownership_requested(), vec!["A".to_string()]);
    assert_counts_add_up(&summary);
}

#[tokio::test]
async fn test_grant_precedes_ownership_request_with_returned_permission() {
    let drive = scenario_drive();
    run(&drive, &options(&["F"], false)).await;

    let mutations: Vec<Call> = drive.calls().into_iter().filter(|c| c.is_mutation()).collect();
    assert_eq!(
        mutations,
        vec![
            Call::GrantEditor {
                item_id: "A".to_string(),
                email: BOB.to_string()
            },
            Call::RequestOwnership {
                item_id: "A".to_string(),
                permission_id: "perm-A".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_no_folders_uses_owner_query_only() {
    let drive = FakeDrive::new()
        .file("root", "A", ALICE)
        .folder("root", "S", ALICE)
        .file("S", "C", ALICE)
        .file("root", "B", CAROL);
    let summary = run(&drive, &options(&[], false)).await;

    assert!(drive.calls().iter().all(|c| !matches!(c, Call::ListChildren(_))));
    assert!(drive.calls().contains(&Call::ListOwnedBy(ALICE.to_string())));
    assert_eq!(summary.transferred(), 3);
    assert_eq!(summary.outcome_for("B"), None);
}

#[tokio::test]
async fn test_grant_failure_is_recorded_and_run_continues() {
    let drive = FakeDrive::new()
        .file("F", "X", ALICE)
        .file("F", "Y", ALICE)
        .failing_grant("X");
    let summary = run(&drive, &options(&["F"], false)).await;

    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.transferred(), 1);
    assert!(matches!(summary.outcome_for("X"), Some(Outcome::Failed { .. })));
    assert_eq!(drive.ownership_requested(), vec!["Y".to_string()]);
    assert!(summary.to_string().contains("X-name (X)"));
    assert_counts_add_up(&summary);
}

#[tokio::test]
async fn test_dry_run_plans_actions_without_mutations() {
    let drive = scenario_drive();
    let summary = run(&drive, &options(&["F"], true)).await;

    assert_eq!(drive.mutation_count(), 0);
    assert_eq!(summary.skipped_dry_run(), 1);
    assert_eq!(summary.skipped_not_owner(), 1);
    let text = summary.to_string();
    assert!(text.contains("would grant editor access on A-name (A)"));
    assert!(text.contains("would transfer ownership of A-name (A)"));
    assert!(!text.contains("(B)"));
}

// ============================================================================
// Properties
// ============================================================================

#[tokio::test]
async fn test_item_under_two_parents_is_processed_once() {
    let drive = FakeDrive::new()
        .folder("F", "S1", ALICE)
        .folder("F", "S2", ALICE)
        .file("S1", "shared", ALICE)
        .file("S2", "shared", ALICE);
    let summary = run(&drive, &options(&["F"], false)).await;

    assert_eq!(summary.total(), 3);
    let shared_grants = drive.granted().iter().filter(|id| *id == "shared").count();
    assert_eq!(shared_grants, 1);
    assert_counts_add_up(&summary);
}

#[tokio::test]
async fn test_overlapping_roots_are_processed_once() {
    let drive = FakeDrive::new()
        .folder("F", "S", ALICE)
        .file("S", "A", ALICE)
        .file("F", "B", ALICE);
    let summary = run(&drive, &options(&["F", "S"], false)).await;

    assert_eq!(summary.total(), 3);
    let listed_s = drive
        .calls()
        .iter()
        .filter(|c| **c == Call::ListChildren("S".to_string()))
        .count();
    assert_eq!(listed_s, 1);
}

#[tokio::test]
async fn test_dry_run_set_matches_live_transfer_set() {
    let build = || {
        FakeDrive::new()
            .with_page_size(2)
            .file("F", "a", ALICE)
            .folder("F", "sub", CAROL)
            .file("sub", "b", ALICE)
            .file("sub", "c", CAROL)
            .file("F", "d", "Alice@Example.COM")
    };

    let dry = build();
    let planned = run(&dry, &options(&["F"], true)).await;
    let mut would_transfer: Vec<String> = planned
        .outcomes
        .iter()
        .filter(|o| o.outcome == Outcome::SkippedDryRun)
        .map(|o| o.item_id.clone())
        .collect();

    let live = build();
    run(&live, &options(&["F"], false)).await;
    let mut transferred = live.ownership_requested();

    would_transfer.sort();
    transferred.sort();
    assert_eq!(would_transfer, transferred);
    assert_eq!(transferred, vec!["a", "b", "d"]);
}

#[tokio::test]
async fn test_foreign_items_never_reach_transfer_calls() {
    let drive = FakeDrive::new()
        .folder("F", "S", CAROL)
        .file("S", "foreign", CAROL)
        .file("S", "mine", ALICE);
    run(&drive, &options(&["F"], false)).await;

    for call in drive.calls() {
        if let Call::GrantEditor { item_id, .. } | Call::RequestOwnership { item_id, .. } = call {
            assert_eq!(item_id, "mine");
        }
    }
}

#[tokio::test]
async fn test_pagination_is_followed_to_exhaustion() {
    let mut drive = FakeDrive::new().with_page_size(2);
    for i in 0..7 {
        drive = drive.file("F", &format!("f{}", i), ALICE);
    }
    let summary = run(&drive, &options(&["F"], true)).await;

    assert_eq!(summary.total(), 7);
    let listings = drive
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::ListChildren(_)))
        .count();
    assert_eq!(listings, 4);
}

#[tokio::test]
async fn test_failed_subfolder_listing_does_not_stop_siblings() {
    let drive = FakeDrive::new()
        .folder("F", "locked", ALICE)
        .folder("F", "open", ALICE)
        .file("open", "inside", ALICE)
        .file("locked", "hidden", ALICE)
        .failing_listing("locked");
    let summary = run(&drive, &options(&["F"], false)).await;

    assert_eq!(summary.listing_failures.len(), 1);
    assert!(summary.has_failures());
    assert_eq!(summary.outcome_for("inside"), Some(&Outcome::Transferred));
    assert_eq!(summary.outcome_for("hidden"), None);
    // The folder itself is still transferred.
    assert_eq!(summary.outcome_for("locked"), Some(&Outcome::Transferred));
    assert!(summary.to_string().contains("folder locked"));
}
