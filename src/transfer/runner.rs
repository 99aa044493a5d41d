// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use log::{debug, info};
use std::fmt;

use crate::drive::{Item, ListingClient, TransferClient};

use super::state_machine::{OwnershipTransfer, TransferState, TransferStep, TransferTask};
use super::walker::{ListingFailure, TreeWalker};

/// Parameters of one batch run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source_email: String,
    pub target_email: String,
    /// Empty means every item owned by `source_email`.
    pub folder_ids: Vec<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Transferred,
    SkippedNotOwner { owner: Option<String> },
    SkippedDryRun,
    Failed { step: TransferStep, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub item_id: String,
    pub name: String,
    pub outcome: Outcome,
}

/// A call a dry run would have made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    pub item_id: String,
    pub name: String,
    pub step: TransferStep,
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step {
            TransferStep::GrantEdit => write!(f, "would grant editor access on {} ({})", self.name, self.item_id),
            TransferStep::RequestOwnership => {
                write!(f, "would transfer ownership of {} ({})", self.name, self.item_id)
            }
        }
    }
}

#[derive(Debug)]
pub struct TransferSummary {
    pub target_email: String,
    pub dry_run: bool,
    pub outcomes: Vec<ItemOutcome>,
    pub planned_actions: Vec<PlannedAction>,
    pub listing_failures: Vec<ListingFailure>,
}

impl TransferSummary {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }

    pub fn transferred(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Transferred))
    }

    pub fn skipped_not_owner(&self) -> usize {
        self.count(|o| matches!(o, Outcome::SkippedNotOwner { .. }))
    }

    pub fn skipped_dry_run(&self) -> usize {
        self.count(|o| matches!(o, Outcome::SkippedDryRun))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn outcome_for(&self, item_id: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.item_id == item_id)
            .map(|o| &o.outcome)
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0 || !self.listing_failures.is_empty()
    }
}

impl fmt::Display for TransferSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            writeln!(f, "Dry run: no changes were made.")?;
            if !self.planned_actions.is_empty() {
                writeln!(f, "Planned actions (target {}):", self.target_email)?;
                for action in &self.planned_actions {
                    writeln!(f, "  {}", action)?;
                }
            }
        }

        writeln!(f, "Summary:")?;
        writeln!(f, "  items examined:      {}", self.total())?;
        writeln!(f, "  transferred:         {}", self.transferred())?;
        writeln!(f, "  skipped (not owner): {}", self.skipped_not_owner())?;
        writeln!(f, "  skipped (dry run):   {}", self.skipped_dry_run())?;
        writeln!(f, "  failed:              {}", self.failed())?;
        write!(f, "  listing failures:    {}", self.listing_failures.len())?;

        let failed: Vec<_> = self
            .outcomes
            .iter()
            .filter_map(|o| match &o.outcome {
                Outcome::Failed { step, error } => Some((o, step, error)),
                _ => None,
            })
            .collect();
        if !failed.is_empty() {
            write!(f, "\nFailed items:")?;
            for (o, step, error) in failed {
                write!(f, "\n  {} ({}): could not {}: {}", o.name, o.item_id, step, error)?;
            }
        }
        if !self.listing_failures.is_empty() {
            write!(f, "\nListing failures:")?;
            for failure in &self.listing_failures {
                write!(f, "\n  {}: {}", failure.listing, failure.error)?;
            }
        }
        Ok(())
    }
}

/// Walks the selected items and transfers each one owned by the source
/// account, strictly one at a time.
pub struct BatchRunner<'a, L: ListingClient + ?Sized, T: TransferClient + ?Sized> {
    listing: &'a L,
    transfer: &'a T,
}

impl<'a, L: ListingClient + ?Sized, T: TransferClient + ?Sized> BatchRunner<'a, L, T> {
    pub fn new(listing: &'a L, transfer: &'a T) -> Self {
        Self { listing, transfer }
    }

    /// Per-item and per-listing failures are recorded in the summary; this
    /// never aborts early.
    pub async fn run(&self, options: &RunOptions) -> TransferSummary {
        if options.folder_ids.is_empty() {
            info!("Scanning all items owned by {}", options.source_email);
        } else {
            info!("Scanning {} folder(s): {}", options.folder_ids.len(), options.folder_ids.join(", "));
        }

        let mut walker = TreeWalker::new(self.listing, &options.folder_ids, &options.source_email);
        let machine = OwnershipTransfer::new(self.transfer);
        let mut outcomes = Vec::new();
        let mut planned_actions = Vec::new();

        while let Some(item) = walker.next_item().await {
            let outcome = self.process(&machine, options, &item, &mut planned_actions).await;
            outcomes.push(ItemOutcome {
                item_id: item.id,
                name: item.name,
                outcome,
            });
        }

        let summary = TransferSummary {
            target_email: options.target_email.clone(),
            dry_run: options.dry_run,
            outcomes,
            planned_actions,
            listing_failures: walker.into_failures(),
        };
        info!(
            "Done: {} examined, {} transferred, {} failed",
            summary.total(),
            summary.transferred(),
            summary.failed()
        );
        summary
    }

    async fn process(
        &self,
        machine: &OwnershipTransfer<'_, T>,
        options: &RunOptions,
        item: &Item,
        planned_actions: &mut Vec<PlannedAction>,
    ) -> Outcome {
        if !item.is_owned_by(&options.source_email) {
            debug!(
                "Skipping {} ({}): owned by {}",
                item.name,
                item.id,
                item.owner_email.as_deref().unwrap_or("nobody")
            );
            return Outcome::SkippedNotOwner {
                owner: item.owner_email.clone(),
            };
        }

        let task = TransferTask {
            item: item.clone(),
            source_email: options.source_email.clone(),
            target_email: options.target_email.clone(),
            dry_run: options.dry_run,
        };

        match machine.run(&task).await {
            TransferState::Done if options.dry_run => {
                for step in [TransferStep::GrantEdit, TransferStep::RequestOwnership] {
                    planned_actions.push(PlannedAction {
                        item_id: item.id.clone(),
                        name: item.name.clone(),
                        step,
                    });
                }
                Outcome::SkippedDryRun
            }
            TransferState::Done => Outcome::Transferred,
            TransferState::Failed { step, error } => Outcome::Failed {
                step,
                error: error.to_string(),
            },
            // run() only returns terminal states
            _ => Outcome::Failed {
                step: TransferStep::RequestOwnership,
                error: "transfer ended in a non-terminal state".to_string(),
            },
        }
    }
}
