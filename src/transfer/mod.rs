// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

pub mod runner;
pub mod state_machine;
pub mod walker;

pub use runner::{BatchRunner, ItemOutcome, Outcome, PlannedAction, RunOptions, TransferSummary};
pub use state_machine::{OwnershipTransfer, TransferState, TransferStep, TransferTask};
pub use walker::{ListingFailure, ListingSource, TreeWalker, VisitedSet};
