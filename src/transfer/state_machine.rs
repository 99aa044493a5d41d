// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-item ownership transfer.
//!
//! Each item moves through
//! `Pending -> GrantedEdit -> OwnershipRequested -> Done`, or lands in
//! `Failed` at the step whose call errored. Nothing is retried at this
//! level and no transition is ever undone.

use log::{debug, error, info};
use std::fmt;

use crate::drive::{DriveError, Item, TransferClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStep {
    GrantEdit,
    RequestOwnership,
}

impl fmt::Display for TransferStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferStep::GrantEdit => write!(f, "grant editor access"),
            TransferStep::RequestOwnership => write!(f, "request ownership transfer"),
        }
    }
}

#[derive(Debug)]
pub enum TransferState {
    Pending,
    /// `permission_id` is `None` only in dry-run mode.
    GrantedEdit { permission_id: Option<String> },
    OwnershipRequested,
    Done,
    Failed { step: TransferStep, error: DriveError },
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Done | TransferState::Failed { .. })
    }
}

/// One item to move from `source_email` to `target_email`.
#[derive(Debug, Clone)]
pub struct TransferTask {
    pub item: Item,
    pub source_email: String,
    pub target_email: String,
    pub dry_run: bool,
}

pub struct OwnershipTransfer<'a, C: TransferClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: TransferClient + ?Sized> OwnershipTransfer<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Drive `task` from `Pending` to a terminal state.
    pub async fn run(&self, task: &TransferTask) -> TransferState {
        let mut state = TransferState::Pending;
        while !state.is_terminal() {
            state = self.step(task, state).await;
        }
        state
    }

    /// Perform a single transition. Terminal states are returned unchanged.
    pub async fn step(&self, task: &TransferTask, state: TransferState) -> TransferState {
        let item = &task.item;
        match state {
            TransferState::Pending if task.dry_run => {
                info!(
                    "[dry-run] Would grant editor access on {} ({}) to {}",
                    item.name, item.id, task.target_email
                );
                TransferState::GrantedEdit { permission_id: None }
            }
            TransferState::Pending => match self.client.grant_editor(&item.id, &task.target_email).await {
                Ok(permission) => match permission.id {
                    Some(permission_id) => {
                        debug!("Granted editor on {} ({}), permission {}", item.name, item.id, permission_id);
                        TransferState::GrantedEdit {
                            permission_id: Some(permission_id),
                        }
                    }
                    None => self.fail(task, TransferStep::GrantEdit, DriveError::MissingField("permission.id")),
                },
                Err(e) => self.fail(task, TransferStep::GrantEdit, e),
            },
            TransferState::GrantedEdit { .. } if task.dry_run => {
                info!(
                    "[dry-run] Would transfer ownership of {} ({}) to {}",
                    item.name, item.id, task.target_email
                );
                TransferState::OwnershipRequested
            }
            TransferState::GrantedEdit { permission_id } => {
                let permission_id = match permission_id {
                    Some(id) => id,
                    None => {
                        return self.fail(
                            task,
                            TransferStep::RequestOwnership,
                            DriveError::MissingField("permission.id"),
                        )
                    }
                };
                match self.client.request_ownership(&item.id, &permission_id).await {
                    Ok(_) => TransferState::OwnershipRequested,
                    Err(e) => self.fail(task, TransferStep::RequestOwnership, e),
                }
            }
            TransferState::OwnershipRequested => {
                if !task.dry_run {
                    info!("Requested ownership transfer: {} ({}) -> {}", item.name, item.id, task.target_email);
                }
                TransferState::Done
            }
            terminal => terminal,
        }
    }

    fn fail(&self, task: &TransferTask, step: TransferStep, error: DriveError) -> TransferState {
        error!("Failed to {} for {} ({}): {}", step, task.item.name, task.item.id, error);
        TransferState::Failed { step, error }
    }
}
