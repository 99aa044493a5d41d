// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Lazy, depth-first enumeration of Drive items.
//!
//! With root folders the walker descends through an explicit stack of
//! folders; without roots it pages through a single owner-filtered query.
//! Items reachable through several parents are yielded once. A listing
//! failure is recorded and the walk moves on to the next folder.

use log::{debug, error, warn};
use std::collections::{HashSet, VecDeque};
use std::fmt;

use crate::drive::{DriveError, Item, ListingClient};

/// What a single paginated listing enumerates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingSource {
    Folder(String),
    OwnedBy(String),
}

impl fmt::Display for ListingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingSource::Folder(id) => write!(f, "folder {}", id),
            ListingSource::OwnedBy(email) => write!(f, "items owned by {}", email),
        }
    }
}

#[derive(Debug)]
pub struct ListingFailure {
    pub listing: ListingSource,
    pub error: DriveError,
}

/// Ids seen during one run.
#[derive(Debug, Default)]
pub struct VisitedSet {
    emitted: HashSet<String>,
    expanded: HashSet<String>,
}

impl VisitedSet {
    /// Returns false if the item was already emitted.
    pub fn mark_emitted(&mut self, id: &str) -> bool {
        self.emitted.insert(id.to_string())
    }

    /// Returns false if the folder was already listed.
    pub fn mark_expanded(&mut self, id: &str) -> bool {
        self.expanded.insert(id.to_string())
    }

    pub fn emitted_count(&self) -> usize {
        self.emitted.len()
    }
}

struct Cursor {
    listing: ListingSource,
    page_token: Option<String>,
}

pub struct TreeWalker<'a, L: ListingClient + ?Sized> {
    client: &'a L,
    descend: bool,
    work: Vec<ListingSource>,
    current: Option<Cursor>,
    buffer: VecDeque<Item>,
    visited: VisitedSet,
    failures: Vec<ListingFailure>,
}

impl<'a, L: ListingClient + ?Sized> TreeWalker<'a, L> {
    /// Walk the subtrees under `roots`, or everything owned by
    /// `source_email` when `roots` is empty. Roots are not yielded.
    pub fn new(client: &'a L, roots: &[String], source_email: &str) -> Self {
        let (descend, work) = if roots.is_empty() {
            (false, vec![ListingSource::OwnedBy(source_email.to_string())])
        } else {
            // Reversed so the first root is popped first.
            let work = roots
                .iter()
                .rev()
                .map(|id| ListingSource::Folder(id.clone()))
                .collect();
            (true, work)
        };

        Self {
            client,
            descend,
            work,
            current: None,
            buffer: VecDeque::new(),
            visited: VisitedSet::default(),
            failures: Vec::new(),
        }
    }

    /// Next not-yet-seen item, or `None` once every listing is exhausted.
    pub async fn next_item(&mut self) -> Option<Item> {
        loop {
            while let Some(item) = self.buffer.pop_front() {
                if !self.visited.mark_emitted(&item.id) {
                    debug!("Already visited {} ({}), skipping", item.name, item.id);
                    continue;
                }
                if self.descend && item.is_folder() {
                    self.work.push(ListingSource::Folder(item.id.clone()));
                }
                return Some(item);
            }

            let cursor = match self.current.take() {
                Some(cursor) => cursor,
                None => match self.next_listing() {
                    Some(listing) => Cursor { listing, page_token: None },
                    None => return None,
                },
            };
            self.fetch_page(cursor).await;
        }
    }

    /// Drain the walker into a vector.
    pub async fn collect_all(&mut self) -> Vec<Item> {
        let mut items = Vec::new();
        while let Some(item) = self.next_item().await {
            items.push(item);
        }
        items
    }

    pub fn failures(&self) -> &[ListingFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<ListingFailure> {
        self.failures
    }

    pub fn discovered(&self) -> usize {
        self.visited.emitted_count()
    }

    fn next_listing(&mut self) -> Option<ListingSource> {
        while let Some(listing) = self.work.pop() {
            if let ListingSource::Folder(id) = &listing {
                if !self.visited.mark_expanded(id) {
                    debug!("Folder {} already listed, skipping", id);
                    continue;
                }
            }
            return Some(listing);
        }
        None
    }

    async fn fetch_page(&mut self, cursor: Cursor) {
        let page_token = cursor.page_token.clone();
        let result = match &cursor.listing {
            ListingSource::Folder(id) => self.client.list_children(id, page_token).await,
            ListingSource::OwnedBy(email) => self.client.list_owned_by(email, page_token).await,
        };

        match result {
            Ok(page) => {
                debug!("Listed {} item(s) from {}", page.items.len(), cursor.listing);
                self.buffer.extend(page.items);

                match page.next_page_token {
                    Some(next) if cursor.page_token.as_deref() == Some(next.as_str()) => {
                        warn!("Listing of {} returned the same page token twice, stopping", cursor.listing);
                    }
                    Some(next) => {
                        self.current = Some(Cursor {
                            listing: cursor.listing,
                            page_token: Some(next),
                        });
                    }
                    None => {}
                }
            }
            Err(e) => {
                error!("Failed to list {}: {}; skipping it", cursor.listing, e);
                self.failures.push(ListingFailure {
                    listing: cursor.listing,
                    error: e,
                });
            }
        }
    }
}
