// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Drive data model and the wire DTOs it is decoded from.

use serde::{Deserialize, Serialize};

/// MIME type Drive uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Folder,
}

impl ItemKind {
    pub fn from_mime_type(mime_type: &str) -> Self {
        if mime_type == FOLDER_MIME_TYPE {
            ItemKind::Folder
        } else {
            ItemKind::File
        }
    }
}

/// A file or folder as seen by the walker. Fetched fresh every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    pub mime_type: String,
    /// Shared-drive items have no owner.
    pub owner_email: Option<String>,
    pub parent_id: Option<String>,
}

impl Item {
    pub fn is_folder(&self) -> bool {
        self.kind == ItemKind::Folder
    }

    /// Email comparison is ASCII case-insensitive.
    pub fn is_owned_by(&self, email: &str) -> bool {
        self.owner_email
            .as_deref()
            .map(|owner| owner.eq_ignore_ascii_case(email))
            .unwrap_or(false)
    }
}

/// One page of a listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPage {
    pub items: Vec<Item>,
    pub next_page_token: Option<String>,
}

/// A permission record as returned by the permissions endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: Option<String>,
    pub role: Option<String>,
    #[serde(rename = "type")]
    pub permission_type: Option<String>,
    pub email_address: Option<String>,
    pub pending_owner: Option<bool>,
}

// --- Wire DTOs ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileListDto {
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub files: Vec<FileDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileDto {
    pub id: String,
    pub name: Option<String>,
    pub mime_type: Option<String>,
    #[serde(default)]
    pub owners: Vec<OwnerDto>,
    #[serde(default)]
    pub parents: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OwnerDto {
    pub email_address: Option<String>,
}

impl From<FileDto> for Item {
    fn from(dto: FileDto) -> Self {
        let mime_type = dto.mime_type.unwrap_or_default();
        Item {
            kind: ItemKind::from_mime_type(&mime_type),
            name: dto.name.unwrap_or_else(|| "(untitled)".to_string()),
            owner_email: dto.owners.into_iter().find_map(|o| o.email_address),
            parent_id: dto.parents.into_iter().next(),
            id: dto.id,
            mime_type,
        }
    }
}

impl From<FileListDto> for ItemPage {
    fn from(dto: FileListDto) -> Self {
        ItemPage {
            items: dto.files.into_iter().map(Item::from).collect(),
            // Drive sometimes returns an empty token on the last page
            next_page_token: dto.next_page_token.filter(|t| !t.is_empty()),
        }
    }
}
