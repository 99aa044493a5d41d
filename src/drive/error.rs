// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use serde::Deserialize;
use thiserror::Error;

use crate::auth::error::AuthError;

/// Errors from Drive API calls.
#[derive(Debug, Error)]
pub enum DriveError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Drive API returned HTTP {status}{}: {message}", .reason.as_deref().map(|r| format!(" ({})", r)).unwrap_or_default())]
    Api {
        status: u16,
        reason: Option<String>,
        message: String,
    },

    #[error("Failed to decode Drive response: {0}")]
    Decode(String),

    #[error("Drive response is missing field: {0}")]
    MissingField(&'static str),

    #[error("Could not obtain access token: {0}")]
    Auth(#[from] AuthError),
}

impl DriveError {
    /// HTTP status for API errors, `None` for transport-level failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            DriveError::Api { status, .. } => Some(*status),
            DriveError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Build an `Api` error from a non-2xx status and the raw response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => DriveError::Api {
                status,
                reason: envelope
                    .error
                    .errors
                    .into_iter()
                    .find_map(|e| e.reason),
                message: envelope.error.message.unwrap_or_default(),
            },
            Err(_) => DriveError::Api {
                status,
                reason: None,
                message: body.trim().to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}
