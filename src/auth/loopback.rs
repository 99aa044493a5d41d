// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! One-shot HTTP listener on 127.0.0.1 that receives the OAuth redirect.

use log::{debug, warn};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use url::Url;

use super::error::AuthError;

const MAX_REQUEST_HEAD: usize = 16 * 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(10);

const SUCCESS_PAGE: &str = "<html><body><h3>Authorization complete.</h3>\
    <p>You can close this window and return to the terminal.</p></body></html>";
const FAILURE_PAGE: &str = "<html><body><h3>Authorization failed.</h3>\
    <p>See the terminal for details.</p></body></html>";

pub struct LoopbackListener {
    listener: TcpListener,
    redirect_uri: String,
}

impl LoopbackListener {
    /// Bind an ephemeral port on `host`.
    pub async fn bind(host: &str) -> Result<Self, AuthError> {
        let listener = TcpListener::bind((host, 0)).await?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://{}:{}/", host, port);
        debug!("OAuth loopback listener bound at {}", redirect_uri);
        Ok(Self { listener, redirect_uri })
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Accept connections until one carries the authorization response,
    /// and return the authorization code. Each connection is served on its
    /// own task, so an idle socket (browser preconnect) cannot block the
    /// redirect behind it.
    pub async fn wait_for_code(self, expected_state: &str) -> Result<String, AuthError> {
        let (tx, mut rx) = mpsc::channel::<Result<String, AuthError>>(1);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted?;
                    debug!("OAuth callback connection from {}", peer);

                    let tx = tx.clone();
                    let expected_state = expected_state.to_string();
                    tokio::spawn(async move {
                        if let Some(result) = handle_connection(stream, &expected_state).await {
                            let _ = tx.send(result).await;
                        }
                    });
                }
                Some(result) = rx.recv() => return result,
            }
        }
    }
}

/// Serve one connection. Returns `None` for anything that is not the
/// authorization response.
async fn handle_connection(mut stream: TcpStream, expected_state: &str) -> Option<Result<String, AuthError>> {
    let target = match timeout(READ_TIMEOUT, read_request_target(&mut stream)).await {
        Ok(Ok(target)) => target,
        Ok(Err(e)) => {
            warn!("Ignoring unreadable callback request: {}", e);
            return None;
        }
        Err(_) => {
            debug!("Callback connection sent no request within {:?}, closing", READ_TIMEOUT);
            return None;
        }
    };

    // Browsers also ask for /favicon.ico and the like.
    if !is_authorization_response(&target) {
        respond(&mut stream, "404 Not Found", "").await;
        return None;
    }

    let result = parse_callback(&target, expected_state);
    let page = if result.is_ok() { SUCCESS_PAGE } else { FAILURE_PAGE };
    respond(&mut stream, "200 OK", page).await;
    Some(result)
}

async fn read_request_target(stream: &mut TcpStream) -> Result<String, AuthError> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    while !buffer.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if buffer.len() > MAX_REQUEST_HEAD {
            return Err(AuthError::InvalidCallback("request head too large".to_string()));
        }
    }

    let head = String::from_utf8_lossy(&buffer);
    let request_line = head.lines().next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => Ok(target.to_string()),
        _ => Err(AuthError::InvalidCallback(format!("unexpected request line: {:?}", request_line))),
    }
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        debug!("Failed to write callback response: {}", e);
    }
    let _ = stream.shutdown().await;
}

fn query_pairs(target: &str) -> Result<Vec<(String, String)>, AuthError> {
    let url = Url::parse(&format!("http://localhost{}", target))
        .map_err(|e| AuthError::InvalidCallback(e.to_string()))?;
    Ok(url.query_pairs().into_owned().collect())
}

fn is_authorization_response(target: &str) -> bool {
    query_pairs(target)
        .map(|pairs| pairs.iter().any(|(k, _)| k == "code" || k == "error"))
        .unwrap_or(false)
}

/// Extract the authorization code from a redirect target such as
/// `/?state=...&code=...&scope=...`.
pub(crate) fn parse_callback(target: &str, expected_state: &str) -> Result<String, AuthError> {
    let pairs = query_pairs(target)?;
    let get = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    };

    if let Some(error) = get("error") {
        let description = get("error_description").unwrap_or_default();
        let message = if description.is_empty() {
            error
        } else {
            format!("{} - {}", error, description)
        };
        return Err(AuthError::AuthorizationDenied(message));
    }

    match get("state") {
        Some(state) if state == expected_state => {}
        _ => return Err(AuthError::InvalidState),
    }

    get("code")
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::InvalidCallback("missing authorization code".to_string()))
}
