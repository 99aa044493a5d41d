// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line surface and the wiring from arguments to a batch run.

use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::oauth_service::OAuthService;
use crate::auth::{ClientSecret, CredentialProvider, FileTokenStore, GoogleOAuthFlow};
use crate::config::Settings;
use crate::drive::HttpDriveClient;
use crate::error::SetupError;
use crate::transfer::{BatchRunner, RunOptions, TransferSummary};

/// Exit status of a run that got past setup, even if items failed.
pub const EXIT_OK: u8 = 0;
/// Exit status when arguments, settings or credentials are unusable.
pub const EXIT_SETUP_FAILURE: u8 = 1;

const LONG_ABOUT: &str = "\
Transfer ownership of Google Drive files and folders from one account to another.

For every selected item owned by the source account, the target account is
first granted editor access and then offered ownership. Google emails the
target a pending-ownership request for each item, and the target must accept
each one before ownership actually changes. Use --dry-run to preview.";

#[derive(Parser, Debug, Clone)]
#[command(name = "gdrive-transfer", version, about = "Transfer Google Drive ownership between accounts", long_about = LONG_ABOUT)]
pub struct Cli {
    /// Path to the OAuth client secret JSON downloaded from Google Cloud
    #[arg(long, env = "GDRIVE_TRANSFER_CLIENT_SECRET", default_value = "client_secret.json")]
    pub client_secret: PathBuf,

    /// Where the OAuth token is cached between runs
    #[arg(long, env = "GDRIVE_TRANSFER_TOKEN", default_value = "token.json")]
    pub token: PathBuf,

    /// Account that currently owns the items
    #[arg(long)]
    pub source_email: String,

    /// Account that should receive ownership
    #[arg(long)]
    pub target_email: String,

    /// Folder to transfer recursively; repeatable. Without it, every item
    /// owned by the source account is selected.
    #[arg(long = "folder-id", value_name = "FOLDER_ID")]
    pub folder_ids: Vec<String>,

    /// Log the actions that would be taken without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Optional TOML file with tuning settings
    #[arg(long, env = "GDRIVE_TRANSFER_CONFIG")]
    pub config: Option<String>,

    /// Log filter, overrides the configured level (e.g. "debug")
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Reject argument combinations that would make the run meaningless.
    pub fn validate(&self) -> Result<(), SetupError> {
        for (flag, email) in [("--source-email", &self.source_email), ("--target-email", &self.target_email)] {
            let email = email.trim();
            if email.is_empty() || !email.contains('@') {
                return Err(SetupError::InvalidArgument(format!(
                    "{} must be an email address, got '{}'",
                    flag, email
                )));
            }
        }
        if self.source_email.trim().eq_ignore_ascii_case(self.target_email.trim()) {
            return Err(SetupError::InvalidArgument(
                "--source-email and --target-email must differ".to_string(),
            ));
        }
        if self.folder_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(SetupError::InvalidArgument("--folder-id must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn run_options(&self) -> RunOptions {
        let mut folder_ids: Vec<String> = Vec::new();
        for id in &self.folder_ids {
            let id = id.trim().to_string();
            if !folder_ids.contains(&id) {
                folder_ids.push(id);
            }
        }
        RunOptions {
            source_email: self.source_email.trim().to_string(),
            target_email: self.target_email.trim().to_string(),
            folder_ids,
            dry_run: self.dry_run,
        }
    }
}

/// Authorize, then walk and transfer. Only setup problems are errors; item
/// and listing failures are reported in the returned summary.
pub async fn run(cli: &Cli, settings: &Settings) -> Result<TransferSummary, SetupError> {
    cli.validate()?;
    let options = cli.run_options();

    let client_secret = ClientSecret::from_file(&cli.client_secret)?;
    let service = OAuthService::new(client_secret.clone(), settings.oauth.scopes.clone());
    let provider = Arc::new(CredentialProvider::new(
        Box::new(FileTokenStore::new(&cli.token)),
        Box::new(GoogleOAuthFlow::new(service, settings.oauth.redirect_host.clone())),
        client_secret,
        settings.oauth.scopes.clone(),
        settings.oauth.expiry_margin_secs,
    ));
    provider.ensure_authorized().await?;
    info!("Authorized; token cached at {}", cli.token.display());

    let drive = HttpDriveClient::new(settings, provider)?;

    if options.dry_run {
        info!("Dry run: no permissions will be changed");
    } else {
        warn!(
            "Google will email {} an ownership request for every transferred item; each must be accepted",
            options.target_email
        );
    }

    Ok(BatchRunner::new(&drive, &drive).run(&options).await)
}

/// Report a finished run and pick the process exit status. Item and
/// listing failures are part of the summary and still exit with `EXIT_OK`.
pub fn finish(result: Result<TransferSummary, SetupError>) -> u8 {
    match result {
        Ok(summary) => {
            println!("{}", summary);
            if summary.has_failures() {
                warn!("Some items or folders could not be processed; re-run to retry them");
            }
            EXIT_OK
        }
        Err(e) => {
            error!("{}", e);
            EXIT_SETUP_FAILURE
        }
    }
}
