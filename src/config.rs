// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::auth::DRIVE_SCOPE;

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

/// Drive rejects larger `pageSize` values.
const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthSettings {
    pub scopes: Vec<String>,
    /// Host the loopback redirect listener binds to.
    pub redirect_host: String,
    /// Refresh this many seconds before the recorded expiry.
    pub expiry_margin_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub http_timeout_secs: u64,
    pub folder_page_size: u32,
    pub owner_page_size: u32,
    pub retry: RetryConfig,
    pub oauth: OAuthSettings,
    pub log: LogConfig,
}

impl Settings {
    /// Defaults, then the optional TOML file, then `GDRIVE_TRANSFER_*`
    /// environment variables (`__` separates nested keys, e.g.
    /// `GDRIVE_TRANSFER_RETRY__MAX_RETRIES=5`).
    pub fn new(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        let mut config_builder = config::Config::builder()
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("http_timeout_secs", defaults.http_timeout_secs)?
            .set_default("folder_page_size", defaults.folder_page_size)?
            .set_default("owner_page_size", defaults.owner_page_size)?

            // Retry defaults
            .set_default("retry.max_retries", defaults.retry.max_retries)?
            .set_default("retry.initial_backoff_ms", defaults.retry.initial_backoff_ms)?
            .set_default("retry.max_backoff_ms", defaults.retry.max_backoff_ms)?

            // OAuth defaults
            .set_default("oauth.scopes", defaults.oauth.scopes)?
            .set_default("oauth.redirect_host", defaults.oauth.redirect_host)?
            .set_default("oauth.expiry_margin_secs", defaults.oauth.expiry_margin_secs)?

            // Log defaults
            .set_default("log.level", defaults.log.level)?;

        if let Some(path) = config_path {
            config_builder = config_builder.add_source(File::with_name(path));
        }

        config_builder = config_builder.add_source(
            Environment::with_prefix("GDRIVE_TRANSFER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .ignore_empty(true),
        );

        let settings: Settings = config_builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("folder_page_size", self.folder_page_size),
            ("owner_page_size", self.owner_page_size),
        ] {
            if value == 0 || value > MAX_PAGE_SIZE {
                return Err(ConfigError::Message(format!(
                    "{} must be between 1 and {}, got {}",
                    key, MAX_PAGE_SIZE, value
                )));
            }
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::Message("http_timeout_secs must be positive".to_string()));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(ConfigError::Message(
                "retry.initial_backoff_ms must not exceed retry.max_backoff_ms".to_string(),
            ));
        }
        if self.oauth.scopes.is_empty() {
            return Err(ConfigError::Message("oauth.scopes must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig { level: "info".to_string() }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
        }
    }
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            scopes: vec![DRIVE_SCOPE.to_string()],
            redirect_host: "127.0.0.1".to_string(),
            expiry_margin_secs: 60,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            http_timeout_secs: 30,
            folder_page_size: 200,
            owner_page_size: 1000,
            retry: RetryConfig::default(),
            oauth: OAuthSettings::default(),
            log: LogConfig::default(),
        }
    }
}
