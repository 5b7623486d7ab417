use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::api::Session;
use crate::form::Id;

/// Persisted client-side session cache: the auth token, the claims
/// derived from it, and the last-used ids for session continuity. A
/// convenience cache, not a store of record — the backend can invalidate
/// any of it at will.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    /// API base URL override; falls back to ROP_API_BASE, then the default.
    pub api_base: Option<String>,
    pub token: Option<String>,
    pub org_id: Option<Id>,
    pub nickname: Option<String>,
    pub level: Option<u8>,
    pub last_form: Option<Id>,
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            // Use XDG config directory on Linux
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("rop-console")
        } else {
            // Use home directory with dot prefix on Windows/Mac
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".rop-console")
        };

        // Ensure the directory exists
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, creating default config");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        debug!("Saving config to: {:?}", config_path);

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Config saved successfully");
        Ok(())
    }

    /// Restore the cached session, if any. A malformed cached token is
    /// treated as logged out rather than an error.
    pub fn session(&self) -> Option<Session> {
        let token = self.token.as_deref()?;
        match Session::from_token(token) {
            Ok(session) => Some(session),
            Err(e) => {
                log::warn!("Discarding malformed cached token: {}", e);
                None
            }
        }
    }

    /// Cache a session's token and derived claims (init on login, and on
    /// every server-issued refresh).
    pub fn remember_session(&mut self, session: &Session) -> Result<()> {
        self.token = Some(session.token().to_string());
        self.org_id = Some(session.org_id());
        self.nickname = Some(session.nickname().to_string());
        self.level = Some(session.level());
        self.save()
    }

    /// Teardown on logout or expiry: drop the token and every derived
    /// claim, keeping only the API base.
    pub fn clear_session(&mut self) -> Result<()> {
        info!("Clearing cached session");
        self.token = None;
        self.org_id = None;
        self.nickname = None;
        self.level = None;
        self.last_form = None;
        self.save()
    }

    /// Record the last-opened form for session continuity.
    pub fn remember_form(&mut self, form: Id) -> Result<()> {
        self.last_form = Some(form);
        self.save()
    }
}
