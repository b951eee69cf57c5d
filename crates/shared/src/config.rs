use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::interest::InterestFilter;

pub const DEFAULT_EMAIL_TITLE: &str = "New Papers in Your Interest Area";
pub const DEFAULT_MAX_RESULTS: u32 = 20;

/// On-disk configuration document. Field names (including the camelCase
/// `lastUpdate`) match the original config.json layout so existing files
/// keep loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_schedule: Option<f64>,
    #[serde(default = "default_email_title")]
    pub email_title: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default)]
    pub interests: Vec<InterestFilter>,
    #[serde(
        rename = "lastUpdate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_update: Option<String>,
}

fn default_email_title() -> String {
    DEFAULT_EMAIL_TITLE.to_string()
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            notification_schedule: None,
            email_title: default_email_title(),
            max_results: default_max_results(),
            interests: Vec::new(),
            last_update: None,
        }
    }
}

/// Owns the configuration for the lifetime of one run: loaded once at
/// startup, written back at shutdown only if something changed.
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
    dirty: bool,
    first_run: bool,
}

impl ConfigStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(Self {
                path,
                config,
                dirty: false,
                first_run: false,
            })
        } else {
            println!("Creating new configuration.");
            Ok(Self {
                path,
                config: Config::default(),
                dirty: true,
                first_run: true,
            })
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when no config file existed at load time.
    pub fn is_first_run(&self) -> bool {
        self.first_run
    }

    pub fn register_personal_details(
        &mut self,
        name: String,
        email: String,
        notification_schedule: Option<f64>,
        email_title: Option<String>,
    ) {
        self.config.name = name;
        self.config.email = email;
        self.config.notification_schedule = notification_schedule;
        self.config.email_title = email_title.unwrap_or_else(default_email_title);
        self.config.max_results = default_max_results();
        self.dirty = true;
    }

    /// Append an interest. Duplicate (category, query) pairs are allowed.
    pub fn register_interest(&mut self, filter: InterestFilter) {
        self.config.interests.push(filter);
        self.dirty = true;
    }

    pub fn remove_interest(&mut self, id: usize) -> Option<InterestFilter> {
        if id >= self.config.interests.len() {
            return None;
        }
        self.dirty = true;
        Some(self.config.interests.remove(id))
    }

    /// Advance the last-update stamp. The stamp format sorts
    /// lexicographically, so this keeps `lastUpdate` monotonically
    /// non-decreasing even if a caller passes an older window end.
    pub fn mark_updated(&mut self, stamp: String) {
        if let Some(current) = &self.config.last_update {
            if *current >= stamp {
                return;
            }
        }
        self.config.last_update = Some(stamp);
        self.dirty = true;
    }

    /// Write the config back if any mutation occurred this run.
    pub fn save_if_dirty(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        let json =
            serde_json::to_string(&self.config).context("Failed to serialize configuration")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write config file: {}", self.path.display()))?;
        self.dirty = false;
        Ok(true)
    }
}

/// Sending-mailbox credentials, read once at startup from the environment
/// and passed explicitly to whatever needs them.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        // A .env in the working directory is honored if present.
        let _ = dotenvy::dotenv();

        let email = env::var("ARXIVSCAN_EMAIL").context(
            "ARXIVSCAN_EMAIL not set.\n\n\
            Please set the environment variables ARXIVSCAN_EMAIL and ARXIVSCAN_PASSWORD\n\
            with the address and password of the sending mailbox.",
        )?;
        let password = env::var("ARXIVSCAN_PASSWORD").context(
            "ARXIVSCAN_PASSWORD not set.\n\n\
            Please set the environment variables ARXIVSCAN_EMAIL and ARXIVSCAN_PASSWORD\n\
            with the address and password of the sending mailbox.",
        )?;

        Ok(Self { email, password })
    }
}
