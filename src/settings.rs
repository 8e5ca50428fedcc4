use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::paths::APP_NAME;
use crate::types::{ALL_FILTER, DEFAULT_CATEGORIES};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ROOT: &str = ".";
const DEFAULT_ENTRY: &str = "index.html";
const DEFAULT_API_BASE: &str = "https://www.googleapis.com";
const DEFAULT_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const MIN_REQUEST_TIMEOUT_MS: u64 = 1_000;
const MAX_REQUEST_TIMEOUT_MS: u64 = 120_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub default_categories: Vec<String>,
    pub server: ServerSettings,
    pub sync: SyncSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    pub root: PathBuf,
    pub entry: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub api_base: String,
    pub userinfo_url: String,
    pub request_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_categories: default_categories(),
            server: ServerSettings::default(),
            sync: SyncSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            root: PathBuf::from(DEFAULT_ROOT),
            entry: DEFAULT_ENTRY.to_string(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            userinfo_url: DEFAULT_USERINFO_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

fn resolve_port(env_port: Option<&str>, cli_port: Option<u16>, configured: u16) -> u16 {
    env_port
        .and_then(|raw| raw.trim().parse::<u16>().ok())
        .filter(|port| *port != 0)
        .or(cli_port.filter(|port| *port != 0))
        .unwrap_or(configured)
}

fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|name| name.to_string()).collect()
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push(APP_NAME);
        path.push("settings.toml");
        Some(path)
    }

    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(mut settings) => {
                    settings.validate();
                    settings
                }
                Err(error) => {
                    warn!(
                        "failed to parse settings config '{}': {}",
                        path.display(),
                        error
                    );
                    Self::default()
                }
            },
            Err(error) => {
                warn!(
                    "failed to read settings config '{}': {}",
                    path.display(),
                    error
                );
                Self::default()
            }
        }
    }

    /// Port for the static server: `PORT` from the environment, then
    /// `cli_port`, then the configured port.
    pub fn effective_port(&self, cli_port: Option<u16>) -> u16 {
        resolve_port(std::env::var("PORT").ok().as_deref(), cli_port, self.server.port)
    }

    fn validate(&mut self) {
        if self.server.port == 0 {
            warn!("invalid server port 0 in settings config; falling back to {DEFAULT_PORT}");
            self.server.port = DEFAULT_PORT;
        }

        if self.server.entry.trim().is_empty() {
            self.server.entry = DEFAULT_ENTRY.to_string();
        }

        self.sync.request_timeout_ms = self
            .sync
            .request_timeout_ms
            .clamp(MIN_REQUEST_TIMEOUT_MS, MAX_REQUEST_TIMEOUT_MS);
        self.sync.api_base = self.sync.api_base.trim_end_matches('/').to_string();
        if self.sync.api_base.is_empty() {
            self.sync.api_base = DEFAULT_API_BASE.to_string();
        }
        if self.sync.userinfo_url.trim().is_empty() {
            self.sync.userinfo_url = DEFAULT_USERINFO_URL.to_string();
        }

        let mut categories: Vec<String> = Vec::with_capacity(self.default_categories.len());
        for name in &self.default_categories {
            let name = name.trim();
            if name.is_empty() || name == ALL_FILTER {
                warn!("ignoring invalid default category '{name}' in settings config");
                continue;
            }
            if !categories.iter().any(|existing| existing == name) {
                categories.push(name.to_string());
            }
        }
        self.default_categories = categories;
    }
}
