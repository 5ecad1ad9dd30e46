use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::note::patch::PatchOptions;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct NoteportConfig {
    pub server: ServerConfig,
    pub vault: VaultConfig,
    pub rate_limit: RateLimitConfig,
    pub dataview: DataviewConfig,
    pub patch: PatchConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// Shared secret expected in the `X-API-Key` header.
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VaultConfig {
    pub path: String,
    /// Display name; empty means the vault directory's name.
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataviewConfig {
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PatchConfig {
    /// Match heading targets literally instead of as regex syntax.
    pub literal_headings: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 27125,
            log_level: "info".into(),
            api_key: String::new(),
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: "~/notes".into(),
            name: String::new(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_secs: 60,
        }
    }
}

impl Default for DataviewConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Returns `~/.noteport/`
pub fn default_noteport_dir() -> PathBuf {
    home_dir().join(".noteport")
}

/// Returns the default config file path: `~/.noteport/config.toml`
pub fn default_config_path() -> PathBuf {
    default_noteport_dir().join("config.toml")
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl NoteportConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            NoteportConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `NOTEPORT_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("NOTEPORT_API_KEY") {
            self.server.api_key = val;
        }
        if let Some(val) = var("NOTEPORT_VAULT") {
            self.vault.path = val;
        }
        if let Some(val) = var("NOTEPORT_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("NOTEPORT_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Some(val) = var("NOTEPORT_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %val, "ignoring invalid NOTEPORT_PORT"),
            }
        }
        if let Some(val) = var("NOTEPORT_RATE_LIMIT") {
            match val.parse() {
                Ok(max) => self.rate_limit.max_requests = max,
                Err(_) => warn!(value = %val, "ignoring invalid NOTEPORT_RATE_LIMIT"),
            }
        }
    }

    /// Resolve the vault directory, expanding `~` if needed.
    pub fn resolved_vault_path(&self) -> PathBuf {
        expand_tilde(&self.vault.path)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn patch_options(&self) -> PatchOptions {
        PatchOptions {
            literal_headings: self.patch.literal_headings,
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        home_dir()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home_dir().join(rest)
    } else {
        PathBuf::from(path)
    }
}
