//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the Supabase project URL and anon key, the last email used to sign in,
//! and the query cache time-to-live.
//!
//! Configuration is stored at `~/.config/statsor/config.json`. Environment
//! variables (`STATSOR_SUPABASE_URL`, `STATSOR_SUPABASE_ANON_KEY`,
//! `STATSOR_CACHE_TTL_MINUTES`) override the file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::DEFAULT_TTL_MINUTES;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "statsor";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_SUPABASE_URL: &str = "STATSOR_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "STATSOR_SUPABASE_ANON_KEY";
pub const ENV_CACHE_TTL_MINUTES: &str = "STATSOR_CACHE_TTL_MINUTES";

/// Longest accepted cache TTL (one week)
pub const MAX_CACHE_TTL_MINUTES: i64 = 7 * 24 * 60;

fn valid_ttl(minutes: i64) -> Option<chrono::Duration> {
    if (0..=MAX_CACHE_TTL_MINUTES).contains(&minutes) {
        chrono::Duration::try_minutes(minutes)
    } else {
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub last_email: Option<String>,
    pub cache_ttl_minutes: Option<i64>,
}

impl Config {
    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Apply overrides from a variable lookup (normally the process env).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_SUPABASE_URL).filter(|v| !v.is_empty()) {
            self.supabase_url = Some(url);
        }
        if let Some(key) = lookup(ENV_SUPABASE_ANON_KEY).filter(|v| !v.is_empty()) {
            self.supabase_anon_key = Some(key);
        }
        if let Some(ttl) = lookup(ENV_CACHE_TTL_MINUTES) {
            match ttl.trim().parse::<i64>() {
                Ok(minutes) if valid_ttl(minutes).is_some() => {
                    self.cache_ttl_minutes = Some(minutes)
                }
                _ => warn!(value = %ttl, "Ignoring invalid {}", ENV_CACHE_TTL_MINUTES),
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// The configured cache TTL. Values outside `0..=MAX_CACHE_TTL_MINUTES`
    /// (a hand-edited config file can hold anything) fall back to the default.
    pub fn cache_ttl(&self) -> chrono::Duration {
        let default = chrono::Duration::minutes(DEFAULT_TTL_MINUTES);
        match self.cache_ttl_minutes {
            None => default,
            Some(minutes) => valid_ttl(minutes).unwrap_or_else(|| {
                warn!(minutes, "Ignoring out-of-range cache TTL");
                default
            }),
        }
    }

    /// Project URL and anon key, if both are configured.
    pub fn supabase(&self) -> Option<(&str, &str)> {
        match (&self.supabase_url, &self.supabase_anon_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }
}
