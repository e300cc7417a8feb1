//! Application settings storage
//!
//! Stores configuration like the Gemini API key in a JSON file in the user's
//! config directory. Every field has a default, so a missing or unreadable
//! file simply yields `Settings::default()`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable checked before the stored key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const APP_DIR: &str = "journal-harvest";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    /// Gemini model used for both queries (default: "gemini-2.5-flash")
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Root directory downloads and reports are written under
    #[serde(default = "default_download_dir")]
    pub download_dir: String,
    #[serde(default = "default_journal")]
    pub default_journal: String,
    #[serde(default = "default_issue")]
    pub default_issue: String,
    /// Per-request timeout; None waits indefinitely
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_download_dir() -> String {
    "downloads".to_string()
}

fn default_journal() -> String {
    "Journal of Political Economy".to_string()
}

fn default_issue() -> String {
    "2025, Issue 4".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model: default_model(),
            api_base_url: default_api_base_url(),
            download_dir: default_download_dir(),
            default_journal: default_journal(),
            default_issue: default_issue(),
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Default location: `<config dir>/journal-harvest/settings.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(SETTINGS_FILE)
    }

    /// Load settings from disk or create default
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    tracing::warn!("[Settings] Ignoring unreadable {}: {}", path.display(), e);
                    Settings::default()
                }),
                Err(_) => Settings::default(),
            }
        } else {
            Settings::default()
        }
    }

    /// Save settings to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Settings(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content)
            .map_err(|e| Error::Settings(format!("Failed to write settings: {}", e)))?;

        Ok(())
    }

    /// Store a new API key and persist it
    pub fn set_api_key(&mut self, key: String, path: &Path) -> Result<()> {
        self.gemini_api_key = if key.is_empty() { None } else { Some(key) };
        self.save(path)?;
        tracing::info!("[Settings] API key saved to {}", path.display());
        Ok(())
    }
}

/// Mask an API key for display (shows first 8 / last 4 chars)
pub fn mask_api_key(key: &str) -> String {
    if key.len() > 12 && key.is_ascii() {
        format!("{}...{}", &key[..8], &key[key.len() - 4..])
    } else {
        "*".repeat(key.chars().count())
    }
}

/// Where a resolved API key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    Settings,
    Prompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub key: String,
    pub source: KeySource,
}

impl ResolvedKey {
    /// Only a key typed at the prompt is worth saving; environment and
    /// stored keys are already available on the next run.
    pub fn should_persist(&self, remember: bool) -> bool {
        remember && self.source == KeySource::Prompt
    }
}

/// Resolve the API key: environment first, then stored settings, then the
/// interactive `prompt`. Fails with `MissingCredential` when all are empty.
///
/// Both lookups are injected so callers and tests control where keys come from.
pub fn resolve_api_key<E, P>(env_lookup: E, settings: &Settings, prompt: P) -> Result<ResolvedKey>
where
    E: FnOnce(&str) -> Option<String>,
    P: FnOnce() -> std::io::Result<String>,
{
    let resolved = |key: &str, source| ResolvedKey { key: key.to_string(), source };

    // Environment variable takes precedence
    if let Some(key) = env_lookup(API_KEY_ENV) {
        let key = key.trim();
        if !key.is_empty() {
            return Ok(resolved(key, KeySource::Environment));
        }
    }

    if let Some(key) = settings.gemini_api_key.as_deref().map(str::trim) {
        if !key.is_empty() {
            return Ok(resolved(key, KeySource::Settings));
        }
    }

    let entered = prompt()?;
    let entered = entered.trim();
    if entered.is_empty() {
        return Err(Error::MissingCredential);
    }
    Ok(resolved(entered, KeySource::Prompt))
}
