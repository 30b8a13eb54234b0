//! User settings file.
//!
//! `$HOME/.genai-gateway/settings.json` supplies fallback values for the
//! gateway's environment variables:
//!
//! ```json
//! { "env": { "GOOGLE_AI_STUDIO_API_KEY": "...", "GEMINI_MODEL": "gemini-2.5-flash" } }
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

/// Directory under `$HOME` holding gateway settings.
pub const SETTINGS_DIR: &str = ".genai-gateway";

/// Environment variable overriding the settings file location.
pub const SETTINGS_PATH_VAR: &str = "GENAI_GATEWAY_SETTINGS";

/// Parsed settings file.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Fallback values keyed by environment variable name.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Settings {
    /// Loads settings from the default location. A missing file yields
    /// empty settings.
    pub fn load() -> Result<Self> {
        let path = match env::var_os(SETTINGS_PATH_VAR) {
            Some(path) => PathBuf::from(path),
            None => Self::get_settings_path()?,
        };
        Self::load_from_path(&path)
    }

    /// Loads settings from `path`.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No settings file");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings = serde_json::from_str::<Self>(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        debug!(path = %path.display(), keys = settings.env.len(), "Loaded settings file");
        Ok(settings)
    }

    /// Returns `$HOME/.genai-gateway/settings.json`.
    pub fn get_settings_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home_dir.join(SETTINGS_DIR).join("settings.json"))
    }

    /// Returns the environment value of `key`, falling back to the file.
    pub fn get_env_var(&self, key: &str) -> Option<String> {
        env::var(key).ok().or_else(|| self.env.get(key).cloned())
    }
}
