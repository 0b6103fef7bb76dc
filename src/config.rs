//! Configuration management for Confab
//!
//! Runtime configuration comes from `.env`-style files and environment
//! variables. Precedence, lowest to highest: built-in defaults, the global
//! `.env` in the platform config directory, a local `./.env`, then
//! `CONFAB_*` environment variables.

use std::path::Path;

use directories::ProjectDirs;

use crate::error::{ConfabError, Result};

/// Default model identifier
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default chat completions endpoint
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// API key for the generation service
    pub api_key: String,
    /// Model identifier sent with each request
    pub model: String,
    /// Operating system label included in the system prompt
    pub os: String,
    /// Chat completions endpoint URL
    pub api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            os: default_os_label().to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from `.env` files and environment variables
    ///
    /// Missing files are not errors; each layer simply overrides the one
    /// below it.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(proj_dirs) = ProjectDirs::from("com", "confab-cli", "confab") {
            let global_env = proj_dirs.config_dir().join(".env");
            if config.apply_env_file(&global_env) {
                tracing::debug!(path = %global_env.display(), "Loaded global config");
            }
        }

        if config.apply_env_file(Path::new(".env")) {
            tracing::debug!("Loaded local .env config");
        }

        config.apply_env_vars();

        Ok(config)
    }

    /// Applies a `.env` file's recognized keys, returning true if it existed
    ///
    /// Lines are `KEY=VALUE`; blank lines and `#` comments are skipped,
    /// unrecognized keys are ignored.
    fn apply_env_file(&mut self, path: &Path) -> bool {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return false;
        };

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            self.apply_key(key.trim(), value.trim());
        }

        true
    }

    /// Applies `CONFAB_*` environment variables, the highest-priority layer
    fn apply_env_vars(&mut self) {
        for key in ["CONFAB_API_KEY", "CONFAB_MODEL", "CONFAB_OS", "CONFAB_API_URL"] {
            if let Ok(value) = std::env::var(key) {
                if !value.is_empty() {
                    self.apply_key(key, &value);
                }
            }
        }
    }

    /// Applies one recognized key
    fn apply_key(&mut self, key: &str, value: &str) {
        match key {
            "CONFAB_API_KEY" => self.api_key = value.to_string(),
            "CONFAB_MODEL" => self.model = value.to_string(),
            "CONFAB_OS" => self.os = value.to_string(),
            "CONFAB_API_URL" => self.api_url = value.to_string(),
            _ => {}
        }
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error with a remediation hint when the
    /// default endpoint is used without an API key.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() && self.api_url == DEFAULT_API_URL {
            return Err(ConfabError::Config(
                "CONFAB_API_KEY is required for the default OpenAI endpoint. \
                 Set it with: export CONFAB_API_KEY='your-api-key'"
                    .to_string(),
            )
            .into());
        }
        Ok(())
    }
}

/// Human-friendly label for the build target's operating system
fn default_os_label() -> &'static str {
    match std::env::consts::OS {
        "macos" => "macOS",
        "linux" => "Linux",
        "windows" => "Windows",
        other => other,
    }
}
