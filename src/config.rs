//! Runtime configuration.
//!
//! Everything the server needs is resolved once into [`Config`] and passed
//! down explicitly. Environment lookups go through a closure so tests can
//! build a config without touching the process environment.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths;

/// Credential variables, checked in order. First non-empty value wins.
pub const API_KEY_VARS: [&str; 2] = ["OPENAI_API_KEY", "OPENAI_API_KEY_OPENAI"];

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Configuration for the study assistant
#[derive(Clone)]
pub struct Config {
    /// Directory holding prompt files, templates and logs
    pub base_dir: PathBuf,
    /// Interaction log file
    pub log_path: PathBuf,
    /// Glob pattern for versioned prompt files
    pub prompt_pattern: String,
    /// Chat model name
    pub model: String,
    /// Base URL of the chat completions API
    pub api_base: String,
    /// Resolved API credential, if any
    pub api_key: Option<String>,
    /// Outbound request timeout
    pub timeout: Duration,
    /// How long a client connection may stay silent before it is dropped
    pub read_timeout: Duration,
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_dir", &self.base_dir)
            .field("log_path", &self.log_path)
            .field("prompt_pattern", &self.prompt_pattern)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("read_timeout", &self.read_timeout)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is honoured if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_lookup(|key| std::env::var(key).ok());

        if config.base_dir.as_os_str().is_empty() {
            let cwd = std::env::current_dir().context("Failed to resolve current directory")?;
            config.set_base_dir(&cwd);
        }

        Ok(config)
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// `base_dir` is left empty when `STUDY_ASSISTANT_HOME` is unset;
    /// [`Config::from_env`] fills it with the working directory.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self {
            log_path: PathBuf::new(),
            prompt_pattern: String::new(),
            base_dir: PathBuf::new(),
            model: non_empty("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            api_base: non_empty("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_owned())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_owned()),
            api_key: resolve_api_key(&lookup),
            timeout: Duration::from_secs(
                non_empty("OPENAI_TIMEOUT_SECS")
                    .and_then(|value| value.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            read_timeout: Duration::from_secs(
                non_empty("READ_TIMEOUT_SECS")
                    .and_then(|value| value.parse().ok())
                    .filter(|&secs: &u64| secs > 0)
                    .unwrap_or(DEFAULT_READ_TIMEOUT_SECS),
            ),
            host: non_empty("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            port: non_empty("PORT")
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        };
        if let Some(home) = non_empty("STUDY_ASSISTANT_HOME") {
            config.set_base_dir(Path::new(&home));
        }
        config
    }

    /// Offline configuration rooted at `base_dir` (no credential).
    pub fn for_base_dir(base_dir: &Path) -> Self {
        let mut config = Self::from_lookup(|_| None);
        config.set_base_dir(base_dir);
        config
    }

    /// Re-root every derived path at `base_dir`.
    pub fn set_base_dir(&mut self, base_dir: &Path) {
        self.base_dir = base_dir.to_path_buf();
        self.log_path = paths::interactions_log(base_dir);
        self.prompt_pattern = paths::prompt_glob(base_dir);
    }

    /// Listen address as `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Resolve the API credential from the first non-empty variable in [`API_KEY_VARS`].
pub fn resolve_api_key(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    API_KEY_VARS.iter().find_map(|&key| {
        lookup(key)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    })
}
