// ABOUTME: Configuration loading for debatemate.
// ABOUTME: Reads ~/.debatemate/config.toml for settings and the environment for secrets.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use crate::topic::TopicPool;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub sheet: SheetConfig,
    pub log: LogConfig,
    pub ui: UiConfig,
    pub topics: TopicsConfig,
}

/// Completion service configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: None,
        }
    }
}

/// Spreadsheet logging configuration. The sheet URL itself is a secret.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    pub enabled: bool,
    pub worksheet: String,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            worksheet: "Sheet1".to_string(),
        }
    }
}

/// Local log configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Mirror every logged turn into a local JSONL file.
    pub jsonl: bool,
    /// tracing filter used when DEBATEMATE_LOG is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            jsonl: true,
            level: "info".to_string(),
        }
    }
}

/// Display configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Optional text file shown above the chat.
    pub banner: Option<PathBuf>,
}

/// Topic pool override. Empty means the built-in pool.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TopicsConfig {
    pub pool: Vec<String>,
}

impl TopicsConfig {
    /// The configured pool, or the built-in one when the override is empty.
    pub fn to_pool(&self) -> TopicPool {
        if self.pool.is_empty() {
            return TopicPool::default();
        }
        TopicPool::new(self.pool.iter().cloned()).unwrap_or_else(|| {
            tracing::warn!("configured topic pool has no usable entries, using defaults");
            TopicPool::default()
        })
    }
}

impl Config {
    /// Load config from ~/.debatemate/config.toml, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Base directory for user configuration.
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".debatemate")
    }

    /// Path to the config file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Path to the secrets env file loaded at startup.
    pub fn secrets_env_path() -> PathBuf {
        Self::config_dir().join("secrets.env")
    }

    /// Directory for the diagnostic log and local turn logs.
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("debatemate")
    }

    /// Directory holding one JSONL turn log per session.
    pub fn sessions_dir() -> PathBuf {
        Self::data_dir().join("sessions")
    }
}

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const SHEET_URL_VAR: &str = "SHEET_URL";
pub const SHEET_CREDENTIAL_VAR: &str = "SHEET_CREDENTIAL";

/// Credentials for the spreadsheet service.
#[derive(Clone)]
pub struct SheetSecrets {
    pub url: String,
    /// Service-account key JSON, or a path to the key file.
    pub credential: String,
}

/// Secrets read once at startup. Debug output never shows their values.
#[derive(Clone)]
pub struct Secrets {
    pub api_key: String,
    pub sheet: Option<SheetSecrets>,
}

impl Secrets {
    /// Load `.env` and ~/.debatemate/secrets.env, then read secrets from the environment.
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        let _ = dotenvy::from_path(Config::secrets_env_path());
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read secrets through `lookup`. The API key is required; sheet secrets are
    /// only used when both are present.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let Some(api_key) = non_empty(API_KEY_VAR) else {
            anyhow::bail!(
                "{} is not set. Put it in the environment, .env, or {}",
                API_KEY_VAR,
                Config::secrets_env_path().display()
            );
        };

        let sheet = match (non_empty(SHEET_URL_VAR), non_empty(SHEET_CREDENTIAL_VAR)) {
            (Some(url), Some(credential)) => Some(SheetSecrets { url, credential }),
            _ => None,
        };

        Ok(Self { api_key, sheet })
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("api_key", &"<redacted>")
            .field("sheet", &self.sheet.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
