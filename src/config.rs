use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{DigestError, Result};

/// Longest supported lookback window (30 days)
pub const MAX_LOOKBACK_HOURS: u32 = 720;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub summarizer: SummarizerSettings,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u32,
    /// Address that receives the digest
    #[serde(default)]
    pub recipient: String,
    /// Subject line; derived from the lookback window when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// From address; the account's own address is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            lookback_hours: default_lookback_hours(),
            recipient: String::new(),
            subject: None,
            sender: None,
        }
    }
}

impl MailConfig {
    pub fn subject(&self) -> String {
        self.subject.clone().unwrap_or_else(|| {
            format!(
                "Aggregated Todo List Items from the Past {} Hours",
                self.lookback_hours
            )
        })
    }
}

/// Settings for the completion service, as written in the config file
///
/// Secrets never live in the file: only the names of the environment
/// variables that hold them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_site_url_env")]
    pub site_url_env: String,
    #[serde(default = "default_site_name_env")]
    pub site_name_env: String,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            site_url_env: default_site_url_env(),
            site_name_env: default_site_name_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub dry_run: bool,
}

fn default_lookback_hours() -> u32 {
    12
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "perplexity/r1-1776".to_string()
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".to_string()
}

fn default_site_url_env() -> String {
    "YOUR_SITE_URL".to_string()
}

fn default_site_name_env() -> String {
    "YOUR_SITE_NAME".to_string()
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        // If file doesn't exist, fall back to defaults; validation still applies
        let config = if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Self::default()
        } else {
            let content = tokio::fs::read_to_string(path).await.map_err(|e| {
                DigestError::ConfigError(format!("Failed to read config file: {}", e))
            })?;

            let config: Self = toml::from_str(&content).map_err(|e| {
                DigestError::ConfigError(format!("Failed to parse config file: {}", e))
            })?;
            tracing::info!("Loaded configuration from {:?}", path);
            config
        };

        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    DigestError::ConfigError(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| DigestError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| DigestError::ConfigError(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.mail.lookback_hours == 0 {
            return Err(DigestError::ConfigError(
                "mail.lookback_hours must be at least 1".to_string(),
            ));
        }
        if self.mail.lookback_hours > MAX_LOOKBACK_HOURS {
            return Err(DigestError::ConfigError(format!(
                "mail.lookback_hours cannot exceed {} (30 days)",
                MAX_LOOKBACK_HOURS
            )));
        }

        let recipient = self.mail.recipient.trim();
        if recipient.is_empty() {
            return Err(DigestError::ConfigError(
                "mail.recipient must be set".to_string(),
            ));
        }
        if !recipient.contains('@') {
            return Err(DigestError::ConfigError(format!(
                "mail.recipient '{}' is not an email address",
                recipient
            )));
        }

        if let Some(subject) = &self.mail.subject {
            if subject.trim().is_empty() {
                return Err(DigestError::ConfigError(
                    "mail.subject cannot be empty when set".to_string(),
                ));
            }
        }

        if !self.summarizer.base_url.starts_with("http://")
            && !self.summarizer.base_url.starts_with("https://")
        {
            return Err(DigestError::ConfigError(format!(
                "summarizer.base_url must be an http(s) URL, got '{}'",
                self.summarizer.base_url
            )));
        }
        if self.summarizer.model.trim().is_empty() {
            return Err(DigestError::ConfigError(
                "summarizer.model cannot be empty".to_string(),
            ));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Create an example configuration file
    pub async fn create_example(path: &Path) -> Result<()> {
        let mut config = Self::default();
        config.mail.recipient = "you@example.com".to_string();
        config.save(path).await
    }
}
