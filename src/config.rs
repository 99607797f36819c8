use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// All runtime settings, resolved once at startup (file, then environment,
/// then command-line flags) and passed by reference into each component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Preference prompt: inline text or `@filename`.
    pub prompt: Option<String>,

    #[serde(default)]
    pub email: EmailSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailSettings {
    /// SMTP relay, `hostname` or `hostname:port`.
    #[serde(default)]
    pub smarthost: String,

    pub username: Option<String>,
    pub password: Option<String>,

    #[serde(default)]
    pub to: String,

    #[serde(default)]
    pub from: String,

    /// Overrides the generated report title when sending email.
    pub subject: Option<String>,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rss-curator");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("articles.db").to_string_lossy().to_string()
}

fn default_feed_url() -> String {
    "https://hackaday.com/blog/feed/".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            feed_url: default_feed_url(),
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            prompt: None,
            email: EmailSettings::default(),
        }
    }
}

impl Config {
    /// Load the config file. An explicitly given path must exist; the default
    /// path is created with defaults on first run.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|err| {
                    AppError::Config(format!("reading config file {}: {err}", path.display()))
                })?;
                Ok(toml::from_str(&content)?)
            }
            None => {
                let config_path = Self::config_path();
                if config_path.exists() {
                    let content = std::fs::read_to_string(&config_path)?;
                    Ok(toml::from_str(&content)?)
                } else {
                    let config = Config::default();
                    config.save()?;
                    Ok(config)
                }
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rss-curator")
            .join("config.toml")
    }

    /// Overlay settings from the environment on top of the file values.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("DB_PATH") {
            self.db_path = v;
        }
        if let Ok(v) = std::env::var("FEED_URL") {
            self.feed_url = v;
        }
        if let Ok(v) = std::env::var("API_KEY") {
            self.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("BASE_URL") {
            self.base_url = v;
        }
        if let Ok(v) = std::env::var("MODEL") {
            self.model = v;
        }
        if let Ok(v) = std::env::var("PROMPT") {
            self.prompt = Some(v);
        }
        if let Ok(v) = std::env::var("EMAIL_SMARTHOST") {
            self.email.smarthost = v;
        }
        if let Ok(v) = std::env::var("EMAIL_USERNAME") {
            self.email.username = Some(v);
        }
        if let Ok(v) = std::env::var("EMAIL_PASSWORD") {
            self.email.password = Some(v);
        }
        if let Ok(v) = std::env::var("EMAIL_TO") {
            self.email.to = v;
        }
        if let Ok(v) = std::env::var("EMAIL_FROM") {
            self.email.from = v;
        }
        if let Ok(v) = std::env::var("EMAIL_SUBJECT") {
            self.email.subject = Some(v);
        }
    }
}
