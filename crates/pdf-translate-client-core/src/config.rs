use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Name of the per-user configuration directory
pub const CONFIG_DIR_NAME: &str = "pdf-translate-client";

/// Default translation service address
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

const fn default_settle_delay_ms() -> u64 {
    500
}

const fn default_completion_delay_ms() -> u64 {
    1000
}

const fn default_notification_ttl_secs() -> u64 {
    5
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the translation service (HTTP and WebSocket share it)
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Wait after the progress channel opens before sending anything
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// How long the 100% state stays on screen before the completion panel
    #[serde(default = "default_completion_delay_ms")]
    pub completion_delay_ms: u64,

    /// Lifetime of transient notifications
    #[serde(default = "default_notification_ttl_secs")]
    pub notification_ttl_secs: u64,

    /// Target language used when none is given on the command line
    #[serde(default)]
    pub default_language: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            settle_delay_ms: default_settle_delay_ms(),
            completion_delay_ms: default_completion_delay_ms(),
            notification_ttl_secs: default_notification_ttl_secs(),
            default_language: None,
        }
    }
}

impl ClientConfig {
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub const fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }

    pub const fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_ttl_secs)
    }

    /// Check that the server URL is an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.server_url).map_err(|e| Error::ConfigInvalid {
            field: "server_url".to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(Error::ConfigInvalid {
                field: "server_url".to_string(),
                reason: format!("unsupported scheme '{other}'"),
            }),
        }
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations (~/.config/pdf-translate-client/config.toml, ./config.toml)
    pub fn load() -> Self {
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join(CONFIG_DIR_NAME).join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }
}
