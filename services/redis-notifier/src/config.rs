//! Configuration types for the redis notifier

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::webhook::WebhookTarget;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub webhook: WebhookConfig,
    /// Label used in alert text to identify the monitored instance
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub redis: RedisConfig,
}

/// Webhook delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_webhook_timeout")]
    pub timeout_seconds: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_seconds: default_webhook_timeout(),
        }
    }
}

impl WebhookConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Redis probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_address")]
    pub address: String,
    #[serde(default = "default_polling_interval")]
    pub polling_interval_seconds: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            address: default_redis_address(),
            polling_interval_seconds: default_polling_interval(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl RedisConfig {
    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl Config {
    /// Check everything the service needs before it starts
    pub fn validate(&self) -> crate::Result<()> {
        WebhookTarget::parse(self.webhook.url.as_deref())?;

        if self.webhook.timeout_seconds == 0 {
            return Err(crate::NotifierError::Config(
                "webhook.timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.redis.address.trim().is_empty() {
            return Err(crate::NotifierError::Config(
                "redis.address must not be empty".to_string(),
            ));
        }
        if self.redis.polling_interval_seconds == 0 {
            return Err(crate::NotifierError::Config(
                "redis.polling_interval_seconds must be greater than 0".to_string(),
            ));
        }
        if self.redis.connect_timeout_seconds == 0 {
            return Err(crate::NotifierError::Config(
                "redis.connect_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_webhook_timeout() -> u64 {
    10
}

fn default_redis_address() -> String {
    "127.0.0.1:6379".to_string()
}

fn default_polling_interval() -> u64 {
    5
}

fn default_connect_timeout() -> u64 {
    3
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::NotifierError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
