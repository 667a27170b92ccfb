use crate::error::{MarketError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub payments: PaymentSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Static bearer tokens accepted by the token verifier.
    #[serde(default)]
    pub credentials: Vec<CredentialEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentSettings {
    /// Settlement currency for every intent.
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            currency: default_currency(),
        }
    }
}

fn default_currency() -> String {
    "usd".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreSettings {
    /// Deadline applied to each store, verifier, and processor call.
    #[serde(default)]
    pub call_timeout_ms: Option<u64>,
}

impl StoreSettings {
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialEntry {
    pub token: String,
    pub email: String,
}

impl Settings {
    /// Reads settings from a TOML file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_toml(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| MarketError::InvalidArgument(format!("invalid configuration: {e}")))
    }
}
