//! Application settings loaded from `config.toml`.
//!
//! The file lists supplier accounts to seed on startup and the text used for
//! supplier onboarding notifications. Every section is optional.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Supplier accounts to create if they do not exist yet
    #[serde(default)]
    pub suppliers: Vec<SupplierSeed>,
    /// Onboarding notification settings
    #[serde(default)]
    pub notifications: NotificationSettings,
}

/// A supplier account to seed
#[derive(Debug, Deserialize, Clone)]
pub struct SupplierSeed {
    /// Unique supplier code
    pub code: String,
    /// Company name
    pub title: String,
    /// Login name
    pub username: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    #[serde(default)]
    pub phone: String,
    /// Postal address
    #[serde(default)]
    pub address: String,
}

/// Text and sender details for supplier notifications
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotificationSettings {
    /// Display name of the sender
    pub sender_name: String,
    /// Sender address
    pub sender_email: String,
    /// Subject line for onboarding messages
    pub default_subject: String,
    /// Body template; `{title}`, `{username}` and `{code}` are substituted
    pub default_body: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            sender_name: "Supplier Portal".to_string(),
            sender_email: String::new(),
            default_subject: "Your supplier account is ready".to_string(),
            default_body: "Hello {title}, your account {username} (code {code}) has been created."
                .to_string(),
        }
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Loading configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads settings from `./config.toml`, falling back to defaults when the file is absent.
///
/// # Errors
/// Returns an error if the file exists but cannot be parsed.
pub fn load_default_config() -> Result<AppConfig> {
    let path = Path::new("config.toml");
    if !path.exists() {
        warn!("config.toml not found, using default settings");
        return Ok(AppConfig::default());
    }
    load_config(path)
}
