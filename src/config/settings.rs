//! Application settings loaded from config.toml
//!
//! Holds backend selection and probing options, the merchant details printed
//! on receipts, and the menu items used to seed an empty catalog. Every
//! section is optional and falls back to defaults.

use crate::core::coordinator::MirrorMode;
use crate::errors::{Error, Result};
use crate::models::{BackendKind, MenuItem};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Default location of the settings file.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Backend selection, probing and mirroring
    #[serde(default)]
    pub backends: BackendSettings,
    /// Merchant details printed on receipts
    #[serde(default)]
    pub merchant: MerchantInfo,
    /// Menu items to seed when missing from the catalog
    #[serde(default)]
    pub menu_items: Vec<MenuItemConfig>,
}

/// How the coordinator picks and uses backends.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Backend tried first when both are healthy
    pub preferred: BackendKind,
    /// Upper bound for a single connectivity probe
    pub probe_timeout_secs: u64,
    /// Whether and how successful writes are copied to the other backend
    pub mirror: MirrorMode,
    /// Validate document store write permission by writing a throwaway document
    pub document_probe_writes: bool,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            preferred: BackendKind::Relational,
            probe_timeout_secs: 5,
            mirror: MirrorMode::Awaited,
            document_probe_writes: false,
        }
    }
}

impl BackendSettings {
    /// Probe timeout as a [`Duration`]
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Merchant header and footer printed on every receipt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MerchantInfo {
    /// Business name
    pub name: String,
    /// Street address
    pub address: String,
    /// Contact phone number
    pub phone: String,
    /// Closing message
    pub footer: String,
    /// Prefix for amounts, empty for none
    pub currency_symbol: String,
}

impl Default for MerchantInfo {
    fn default() -> Self {
        Self {
            name: "Bistro".to_string(),
            address: "1 Market Street".to_string(),
            phone: "000-000-0000".to_string(),
            footer: "Thank you for dining with us!".to_string(),
            currency_symbol: String::new(),
        }
    }
}

/// Configuration for a single seeded menu item
#[derive(Debug, Deserialize, Clone)]
pub struct MenuItemConfig {
    /// Stable id for the item
    pub id: String,
    /// Display name
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Category label (e.g., "drinks")
    pub category: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Optional image reference
    #[serde(default)]
    pub image_url: Option<String>,
    /// Whether the item starts out orderable
    #[serde(default = "default_available")]
    pub available: bool,
}

const fn default_available() -> bool {
    true
}

impl From<&MenuItemConfig> for MenuItem {
    fn from(config: &MenuItemConfig) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            price: config.price,
            category: config.category.clone(),
            description: config.description.clone(),
            image_url: config.image_url.clone(),
            available: config.available,
        }
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has the wrong type
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    debug!("Attempting to load configuration from: {:?}", path.as_ref());
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from `BISTRO_CONFIG` or `./config.toml`.
///
/// A missing file is not an error: defaults are used and a warning is logged.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var("BISTRO_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if !Path::new(&path).exists() {
        warn!("Config file {path} not found, using defaults");
        return Ok(AppConfig::default());
    }
    load_config(path)
}
