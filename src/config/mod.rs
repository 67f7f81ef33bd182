/// Relational backend connection and table creation
pub mod database;

/// Document backend connection
pub mod document;

/// Backend, merchant and menu settings from config.toml
pub mod settings;

pub use settings::{AppConfig, BackendSettings, MenuItemConfig, MerchantInfo};
