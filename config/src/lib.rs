//! # Configuration Management for DocHaus
//!
//! This crate provides centralized configuration structures for the document
//! store connection, the entity service, and index bootstrap.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::DatabaseConfig;
//!
//! let db_config = DatabaseConfig::new("mongodb://localhost:27017".to_string(), "dochaus".to_string());
//! assert_eq!(db_config.max_pool_size, 100);
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [database]
//! uri = "mongodb://localhost:27017"
//! database = "dochaus"
//! app_name = "dochaus"
//! min_pool_size = 0
//! max_pool_size = 100
//! connect_timeout_seconds = 10
//! server_selection_timeout_seconds = 10
//!
//! [service]
//! request_timeout_seconds = 30
//!
//! [[indexes]]
//! collection = "users"
//! unique = true
//! keys = [{ field = "email", order = "asc" }]
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! # fn main() -> Result<(), config::ConfigError> {
//! // Load from $DOCHAUS_CONFIG or ./dochaus.toml
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{env, path::Path};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./dochaus.toml";
const CONFIG_PATH_VAR: &str = "DOCHAUS_CONFIG";
const URI_OVERRIDE_VAR: &str = "MONGO_URI";
const DATABASE_OVERRIDE_VAR: &str = "MONGO_DB";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub indexes: Vec<IndexConfig>,
}

/// Document store connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub database: String,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub min_pool_size: u32,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
    #[serde(default = "default_timeout_seconds")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_timeout_seconds")]
    pub server_selection_timeout_seconds: u64,
}

/// Entity service behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Deadline applied to requests that arrive without one; 0 disables it
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

/// One index to ensure at startup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexConfig {
    pub collection: String,
    pub keys: Vec<IndexKeyConfig>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexKeyConfig {
    pub field: String,
    #[serde(default)]
    pub order: IndexOrder,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexOrder {
    #[default]
    Asc,
    Desc,
    Text,
}

fn default_max_pool_size() -> u32 {
    100
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_request_timeout_seconds() -> u64 {
    30
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

impl ServiceConfig {
    /// Default request deadline, `None` when disabled
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_seconds > 0).then(|| Duration::from_secs(self.request_timeout_seconds))
    }
}

impl AppConfig {
    /// Load configuration from the TOML file named by `DOCHAUS_CONFIG` or the default path
    ///
    /// A `.env` file is read first when present. `MONGO_URI` and `MONGO_DB`
    /// override the file's connection settings.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let mut config = {
            // Explicit path from the environment (or .env)
            if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
                Self::parse_file(&config_path)
            }
            // Try to load config from DEFAULT_CONFIG_PATH
            else if Path::new(DEFAULT_CONFIG_PATH).exists() {
                Self::parse_file(DEFAULT_CONFIG_PATH)
            }
            // Return error if neither the variable nor the default config file exists
            else {
                Err(ConfigError::Invalid(format!(
                    "Config path must be specified as {} or in {} file",
                    CONFIG_PATH_VAR, DEFAULT_CONFIG_PATH
                )))
            }
        }?;

        config.apply_overrides(|name| env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::parse_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Replace connection settings with values from `lookup` when present
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup(URI_OVERRIDE_VAR).filter(|v| !v.is_empty()) {
            self.database.uri = uri;
        }
        if let Some(database) = lookup(DATABASE_OVERRIDE_VAR).filter(|v| !v.is_empty()) {
            self.database.database = database;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Database validations
        if self.database.uri.is_empty() {
            return Err(ConfigError::Invalid(
                "Database uri cannot be empty".to_string(),
            ));
        }
        if !self.database.uri.starts_with("mongodb://")
            && !self.database.uri.starts_with("mongodb+srv://")
        {
            return Err(ConfigError::Invalid(
                "Database uri must start with mongodb:// or mongodb+srv://".to_string(),
            ));
        }
        if self.database.database.is_empty() {
            return Err(ConfigError::Invalid(
                "Database name cannot be empty".to_string(),
            ));
        }
        if self.database.max_pool_size == 0 {
            return Err(ConfigError::Invalid(
                "Database max_pool_size must be greater than 0".to_string(),
            ));
        }
        if self.database.min_pool_size > self.database.max_pool_size {
            return Err(ConfigError::Invalid(
                "Database min_pool_size cannot be greater than max_pool_size".to_string(),
            ));
        }
        if self.database.connect_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Database connect_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.database.server_selection_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Database server_selection_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        // Index validations
        for index in &self.indexes {
            if index.collection.is_empty() {
                return Err(ConfigError::Invalid(
                    "Index collection cannot be empty".to_string(),
                ));
            }
            if index.keys.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "Index on '{}' must have at least one key",
                    index.collection
                )));
            }
            if index.keys.iter().any(|key| key.field.is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "Index on '{}' has an empty key field",
                    index.collection
                )));
            }
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Create a database configuration with default pool and timeout settings
    pub fn new(uri: String, database: String) -> Self {
        Self {
            uri,
            database,
            app_name: None,
            min_pool_size: 0,
            max_pool_size: default_max_pool_size(),
            connect_timeout_seconds: default_timeout_seconds(),
            server_selection_timeout_seconds: default_timeout_seconds(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_secs(self.server_selection_timeout_seconds)
    }
}

impl AppConfig {
    /// Configuration with only a connection, default service settings and no indexes
    pub fn new(database: DatabaseConfig) -> Self {
        Self {
            database,
            service: ServiceConfig::default(),
            indexes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [database]
        uri = "mongodb://localhost:27017"
        database = "dochaus"

        [service]
        request_timeout_seconds = 5

        [[indexes]]
        collection = "users"
        unique = true
        keys = [{ field = "email" }]

        [[indexes]]
        collection = "articles"
        name = "articles_text"
        keys = [{ field = "title", order = "text" }, { field = "createdAt", order = "desc" }]
    "#;

    #[test]
    fn test_parse_with_defaults() {
        let config = AppConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.database.max_pool_size, 100);
        assert_eq!(config.database.connect_timeout_seconds, 10);
        assert_eq!(config.service.request_timeout(), Some(Duration::from_secs(5)));

        assert_eq!(config.indexes.len(), 2);
        assert!(config.indexes[0].unique);
        assert_eq!(config.indexes[0].keys[0].order, IndexOrder::Asc);
        assert_eq!(config.indexes[1].keys[0].order, IndexOrder::Text);
        assert_eq!(config.indexes[1].keys[1].order, IndexOrder::Desc);
    }

    #[test]
    fn test_service_section_is_optional() {
        let config = AppConfig::from_toml_str(
            "[database]\nuri = \"mongodb://db:27017\"\ndatabase = \"x\"\n",
        )
        .unwrap();
        assert_eq!(config.service.request_timeout_seconds, 30);
        assert!(config.indexes.is_empty());
    }

    #[test]
    fn test_zero_request_timeout_disables_deadline() {
        let service = ServiceConfig {
            request_timeout_seconds: 0,
        };
        assert!(service.request_timeout().is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_uri = "[database]\nuri = \"postgres://x\"\ndatabase = \"x\"\n";
        assert!(matches!(
            AppConfig::from_toml_str(bad_uri),
            Err(ConfigError::Invalid(_))
        ));

        let mut config = AppConfig::new(DatabaseConfig::new(
            "mongodb://localhost".to_string(),
            "x".to_string(),
        ));
        config.database.min_pool_size = 200;
        assert!(config.validate().is_err());

        let mut config = AppConfig::new(DatabaseConfig::new(
            "mongodb://localhost".to_string(),
            "x".to_string(),
        ));
        config.indexes.push(IndexConfig {
            collection: "users".to_string(),
            keys: Vec::new(),
            unique: false,
            name: None,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = AppConfig::from_toml_str(SAMPLE).unwrap();
        config.apply_overrides(|name| match name {
            "MONGO_URI" => Some("mongodb+srv://cluster.example".to_string()),
            "MONGO_DB" => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.database.uri, "mongodb+srv://cluster.example");
        assert_eq!(config.database.database, "dochaus");
    }
}
