//! Application configuration
//!
//! Loaded from a TOML file, then overridden from the environment (after
//! `.env` has been read with dotenvy). Nothing here is global: the loaded
//! [`AppConfig`] is passed explicitly to the store, the source and the engine.
//!
//! ```toml
//! [database]
//! path = "data/dynsync.db"
//!
//! [logging]
//! profile = "production"
//!
//! [thresholds]
//! fail_error_ratio = 0.05
//!
//! [[collections]]
//! name = "articles"
//! endpoint = "/data/ReleasedProductsV2"
//! key = { field = "ItemNumber" }
//!
//! [[collections]]
//! name = "order_lines"
//! key = { parent = "SalesOrderNumber", line = "LineNumber" }
//! ```

#![allow(clippy::result_large_err)]

use dynsync_core::drift::{SchemaLimits, TRUNCATION_MARKER};
use dynsync_core::errors::{ExError, ExErrorKind, SyncError};
use dynsync_core::identity::KeySpec;
use dynsync_core::logging_facility::Profile;
use dynsync_core::reconcile::DEFAULT_FAIL_ERROR_RATIO;
use dynsync_store::errors::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Config file read when no path is given, if it exists
pub const DEFAULT_CONFIG_FILE: &str = "dynsync.toml";

/// Overrides `[database] path`
pub const ENV_DB_PATH: &str = "DYNSYNC_DB_PATH";

/// Overrides `[logging] profile`
pub const ENV_LOG_PROFILE: &str = "DYNSYNC_LOG_PROFILE";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub schema: SchemaLimits,
    pub thresholds: Thresholds,
    pub collections: Vec<CollectionSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("dynsync.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub profile: Profile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Error ratio above which a run is recorded as `ERROR` rather than `WARNING`
    pub fail_error_ratio: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            fail_error_ratio: DEFAULT_FAIL_ERROR_RATIO,
        }
    }
}

/// One synchronized entity set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSpec {
    pub name: String,
    /// Upstream endpoint, informational only
    #[serde(default)]
    pub endpoint: Option<String>,
    pub key: KeySpec,
    /// An empty snapshot tombstones every record; refused unless set
    #[serde(default)]
    pub allow_empty_snapshot: bool,
}

fn invalid(reason: impl Into<String>) -> ExError {
    ExError::from(SyncError::InvalidConfig {
        reason: reason.into(),
    })
    .with_op("load_config")
}

impl AppConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text).map_err(|e| invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration the way the binary does
    ///
    /// Reads `.env`, then `path` (or [`DEFAULT_CONFIG_FILE`] if present, or
    /// defaults), then applies environment overrides and validates.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::read_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => AppConfig::default(),
        };

        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("load_config")
                .with_message(format!("cannot read {}: {}", path.display(), e))
        })?;
        toml::from_str(&text)
            .map_err(|e| invalid(format!("{}: {}", path.display(), e)))
    }

    /// Apply `DYNSYNC_*` overrides from `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.trim().is_empty()) {
            self.database.path = PathBuf::from(path);
        }
        if let Some(profile) = lookup(ENV_LOG_PROFILE) {
            self.logging.profile = profile
                .parse::<Profile>()
                .map_err(|e: String| invalid(format!("{}: {}", ENV_LOG_PROFILE, e)))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let ratio = self.thresholds.fail_error_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(invalid(format!(
                "fail_error_ratio must be within 0..=1, got {}",
                ratio
            )));
        }

        let floor = TRUNCATION_MARKER.len();
        for (name, value) in [
            ("max_path_len", self.schema.max_path_len),
            ("max_sample_len", self.schema.max_sample_len),
        ] {
            if value < floor {
                return Err(invalid(format!(
                    "{} must be at least {}, got {}",
                    name, floor, value
                )));
            }
        }

        let mut names = HashSet::new();
        for collection in &self.collections {
            if collection.name.trim().is_empty() {
                return Err(invalid("collection name must not be empty"));
            }
            if !names.insert(collection.name.as_str()) {
                return Err(invalid(format!(
                    "duplicate collection '{}'",
                    collection.name
                )));
            }
            if collection.key.fields().iter().any(|f| f.trim().is_empty()) {
                return Err(invalid(format!(
                    "collection '{}' has an empty key field",
                    collection.name
                )));
            }
        }
        Ok(())
    }

    /// Look up a configured collection by name
    pub fn collection(&self, name: &str) -> Result<&CollectionSpec> {
        self.collections
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| invalid(format!("unknown collection '{}'", name)))
    }
}
