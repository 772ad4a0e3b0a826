//! Configuration types and parsing for swapline.yml

use crate::dialect::Dialect;
use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::default_true;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default suffix for the object moved aside during a swap
pub const DEFAULT_BACKUP_SUFFIX: &str = "__dbt_backup";

/// Default suffix for the freshly built candidate object
pub const DEFAULT_INTERMEDIATE_SUFFIX: &str = "__dbt_tmp";

/// Main configuration from swapline.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Warehouse dialect; decides quoting and rename/index capabilities
    #[serde(default)]
    pub dialect: Dialect,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Schema used for model nodes that do not name one
    #[serde(default)]
    pub schema: Option<String>,

    /// Name suffixes for backup and intermediate objects
    #[serde(default)]
    pub suffixes: SuffixConfig,

    /// Index maintenance after a refresh
    #[serde(default)]
    pub indexes: IndexMaintenanceConfig,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (for DuckDB file-based or :memory:)
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Logical database name for fully-qualified references
    #[serde(default)]
    pub name: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            name: None,
        }
    }
}

fn default_db_path() -> String {
    ":memory:".to_string()
}

/// Backup and intermediate name suffixes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuffixConfig {
    #[serde(default = "default_backup_suffix")]
    pub backup: String,

    #[serde(default = "default_intermediate_suffix")]
    pub intermediate: String,
}

impl Default for SuffixConfig {
    fn default() -> Self {
        Self {
            backup: default_backup_suffix(),
            intermediate: default_intermediate_suffix(),
        }
    }
}

fn default_backup_suffix() -> String {
    DEFAULT_BACKUP_SUFFIX.to_string()
}

fn default_intermediate_suffix() -> String {
    DEFAULT_INTERMEDIATE_SUFFIX.to_string()
}

/// Index maintenance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexMaintenanceConfig {
    /// Create and drop indexes to match the model after each refresh
    #[serde(default = "default_true")]
    pub maintain: bool,
}

impl Default for IndexMaintenanceConfig {
    fn default() -> Self {
        Self { maintain: true }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a directory.
    /// Looks for swapline.yml or swapline.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("swapline.yml");
        let yaml_path = dir.join("swapline.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Parse and validate configuration text
    pub fn from_yaml_str(content: &str) -> CoreResult<Self> {
        let config: Config =
            serde_yaml::from_str(content).map_err(|e| CoreError::ConfigParseError {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CoreResult<()> {
        let SuffixConfig {
            backup,
            intermediate,
        } = &self.suffixes;

        if backup.is_empty() || intermediate.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "suffixes.backup and suffixes.intermediate must not be empty".to_string(),
            });
        }

        // Derived names must be distinct from each other and from the base name
        if backup == intermediate {
            return Err(CoreError::ConfigInvalid {
                message: format!("backup and intermediate suffixes are both '{}'", backup),
            });
        }
        if backup.ends_with(intermediate.as_str()) || intermediate.ends_with(backup.as_str()) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "suffix '{}' and '{}' overlap; one is a suffix of the other",
                    backup, intermediate
                ),
            });
        }

        if let Some(schema) = &self.schema {
            if schema.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: "schema must not be blank".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
