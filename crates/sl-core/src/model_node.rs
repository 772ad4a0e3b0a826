//! Rendered model nodes
//!
//! The already-rendered configuration of one model as produced by the
//! templating front end. Every field is optional at parse time so that
//! missing values surface as [`CoreError::ConfigValidation`] from the factory
//! rather than as opaque deserialization errors.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Rendered configuration for one model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedModelNode {
    #[serde(default)]
    pub database: Option<String>,

    #[serde(default)]
    pub schema: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    /// Materialization token (`table`, `view`, `materialized_view`, ...)
    #[serde(default)]
    pub materialization: Option<String>,

    #[serde(default)]
    pub indexes: Vec<IndexConfig>,

    /// Compiled SELECT
    #[serde(default)]
    pub query: Option<String>,
}

/// Index entry in a model node's config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub columns: Vec<String>,

    /// Index method token; btree when omitted
    #[serde(rename = "type", default)]
    pub method: Option<String>,

    #[serde(default)]
    pub unique: bool,
}

impl RenderedModelNode {
    /// Parse a node from YAML (or JSON, which YAML accepts).
    pub fn from_yaml_str(content: &str) -> CoreResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a node file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Name for error messages, even when the node has none
    pub(crate) fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}
