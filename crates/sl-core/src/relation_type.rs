//! Warehouse object types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of object a relation names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Table,
    View,
    MaterializedView,
    /// Inlined common table expression, never a warehouse object
    Cte,
    /// Ephemeral model, inlined into its consumers
    Ephemeral,
}

impl RelationType {
    /// Canonical token, as used in model nodes and describe results
    pub fn as_str(self) -> &'static str {
        match self {
            RelationType::Table => "table",
            RelationType::View => "view",
            RelationType::MaterializedView => "materialized_view",
            RelationType::Cte => "cte",
            RelationType::Ephemeral => "ephemeral",
        }
    }

    /// Whether objects of this type exist in the warehouse catalog
    pub fn is_warehouse_object(self) -> bool {
        matches!(
            self,
            RelationType::Table | RelationType::View | RelationType::MaterializedView
        )
    }

    /// SQL keyword for DDL statements (`TABLE`, `VIEW`, `MATERIALIZED VIEW`)
    pub fn ddl_keyword(self) -> &'static str {
        match self {
            RelationType::Table => "TABLE",
            RelationType::View => "VIEW",
            RelationType::MaterializedView => "MATERIALIZED VIEW",
            RelationType::Cte => "CTE",
            RelationType::Ephemeral => "EPHEMERAL",
        }
    }

    /// Resolve a type token reported by a catalog.
    ///
    /// Accepts the canonical tokens plus the spellings catalogs use
    /// (`BASE TABLE`, `MATERIALIZED VIEW`, Postgres `relkind` letters).
    pub fn from_catalog_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "table" | "base table" | "r" => Some(RelationType::Table),
            "view" | "v" => Some(RelationType::View),
            "materialized_view" | "materialized view" | "matview" | "m" => {
                Some(RelationType::MaterializedView)
            }
            _ => None,
        }
    }

    /// Resolve a model node's materialization token.
    ///
    /// Incremental models materialize as tables.
    pub fn from_materialization(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "table" | "incremental" => Some(RelationType::Table),
            "view" => Some(RelationType::View),
            "materialized_view" => Some(RelationType::MaterializedView),
            "ephemeral" => Some(RelationType::Ephemeral),
            "cte" => Some(RelationType::Cte),
            _ => None,
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
