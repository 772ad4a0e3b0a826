//! Warehouse dialects and their per-type capabilities

use crate::relation_type::RelationType;
use crate::render::RenderPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Target warehouse dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    /// DuckDB (default)
    #[default]
    DuckDb,
    Snowflake,
}

impl Dialect {
    /// Render policy preset for this dialect
    pub fn render_policy(self) -> RenderPolicy {
        match self {
            Dialect::Postgres => RenderPolicy::postgres(),
            Dialect::DuckDb => RenderPolicy::duckdb(),
            Dialect::Snowflake => RenderPolicy::snowflake(),
        }
    }

    /// Whether objects of `relation_type` support in-place rename.
    ///
    /// Snowflake dynamic tables (its materialized views) cannot be renamed
    /// and are swapped with `CREATE OR REPLACE` instead.
    pub fn can_rename(self, relation_type: RelationType) -> bool {
        use RelationType::*;
        match self {
            Dialect::Postgres => matches!(relation_type, Table | View | MaterializedView),
            Dialect::DuckDb | Dialect::Snowflake => matches!(relation_type, Table | View),
        }
    }

    /// Whether objects of `relation_type` can host indexes.
    ///
    /// DuckDB refuses to rename a table that has ART indexes, so managed
    /// indexes are only offered where the swap can still rename.
    pub fn supports_indexes(self, relation_type: RelationType) -> bool {
        match self {
            Dialect::Postgres => matches!(
                relation_type,
                RelationType::Table | RelationType::MaterializedView
            ),
            Dialect::DuckDb | Dialect::Snowflake => false,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::DuckDb => write!(f, "duckdb"),
            Dialect::Snowflake => write!(f, "snowflake"),
        }
    }
}
