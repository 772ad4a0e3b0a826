//! Catalog describe results
//!
//! The raw shape an execution layer returns when asked to describe an existing
//! object: one metadata record plus one row per indexed column. Rows are
//! grouped into index specs by the factory.

use serde::{Deserialize, Serialize};

/// Catalog introspection response for one relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeRelationResult {
    pub relation: RelationMetadata,

    /// One row per (index, column) pair
    #[serde(default)]
    pub indexes: Vec<IndexRow>,
}

/// Object-level metadata reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMetadata {
    #[serde(default)]
    pub database: Option<String>,

    pub schema: String,

    pub name: String,

    /// Catalog type token (`BASE TABLE`, `VIEW`, `materialized_view`, ...)
    #[serde(rename = "type")]
    pub relation_type: String,

    /// Stored definition text, if the catalog keeps one
    #[serde(default)]
    pub definition: Option<String>,
}

/// A single indexed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRow {
    pub index_name: String,
    pub column_name: String,
    pub method: String,
    #[serde(default)]
    pub unique: bool,
}
