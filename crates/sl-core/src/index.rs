//! Index specifications and index diffs

use crate::relation::RelationRef;
use crate::render::RenderPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Index access method.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum IndexMethod {
    #[default]
    Btree,
    Hash,
    Gist,
    Spgist,
    Gin,
    Brin,
    /// DuckDB adaptive radix tree
    Art,
    /// Catalog reported a method this build does not recognize
    Unknown,
}

impl IndexMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            IndexMethod::Btree => "btree",
            IndexMethod::Hash => "hash",
            IndexMethod::Gist => "gist",
            IndexMethod::Spgist => "spgist",
            IndexMethod::Gin => "gin",
            IndexMethod::Brin => "brin",
            IndexMethod::Art => "art",
            IndexMethod::Unknown => "unknown",
        }
    }

    /// Parse a method token, case-insensitively.
    ///
    /// `Unknown` is never produced here; use [`IndexMethod::from_catalog_token`]
    /// when a fallback is wanted.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "btree" => Some(IndexMethod::Btree),
            "hash" => Some(IndexMethod::Hash),
            "gist" => Some(IndexMethod::Gist),
            "spgist" => Some(IndexMethod::Spgist),
            "gin" => Some(IndexMethod::Gin),
            "brin" => Some(IndexMethod::Brin),
            "art" => Some(IndexMethod::Art),
            _ => None,
        }
    }

    /// Resolve a catalog token, degrading to `Unknown` instead of failing.
    pub fn from_catalog_token(token: &str) -> Self {
        Self::parse(token).unwrap_or(IndexMethod::Unknown)
    }
}

impl fmt::Display for IndexMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate index on a relation.
///
/// Column names are folded with the render policy when the index is built, so
/// equality compares `(columns, method, unique)` as a set regardless of the
/// order or casing columns were listed in. The catalog name of an introspected
/// index is carried along for `DROP INDEX` but is not part of identity.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSpec {
    columns: BTreeSet<String>,
    method: IndexMethod,
    unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip)]
    render: Arc<RenderPolicy>,
}

impl IndexSpec {
    /// Shorthand for tests; panics if `columns` is empty.
    #[cfg(test)]
    pub(crate) fn new<I, S>(columns: I, method: IndexMethod, unique: bool, render: Arc<RenderPolicy>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match Self::try_new(columns, method, unique, render) {
            Some(spec) => spec,
            None => panic!("IndexSpec columns must not be empty"),
        }
    }

    /// Try to create a new index spec, returning `None` if `columns` is empty.
    pub fn try_new<I, S>(
        columns: I,
        method: IndexMethod,
        unique: bool,
        render: Arc<RenderPolicy>,
    ) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns: BTreeSet<String> = columns
            .into_iter()
            .map(|c| render.fold(c.as_ref()))
            .collect();
        if columns.is_empty() {
            return None;
        }
        Some(Self {
            columns,
            method,
            unique,
            name: None,
            render,
        })
    }

    pub(crate) fn with_catalog_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn columns(&self) -> &BTreeSet<String> {
        &self.columns
    }

    pub fn method(&self) -> IndexMethod {
        self.method
    }

    pub fn unique(&self) -> bool {
        self.unique
    }

    /// Name the catalog reported for this index, if it was introspected
    pub fn catalog_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Quoted, comma-separated column list
    pub fn render_columns(&self) -> String {
        self.columns
            .iter()
            .map(|c| self.render.quote(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Quoted index name.
    ///
    /// Introspected indexes keep their catalog name. New indexes get a
    /// synthetic name hashed from the relation, the index definition and the
    /// creation time, since index names survive a table rename and the next
    /// swap would otherwise collide with them.
    pub fn render_name(&self, relation: &RelationRef, created_at: DateTime<Utc>) -> String {
        if let Some(name) = &self.name {
            return self.render.quote(name);
        }
        let columns = self.columns.iter().cloned().collect::<Vec<_>>().join(",");
        let mut hasher = Sha256::new();
        hasher.update(
            format!(
                "unique:{};columns:{};method:{};relation:{};created_at:{}",
                self.unique,
                columns,
                self.method,
                relation.name(),
                created_at.to_rfc3339()
            )
            .as_bytes(),
        );
        let digest = format!("{:x}", hasher.finalize());
        self.render.quote(&digest[..32])
    }
}

impl PartialEq for IndexSpec {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && self.method == other.method && self.unique == other.unique
    }
}

impl Eq for IndexSpec {}

impl Hash for IndexSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.columns.hash(state);
        self.method.hash(state);
        self.unique.hash(state);
    }
}

impl PartialOrd for IndexSpec {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexSpec {
    fn cmp(&self, other: &Self) -> Ordering {
        self.columns
            .cmp(&other.columns)
            .then(self.method.cmp(&other.method))
            .then(self.unique.cmp(&other.unique))
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} ({})",
            if self.unique { "unique " } else { "" },
            self.method,
            self.render_columns()
        )
    }
}

/// Indexes to create and drop to move a relation from actual to desired.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexChangeSet {
    /// In desired but not in actual
    pub create: Vec<IndexSpec>,
    /// In actual but not in desired
    pub drop: Vec<IndexSpec>,
}

impl IndexChangeSet {
    /// Set difference in both directions.
    pub fn between(desired: &BTreeSet<IndexSpec>, actual: &BTreeSet<IndexSpec>) -> Self {
        Self {
            create: desired.difference(actual).cloned().collect(),
            drop: actual.difference(desired).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.drop.is_empty()
    }
}

#[cfg(test)]
#[path = "index_test.rs"]
mod tests;
