//! Identifier render policies
//!
//! A [`RenderPolicy`] decides how a `(database, schema, name)` triple is quoted
//! into an executable identifier, and how unquoted identifiers fold when two
//! names are compared. Policies are immutable once built and are shared by
//! reference (`Arc<RenderPolicy>`) across every relation and index that uses
//! them.

use serde::{Deserialize, Serialize};

/// How a dialect folds unquoted identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaseFolding {
    /// Unquoted identifiers fold to lowercase (Postgres)
    Lower,
    /// Unquoted identifiers fold to uppercase (Snowflake)
    Upper,
    /// Identifiers are compared as written (DuckDB)
    #[default]
    Preserve,
}

/// Dialect quoting and casing rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPolicy {
    quote_char: char,
    folding: CaseFolding,
    include_database: bool,
}

impl RenderPolicy {
    /// Create a policy from its parts.
    pub const fn new(quote_char: char, folding: CaseFolding, include_database: bool) -> Self {
        Self {
            quote_char,
            folding,
            include_database,
        }
    }

    /// Postgres: double quotes, lowercase folding, database-qualified
    pub const fn postgres() -> Self {
        Self::new('"', CaseFolding::Lower, true)
    }

    /// DuckDB: double quotes, case preserving, schema-qualified only
    pub const fn duckdb() -> Self {
        Self::new('"', CaseFolding::Preserve, false)
    }

    /// Snowflake: double quotes, uppercase folding, database-qualified
    pub const fn snowflake() -> Self {
        Self::new('"', CaseFolding::Upper, true)
    }

    pub fn quote_char(&self) -> char {
        self.quote_char
    }

    pub fn folding(&self) -> CaseFolding {
        self.folding
    }

    pub fn include_database(&self) -> bool {
        self.include_database
    }

    /// Fold an identifier for comparison.
    pub fn fold(&self, ident: &str) -> String {
        match self.folding {
            CaseFolding::Lower => ident.to_lowercase(),
            CaseFolding::Upper => ident.to_uppercase(),
            CaseFolding::Preserve => ident.to_string(),
        }
    }

    /// Whether `ident` can be quoted without ambiguity.
    ///
    /// Embedded quote characters are escaped by doubling, so the only
    /// identifiers rejected are empty ones and ones containing control
    /// characters.
    pub fn can_quote(&self, ident: &str) -> bool {
        !ident.is_empty() && !ident.chars().any(char::is_control)
    }

    /// Quote a single identifier part, doubling embedded quote characters.
    pub fn quote(&self, ident: &str) -> String {
        let q = self.quote_char;
        let mut out = String::with_capacity(ident.len() + 2);
        out.push(q);
        for c in ident.chars() {
            if c == q {
                out.push(q);
            }
            out.push(c);
        }
        out.push(q);
        out
    }

    /// Render a fully qualified identifier.
    ///
    /// The database part is emitted only when the policy includes it and one
    /// is given.
    pub fn render(&self, database: Option<&str>, schema: &str, name: &str) -> String {
        match database {
            Some(db) if self.include_database => format!(
                "{}.{}.{}",
                self.quote(db),
                self.quote(schema),
                self.quote(name)
            ),
            _ => format!("{}.{}", self.quote(schema), self.quote(name)),
        }
    }
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::duckdb()
    }
}
