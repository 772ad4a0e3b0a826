//! DuckDB executor implementation

use crate::error::{DbError, DbResult};
use crate::traits::DdlExecutor;
use async_trait::async_trait;
use duckdb::{params, Connection};
use sl_core::{
    DdlIntent, DescribeRelationResult, MaterializedObject, RelationMetadata, RelationRef,
    RelationType,
};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Run raw SQL, for setup outside the intent vocabulary
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    /// Run a scalar count query, for checks outside the intent vocabulary
    pub fn query_count(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM ({})", sql), [], |row| {
                row.get(0)
            })
            .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        Ok(count as usize)
    }

    /// Render an intent as a single DuckDB statement
    pub fn render_intent(&self, intent: &DdlIntent) -> DbResult<String> {
        match intent {
            DdlIntent::Create { object } => {
                let (keyword, query) = creatable(object)?;
                Ok(format!(
                    "CREATE {} {} AS {}",
                    keyword,
                    object.render(),
                    query
                ))
            }
            DdlIntent::Replace { object } => {
                let (keyword, query) = creatable(object)?;
                Ok(format!(
                    "CREATE OR REPLACE {} {} AS {}",
                    keyword,
                    object.render(),
                    query
                ))
            }
            DdlIntent::Rename { from, to } => {
                if from.schema() != to.schema() {
                    return Err(DbError::Internal(format!(
                        "cannot rename {} across schemas to {}",
                        from, to
                    )));
                }
                Ok(format!(
                    "ALTER {} {} RENAME TO {}",
                    ddl_keyword(from)?,
                    from.render(),
                    to.render_name()
                ))
            }
            DdlIntent::Drop { relation } => Ok(format!(
                "DROP {} IF EXISTS {}",
                ddl_keyword(relation)?,
                relation.render()
            )),
            DdlIntent::CreateIndex { .. } | DdlIntent::DropIndex { .. } => {
                Err(DbError::NotImplemented {
                    backend: "duckdb".to_string(),
                    feature: "managed indexes".to_string(),
                })
            }
        }
    }

    /// Execute SQL synchronously
    fn execute_sync(&self, sql: &str) -> DbResult<()> {
        log::debug!("duckdb: {}", sql);
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(DbError::from)
    }

    /// Check if relation exists synchronously
    fn relation_exists_sync(&self, relation: &RelationRef) -> DbResult<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
            params![relation.schema(), relation.name()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Describe relation synchronously
    fn describe_sync(&self, relation: &RelationRef) -> DbResult<Option<DescribeRelationResult>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT table_type FROM information_schema.tables \
             WHERE table_schema = ? AND table_name = ?",
        )?;
        let rows = stmt.query_map(params![relation.schema(), relation.name()], |row| {
            row.get::<_, String>(0)
        })?;
        let found = rows.collect::<Result<Vec<_>, _>>()?;
        let Some(table_type) = found.into_iter().next() else {
            return Ok(None);
        };

        let definition = if RelationType::from_catalog_token(&table_type)
            == Some(RelationType::View)
        {
            let mut stmt = conn.prepare(
                "SELECT sql FROM duckdb_views() WHERE schema_name = ? AND view_name = ?",
            )?;
            let rows = stmt.query_map(params![relation.schema(), relation.name()], |row| {
                row.get::<_, Option<String>>(0)
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .next()
                .flatten()
                .map(|sql| view_body(&sql).to_string())
        } else {
            None
        };

        Ok(Some(DescribeRelationResult {
            relation: RelationMetadata {
                // The connection has one catalog and DDL is rendered without
                // a database, so the caller's qualifier stands as given
                database: relation.database().map(str::to_string),
                schema: relation.schema().to_string(),
                name: relation.name().to_string(),
                relation_type: table_type,
                definition,
            },
            indexes: Vec::new(),
        }))
    }
}

/// The defining SELECT of a `CREATE VIEW ... AS <select>;` statement.
///
/// Skips quoted identifiers and the optional column list when looking for the
/// `AS` keyword. Text without one is returned trimmed.
fn view_body(sql: &str) -> &str {
    let bytes = sql.as_bytes();
    let mut in_quotes = false;
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => in_quotes = !in_quotes,
            b'(' if !in_quotes => depth += 1,
            b')' if !in_quotes => depth = depth.saturating_sub(1),
            b'a' | b'A' if !in_quotes && depth == 0 => {
                let before = i == 0 || bytes[i - 1].is_ascii_whitespace() || bytes[i - 1] == b')';
                let keyword = bytes.get(i + 1).is_some_and(|b| b.eq_ignore_ascii_case(&b's'));
                let after = bytes.get(i + 2).map_or(true, |b| b.is_ascii_whitespace());
                if before && keyword && after {
                    return sql[i + 2..].trim().trim_end_matches(';').trim_end();
                }
            }
            _ => {}
        }
        i += 1;
    }
    sql.trim()
}

fn ddl_keyword(relation: &RelationRef) -> DbResult<&'static str> {
    match relation.relation_type() {
        ty @ (RelationType::Table | RelationType::View) => Ok(ty.ddl_keyword()),
        RelationType::MaterializedView => Err(DbError::NotImplemented {
            backend: "duckdb".to_string(),
            feature: "materialized views".to_string(),
        }),
        other => Err(DbError::Internal(format!(
            "{} is a {} and not a warehouse object",
            relation, other
        ))),
    }
}

fn creatable(object: &MaterializedObject) -> DbResult<(&'static str, &str)> {
    let keyword = ddl_keyword(object.relation())?;
    let query = object
        .query()
        .ok_or_else(|| DbError::Internal(format!("{} has no defining query", object.relation())))?;
    Ok((keyword, query))
}

#[async_trait]
impl DdlExecutor for DuckDbBackend {
    async fn execute(&self, intent: &DdlIntent) -> DbResult<()> {
        let sql = self.render_intent(intent)?;
        self.execute_sync(&sql)
    }

    async fn relation_exists(&self, relation: &RelationRef) -> DbResult<bool> {
        self.relation_exists_sync(relation)
    }

    async fn describe_relation(
        &self,
        relation: &RelationRef,
    ) -> DbResult<Option<DescribeRelationResult>> {
        self.describe_sync(relation)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
