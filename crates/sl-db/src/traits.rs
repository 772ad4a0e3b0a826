//! Executor trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use sl_core::{DdlIntent, DescribeRelationResult, RelationRef};

/// Runs DDL intents and answers catalog questions for one warehouse.
///
/// Every call is a blocking round trip from the caller's point of view; the
/// refresh protocol awaits each result before choosing its next step.
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait DdlExecutor: Send + Sync {
    /// Execute one intent
    async fn execute(&self, intent: &DdlIntent) -> DbResult<()>;

    /// Check whether any object exists at the ref's location, whatever its type
    async fn relation_exists(&self, relation: &RelationRef) -> DbResult<bool>;

    /// Introspect the object at the ref's location, `None` if absent
    async fn describe_relation(
        &self,
        relation: &RelationRef,
    ) -> DbResult<Option<DescribeRelationResult>>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
