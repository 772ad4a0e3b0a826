//! In-memory catalog executor for tests
//!
//! Simulates a warehouse that supports every intent (including materialized
//! views and indexes), records each attempted intent, and can be told to fail
//! the next intent matching a predicate.

use crate::error::{DbError, DbResult};
use crate::traits::DdlExecutor;
use async_trait::async_trait;
use sl_core::{
    DdlIntent, DescribeRelationResult, IndexRow, MaterializedObject, RelationMetadata, RelationRef,
};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

type CatalogKey = (Option<String>, String, String);

type Matcher = Box<dyn Fn(&DdlIntent) -> bool + Send>;

struct InjectedFailure {
    matcher: Matcher,
    message: String,
}

#[derive(Default)]
struct CatalogState {
    objects: BTreeMap<CatalogKey, MaterializedObject>,
    failures: Vec<InjectedFailure>,
    history: Vec<DdlIntent>,
}

/// Warehouse simulation keyed by `(database, schema, name)`.
#[derive(Default)]
pub struct MemoryCatalog {
    state: Mutex<CatalogState>,
}

fn key(relation: &RelationRef) -> CatalogKey {
    (
        relation.database().map(String::from),
        relation.schema().to_string(),
        relation.name().to_string(),
    )
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        // A panicking test thread must not hide the catalog from assertions
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed an object directly, bypassing intents and history.
    pub fn insert(&self, object: MaterializedObject) {
        self.lock().objects.insert(key(object.relation()), object);
    }

    /// Object currently stored at the ref's location, whatever its type
    pub fn get(&self, relation: &RelationRef) -> Option<MaterializedObject> {
        self.lock().objects.get(&key(relation)).cloned()
    }

    pub fn contains(&self, relation: &RelationRef) -> bool {
        self.lock().objects.contains_key(&key(relation))
    }

    /// Raw names of every stored object, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .lock()
            .objects
            .values()
            .map(|o| o.name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Every intent attempted so far, including failed ones
    pub fn history(&self) -> Vec<DdlIntent> {
        self.lock().history.clone()
    }

    pub fn clear_history(&self) {
        self.lock().history.clear();
    }

    /// Fail the next intent for which `matcher` returns true.
    ///
    /// Each injection fires once. Several can be queued; the first matching
    /// one wins.
    pub fn fail_next<F>(&self, message: impl Into<String>, matcher: F)
    where
        F: Fn(&DdlIntent) -> bool + Send + 'static,
    {
        self.lock().failures.push(InjectedFailure {
            matcher: Box::new(matcher),
            message: message.into(),
        });
    }

    fn apply(state: &mut CatalogState, intent: &DdlIntent) -> DbResult<()> {
        if let Some(pos) = state.failures.iter().position(|f| (f.matcher)(intent)) {
            let failure = state.failures.remove(pos);
            return Err(DbError::Injected(format!("{}: {}", failure.message, intent)));
        }

        let objects = &mut state.objects;
        match intent {
            DdlIntent::Create { object } => {
                let k = key(object.relation());
                if objects.contains_key(&k) {
                    return Err(DbError::RelationExists(object.render()));
                }
                objects.insert(k, object.without_indexes());
            }
            DdlIntent::Replace { object } => {
                objects.insert(key(object.relation()), object.without_indexes());
            }
            DdlIntent::Rename { from, to } => {
                let to_key = key(to);
                if objects.contains_key(&to_key) {
                    return Err(DbError::RelationExists(to.render()));
                }
                let stored = objects
                    .get(&key(from))
                    .ok_or_else(|| DbError::RelationNotFound(from.render()))?;
                // Renames never change an object's type
                if stored.relation_type() != to.relation_type() {
                    return Err(DbError::Internal(format!(
                        "cannot rename {} {} to a {} ref",
                        stored.relation_type(),
                        from.render(),
                        to.relation_type()
                    )));
                }
                let renamed = stored.retarget(to.clone());
                objects.remove(&key(from));
                objects.insert(to_key, renamed);
            }
            DdlIntent::Drop { relation } => {
                objects.remove(&key(relation));
            }
            DdlIntent::CreateIndex { relation, index } => {
                let k = key(relation);
                let object = objects
                    .get(&k)
                    .ok_or_else(|| DbError::RelationNotFound(relation.render()))?;
                if object.indexes().contains(index) {
                    return Err(DbError::RelationExists(format!(
                        "index {} on {}",
                        index,
                        relation.render()
                    )));
                }
                let updated = object.with_index(index.clone(), true);
                objects.insert(k, updated);
            }
            DdlIntent::DropIndex { relation, index } => {
                let k = key(relation);
                let object = objects
                    .get(&k)
                    .ok_or_else(|| DbError::RelationNotFound(relation.render()))?;
                let updated = object.with_index(index.clone(), false);
                objects.insert(k, updated);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DdlExecutor for MemoryCatalog {
    async fn execute(&self, intent: &DdlIntent) -> DbResult<()> {
        let mut state = self.lock();
        state.history.push(intent.clone());
        Self::apply(&mut state, intent)
    }

    async fn relation_exists(&self, relation: &RelationRef) -> DbResult<bool> {
        Ok(self.contains(relation))
    }

    async fn describe_relation(
        &self,
        relation: &RelationRef,
    ) -> DbResult<Option<DescribeRelationResult>> {
        let Some(object) = self.get(relation) else {
            return Ok(None);
        };

        let mut indexes = Vec::new();
        for (i, index) in object.indexes().iter().enumerate() {
            let index_name = index
                .catalog_name()
                .map(String::from)
                .unwrap_or_else(|| format!("{}_idx_{}", object.name(), i));
            for column in index.columns() {
                indexes.push(IndexRow {
                    index_name: index_name.clone(),
                    column_name: column.clone(),
                    method: index.method().to_string(),
                    unique: index.unique(),
                });
            }
        }

        Ok(Some(DescribeRelationResult {
            relation: RelationMetadata {
                database: object.database().map(String::from),
                schema: object.schema().to_string(),
                name: object.name().to_string(),
                relation_type: object.relation_type().to_string(),
                definition: object.query().map(String::from),
            },
            indexes,
        }))
    }

    fn db_type(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
