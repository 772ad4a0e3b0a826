//! Materialized objects: a relation plus its definition and indexes

use crate::index::{IndexChangeSet, IndexSpec};
use crate::relation::RelationRef;
use serde::Serialize;
use std::collections::BTreeSet;
use std::ops::Deref;

/// A relation together with its backing query and indexes.
///
/// Built by the [`RelationFactory`](crate::factory::RelationFactory) from one
/// origin at a time. Derefs to its [`RelationRef`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterializedObject {
    #[serde(flatten)]
    relation: RelationRef,
    query: Option<String>,
    indexes: BTreeSet<IndexSpec>,
}

impl MaterializedObject {
    pub(crate) fn new(
        relation: RelationRef,
        query: Option<String>,
        indexes: BTreeSet<IndexSpec>,
    ) -> Self {
        debug_assert!(
            relation.relation_type().is_warehouse_object() || query.is_none(),
            "non-warehouse relations carry no query"
        );
        Self {
            relation,
            query,
            indexes,
        }
    }

    pub fn relation(&self) -> &RelationRef {
        &self.relation
    }

    /// Defining SELECT, when known
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn indexes(&self) -> &BTreeSet<IndexSpec> {
        &self.indexes
    }

    /// The same definition placed under another name.
    ///
    /// Used to create the intermediate object and to record renames. The
    /// target must share this object's type.
    pub fn retarget(&self, relation: RelationRef) -> MaterializedObject {
        debug_assert_eq!(relation.relation_type(), self.relation.relation_type());
        MaterializedObject {
            relation,
            query: self.query.clone(),
            indexes: self.indexes.clone(),
        }
    }

    /// The same object with no indexes, as a bare create leaves it.
    pub fn without_indexes(&self) -> MaterializedObject {
        MaterializedObject {
            relation: self.relation.clone(),
            query: self.query.clone(),
            indexes: BTreeSet::new(),
        }
    }

    /// The same object with one index added or removed.
    pub fn with_index(&self, index: IndexSpec, present: bool) -> MaterializedObject {
        let mut indexes = self.indexes.clone();
        if present {
            indexes.replace(index);
        } else {
            indexes.remove(&index);
        }
        MaterializedObject {
            relation: self.relation.clone(),
            query: self.query.clone(),
            indexes,
        }
    }

    /// Read-only index diff, with `self` as the desired state.
    pub fn index_changes(&self, actual: &MaterializedObject) -> IndexChangeSet {
        IndexChangeSet::between(&self.indexes, &actual.indexes)
    }
}

impl Deref for MaterializedObject {
    type Target = RelationRef;
    fn deref(&self) -> &RelationRef {
        &self.relation
    }
}
