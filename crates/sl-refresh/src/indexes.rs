//! Index maintenance
//!
//! Index changes are applied after a refresh, outside the swap sequence.
//! Drops run before creates so a changed index never coexists with its old
//! definition.

use crate::error::{Recovery, RefreshError, RefreshResult, RefreshStep};
use sl_core::{DdlIntent, IndexChangeSet, RelationRef};
use sl_db::DdlExecutor;

/// Intents that apply `changes` to `relation`, drops first.
pub fn index_intents(relation: &RelationRef, changes: &IndexChangeSet) -> Vec<DdlIntent> {
    let drops = changes.drop.iter().map(|index| DdlIntent::DropIndex {
        relation: relation.clone(),
        index: index.clone(),
    });
    let creates = changes.create.iter().map(|index| DdlIntent::CreateIndex {
        relation: relation.clone(),
        index: index.clone(),
    });
    drops.chain(creates).collect()
}

/// Execute the intents from [`index_intents`], stopping at the first failure.
pub async fn apply_index_changes(
    executor: &dyn DdlExecutor,
    relation: &RelationRef,
    changes: &IndexChangeSet,
) -> RefreshResult<Vec<DdlIntent>> {
    let intents = index_intents(relation, changes);
    for intent in &intents {
        log::debug!("{} {}", executor.db_type(), intent);
        if let Err(source) = executor.execute(intent).await {
            let step = match intent {
                DdlIntent::DropIndex { .. } => RefreshStep::DropIndex,
                _ => RefreshStep::CreateIndex,
            };
            return Err(RefreshError::DdlExecution {
                relation: relation.render(),
                step,
                recovery: Recovery::Untouched,
                source,
            });
        }
    }
    Ok(intents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_core::{Dialect, IndexMethod, RelationFactory, RelationType};
    use sl_db::{DbError, MemoryCatalog};

    fn setup() -> (RelationFactory, RelationRef) {
        let f = RelationFactory::new(Dialect::Postgres);
        let r = f
            .make_ref(None, "analytics", "orders", RelationType::Table)
            .unwrap();
        (f, r)
    }

    #[test]
    fn test_drops_come_first() {
        let (f, r) = setup();
        let changes = IndexChangeSet {
            create: vec![f.make_index(["id"], IndexMethod::Btree, true).unwrap()],
            drop: vec![f.make_index(["id"], IndexMethod::Hash, false).unwrap()],
        };
        let intents = index_intents(&r, &changes);
        let kinds: Vec<_> = intents.iter().map(DdlIntent::kind).collect();
        assert_eq!(kinds, vec!["drop_index", "create_index"]);
    }

    #[test]
    fn test_empty_changes() {
        let (_, r) = setup();
        assert!(index_intents(&r, &IndexChangeSet::default()).is_empty());
    }

    #[tokio::test]
    async fn test_failure_names_step() {
        let (f, r) = setup();
        let catalog = MemoryCatalog::new();
        catalog.fail_next("no space", |i| matches!(i, DdlIntent::CreateIndex { .. }));
        let changes = IndexChangeSet {
            create: vec![f.make_index(["id"], IndexMethod::Btree, true).unwrap()],
            drop: Vec::new(),
        };

        let err = apply_index_changes(&catalog, &r, &changes)
            .await
            .unwrap_err();
        match err {
            RefreshError::DdlExecution { step, source, .. } => {
                assert_eq!(step, RefreshStep::CreateIndex);
                assert!(matches!(source, DbError::Injected(_)));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
