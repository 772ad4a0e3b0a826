use super::*;
use crate::relation_type::RelationType;
use chrono::TimeZone;
use std::collections::HashSet;

fn pg() -> Arc<RenderPolicy> {
    Arc::new(RenderPolicy::postgres())
}

fn relation(name: &str) -> RelationRef {
    RelationRef::new(
        Some("my_database".to_string()),
        "my_schema".to_string(),
        name.to_string(),
        RelationType::MaterializedView,
        true,
        pg(),
    )
}

#[test]
fn test_column_order_is_irrelevant() {
    let a = IndexSpec::new(["id", "value"], IndexMethod::Hash, false, pg());
    let b = IndexSpec::new(["value", "id"], IndexMethod::Hash, false, pg());
    assert_eq!(a, b);

    let mut set = HashSet::new();
    set.insert(a);
    set.insert(b);
    assert_eq!(set.len(), 1);
}

#[test]
fn test_method_and_uniqueness_are_identity() {
    let hash = IndexSpec::new(["id"], IndexMethod::Hash, false, pg());
    let btree = IndexSpec::new(["id"], IndexMethod::Btree, false, pg());
    let unique = IndexSpec::new(["id"], IndexMethod::Btree, true, pg());
    assert_ne!(hash, btree);
    assert_ne!(btree, unique);
}

#[test]
fn test_duplicate_columns_collapse() {
    let spec = IndexSpec::new(["id", "id"], IndexMethod::Btree, false, pg());
    assert_eq!(spec.columns().len(), 1);
}

#[test]
fn test_columns_fold_before_comparison() {
    let upper = IndexSpec::new(["ID", "Value"], IndexMethod::Btree, false, pg());
    let lower = IndexSpec::new(["id", "value"], IndexMethod::Btree, false, pg());
    assert_eq!(upper, lower);

    let preserving = Arc::new(RenderPolicy::duckdb());
    let upper = IndexSpec::new(["ID"], IndexMethod::Art, false, Arc::clone(&preserving));
    let lower = IndexSpec::new(["id"], IndexMethod::Art, false, preserving);
    assert_ne!(upper, lower);
}

#[test]
fn test_empty_columns_rejected() {
    let empty: Vec<String> = vec![];
    assert!(IndexSpec::try_new(empty, IndexMethod::Btree, false, pg()).is_none());
}

#[test]
#[should_panic(expected = "must not be empty")]
fn test_new_panics_on_empty_columns() {
    let empty: Vec<&str> = vec![];
    let _ = IndexSpec::new(empty, IndexMethod::Btree, false, pg());
}

#[test]
fn test_catalog_name_is_not_identity() {
    let named = IndexSpec::new(["id"], IndexMethod::Btree, true, pg()).with_catalog_name("pk_idx");
    let unnamed = IndexSpec::new(["id"], IndexMethod::Btree, true, pg());
    assert_eq!(named, unnamed);
    assert_eq!(named.catalog_name(), Some("pk_idx"));
    assert_eq!(unnamed.catalog_name(), None);
}

#[test]
fn test_method_tokens() {
    assert_eq!(IndexMethod::parse("HASH"), Some(IndexMethod::Hash));
    assert_eq!(IndexMethod::parse("btree"), Some(IndexMethod::Btree));
    assert_eq!(IndexMethod::parse("unknown"), None);
    assert_eq!(IndexMethod::parse("bloom"), None);
    assert_eq!(IndexMethod::from_catalog_token("bloom"), IndexMethod::Unknown);
    assert_eq!(IndexMethod::from_catalog_token("gin"), IndexMethod::Gin);
}

#[test]
fn test_render_columns_sorted_and_quoted() {
    let spec = IndexSpec::new(["value", "id"], IndexMethod::Hash, false, pg());
    assert_eq!(spec.render_columns(), r#""id", "value""#);
    assert_eq!(spec.to_string(), r#"hash ("id", "value")"#);
}

#[test]
fn test_render_name_deterministic_for_same_inputs() {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let a = IndexSpec::new(["id", "value"], IndexMethod::Hash, false, pg());
    let b = IndexSpec::new(["value", "id"], IndexMethod::Hash, false, pg());
    let rel = relation("my_materialized_view");
    let name = a.render_name(&rel, at);
    assert_eq!(name, b.render_name(&rel, at));
    // 32 hex chars plus the two quotes
    assert_eq!(name.len(), 34);
    assert!(name.starts_with('"') && name.ends_with('"'));
}

#[test]
fn test_render_name_varies_with_relation_and_time() {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let later = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap();
    let spec = IndexSpec::new(["id"], IndexMethod::Btree, true, pg());
    let canonical = relation("orders");
    let tmp = relation("orders__dbt_tmp");
    assert_ne!(spec.render_name(&canonical, at), spec.render_name(&tmp, at));
    assert_ne!(spec.render_name(&tmp, at), spec.render_name(&tmp, later));
}

#[test]
fn test_render_name_prefers_catalog_name() {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let spec = IndexSpec::new(["id"], IndexMethod::Btree, true, pg()).with_catalog_name("orders_pk");
    assert_eq!(spec.render_name(&relation("orders"), at), r#""orders_pk""#);
}

#[test]
fn test_change_set_both_directions() {
    let keep = IndexSpec::new(["id"], IndexMethod::Btree, true, pg());
    let add = IndexSpec::new(["value"], IndexMethod::Hash, false, pg());
    let remove = IndexSpec::new(["created_at"], IndexMethod::Brin, false, pg());

    let desired: BTreeSet<_> = [keep.clone(), add.clone()].into_iter().collect();
    let actual: BTreeSet<_> = [keep, remove.clone()].into_iter().collect();

    let changes = IndexChangeSet::between(&desired, &actual);
    assert_eq!(changes.create, vec![add]);
    assert_eq!(changes.drop, vec![remove]);
    assert!(!changes.is_empty());
}

#[test]
fn test_change_set_empty_when_equal() {
    let desired: BTreeSet<_> = [IndexSpec::new(["id", "value"], IndexMethod::Hash, false, pg())]
        .into_iter()
        .collect();
    let actual: BTreeSet<_> = [IndexSpec::new(["value", "id"], IndexMethod::Hash, false, pg())]
        .into_iter()
        .collect();
    assert!(IndexChangeSet::between(&desired, &actual).is_empty());
}
