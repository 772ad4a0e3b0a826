use super::*;
use std::collections::HashSet;

fn make(database: Option<&str>, name: &str, policy: RenderPolicy, renamable: bool) -> RelationRef {
    RelationRef::new(
        database.map(String::from),
        "my_schema".to_string(),
        name.to_string(),
        RelationType::MaterializedView,
        renamable,
        Arc::new(policy),
    )
}

#[test]
fn test_accessors() {
    let r = make(
        Some("my_database"),
        "my_materialized_view",
        RenderPolicy::postgres(),
        true,
    );
    assert_eq!(r.name(), "my_materialized_view");
    assert_eq!(r.schema(), "my_schema");
    assert_eq!(r.database(), Some("my_database"));
    assert_eq!(r.relation_type(), RelationType::MaterializedView);
    assert!(r.can_be_renamed());
}

#[test]
fn test_render() {
    let r = make(Some("my_database"), "orders", RenderPolicy::postgres(), true);
    assert_eq!(r.render(), r#""my_database"."my_schema"."orders""#);
    assert_eq!(r.render_name(), r#""orders""#);
    assert_eq!(r.to_string(), r.render());
}

#[test]
fn test_equality_ignores_policy_and_rename_flag() {
    let a = make(Some("db"), "orders", RenderPolicy::postgres(), true);
    let b = make(Some("db"), "orders", RenderPolicy::duckdb(), false);
    assert_eq!(a, b);

    let mut set = HashSet::new();
    set.insert(a);
    set.insert(b);
    assert_eq!(set.len(), 1);
}

#[test]
fn test_equality_includes_type() {
    let a = make(Some("db"), "orders", RenderPolicy::postgres(), true);
    let b = a.with_type(RelationType::Table, true);
    assert_ne!(a, b);
    assert!(a.same_location(&b));
}

#[test]
fn test_equality_includes_database() {
    let a = make(Some("db"), "orders", RenderPolicy::postgres(), true);
    let b = make(None, "orders", RenderPolicy::postgres(), true);
    assert_ne!(a, b);
}

#[test]
fn test_with_suffix_is_a_new_ref() {
    let original = make(Some("db"), "orders", RenderPolicy::postgres(), true);
    let backup = original.with_suffix("__dbt_backup");
    assert_eq!(original.name(), "orders");
    assert_eq!(backup.name(), "orders__dbt_backup");
    assert_eq!(backup.schema(), original.schema());
    assert_eq!(backup.database(), original.database());
    assert_eq!(backup.relation_type(), original.relation_type());
    assert!(backup.can_be_renamed());
}

#[test]
fn test_policy_is_shared_not_copied() {
    let policy = Arc::new(RenderPolicy::postgres());
    let r = RelationRef::new(
        None,
        "s".to_string(),
        "t".to_string(),
        RelationType::Table,
        true,
        Arc::clone(&policy),
    );
    let derived = r.with_suffix("__dbt_tmp");
    assert!(Arc::ptr_eq(r.render_policy(), &policy));
    assert!(Arc::ptr_eq(derived.render_policy(), &policy));
}

#[test]
fn test_serialize_skips_policy() {
    let r = make(None, "orders", RenderPolicy::postgres(), true);
    let json = serde_json::to_value(&r).unwrap();
    assert_eq!(json["name"], "orders");
    assert_eq!(json["relation_type"], "materialized_view");
    assert!(json.get("render").is_none());
}
