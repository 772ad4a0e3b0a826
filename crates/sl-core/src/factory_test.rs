use super::*;
use crate::describe::{IndexRow, RelationMetadata};
use crate::model_node::IndexConfig;

fn relation_factory() -> RelationFactory {
    RelationFactory::new(Dialect::Postgres)
}

fn materialized_view_ref(factory: &RelationFactory) -> RelationRef {
    factory
        .make_ref(
            Some("my_database"),
            "my_schema",
            "my_materialized_view",
            RelationType::MaterializedView,
        )
        .unwrap()
}

fn index_row(index_name: &str, column_name: &str, method: &str, unique: bool) -> IndexRow {
    IndexRow {
        index_name: index_name.to_string(),
        column_name: column_name.to_string(),
        method: method.to_string(),
        unique,
    }
}

fn materialized_view_describe_relation_results() -> DescribeRelationResult {
    DescribeRelationResult {
        relation: RelationMetadata {
            database: Some("my_database".to_string()),
            schema: "my_schema".to_string(),
            name: "my_materialized_view".to_string(),
            relation_type: "materialized_view".to_string(),
            definition: Some("select 42 from meaning_of_life".to_string()),
        },
        indexes: vec![
            index_row("my_index_1", "id", "hash", false),
            index_row("my_index_1", "value", "hash", false),
            index_row("my_index_2", "id", "btree", true),
        ],
    }
}

fn materialized_view_model_node() -> RenderedModelNode {
    RenderedModelNode {
        database: Some("my_database".to_string()),
        schema: Some("my_schema".to_string()),
        name: Some("my_materialized_view".to_string()),
        materialization: Some("materialized_view".to_string()),
        indexes: vec![
            IndexConfig {
                columns: vec!["id".to_string(), "value".to_string()],
                method: Some("hash".to_string()),
                unique: false,
            },
            IndexConfig {
                columns: vec!["id".to_string()],
                method: Some("btree".to_string()),
                unique: true,
            },
        ],
        query: Some("select 42 from meaning_of_life".to_string()),
    }
}

fn expected_indexes(factory: &RelationFactory) -> (IndexSpec, IndexSpec) {
    let render = Arc::clone(factory.render_policy());
    (
        IndexSpec::new(["id", "value"], IndexMethod::Hash, false, Arc::clone(&render)),
        IndexSpec::new(["id"], IndexMethod::Btree, true, render),
    )
}

#[test]
fn test_make_ref() {
    let factory = relation_factory();
    let r = materialized_view_ref(&factory);
    assert_eq!(r.name(), "my_materialized_view");
    assert_eq!(r.schema(), "my_schema");
    assert_eq!(r.database(), Some("my_database"));
    assert_eq!(r.relation_type(), RelationType::MaterializedView);
    assert!(r.can_be_renamed());
}

#[test]
fn test_make_ref_rename_capability_follows_dialect() {
    let factory = RelationFactory::new(Dialect::Snowflake);
    let r = factory
        .make_ref(None, "s", "dyn", RelationType::MaterializedView)
        .unwrap();
    assert!(!r.can_be_renamed());
}

#[test]
fn test_make_ref_rejects_empty_name() {
    let factory = relation_factory();
    let err = factory
        .make_ref(None, "my_schema", "", RelationType::Table)
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidIdentifier { .. }));
}

#[test]
fn test_make_ref_rejects_empty_schema_and_database() {
    let factory = relation_factory();
    assert!(factory.make_ref(None, "", "t", RelationType::Table).is_err());
    assert!(factory
        .make_ref(Some(""), "s", "t", RelationType::Table)
        .is_err());
}

#[test]
fn test_make_ref_rejects_unquotable_characters() {
    let factory = relation_factory();
    let err = factory
        .make_ref(None, "my_schema", "bad\0name", RelationType::Table)
        .unwrap_err();
    assert!(err.to_string().contains("[R001]"));
}

#[test]
fn test_make_ref_accepts_embedded_quotes() {
    let factory = relation_factory();
    let r = factory
        .make_ref(None, "my_schema", r#"odd"name"#, RelationType::Table)
        .unwrap();
    assert_eq!(r.render_name(), r#""odd""name""#);
}

#[test]
fn test_make_backup_ref() {
    let factory = relation_factory();
    let backup_ref = factory.make_backup_ref(&materialized_view_ref(&factory));
    assert_eq!(backup_ref.render_name(), r#""my_materialized_view__dbt_backup""#);
}

#[test]
fn test_make_intermediate() {
    let factory = relation_factory();
    let intermediate = factory.make_intermediate(&materialized_view_ref(&factory));
    assert_eq!(intermediate.render_name(), r#""my_materialized_view__dbt_tmp""#);
}

#[test]
fn test_derived_refs_keep_location_and_type() {
    let factory = relation_factory();
    let original = materialized_view_ref(&factory);
    let backup = factory.make_backup_ref(&original);
    let intermediate = factory.make_intermediate(&original);

    for derived in [&backup, &intermediate] {
        assert_eq!(derived.database(), original.database());
        assert_eq!(derived.schema(), original.schema());
        assert_eq!(derived.relation_type(), original.relation_type());
        assert_eq!(derived.can_be_renamed(), original.can_be_renamed());
        assert_ne!(derived.render(), original.render());
    }
    assert_ne!(backup.render(), intermediate.render());
    assert_ne!(backup, intermediate);
}

#[test]
fn test_backup_of_non_renamable_stays_non_renamable() {
    let factory = RelationFactory::new(Dialect::Snowflake);
    let r = factory
        .make_ref(None, "s", "dyn", RelationType::MaterializedView)
        .unwrap();
    assert!(!factory.make_backup_ref(&r).can_be_renamed());
}

#[test]
fn test_double_backup_is_well_defined() {
    let factory = relation_factory();
    let r = materialized_view_ref(&factory);
    let twice = factory.make_backup_ref(&factory.make_backup_ref(&r));
    assert_eq!(twice.name(), "my_materialized_view__dbt_backup__dbt_backup");
    assert!(factory.is_derived_name(&twice));
    assert!(!factory.is_derived_name(&r));
}

#[test]
fn test_custom_suffixes_from_config() {
    let config = Config::from_yaml_str("suffixes:\n  backup: _bak\n  intermediate: _new\n").unwrap();
    let factory = RelationFactory::from_config(&config);
    let r = factory.make_ref(None, "s", "t", RelationType::Table).unwrap();
    assert_eq!(factory.make_backup_ref(&r).name(), "t_bak");
    assert_eq!(factory.make_intermediate(&r).name(), "t_new");
}

#[test]
fn test_make_from_describe_relation_results() {
    let factory = relation_factory();
    let materialized_view = factory
        .make_from_describe_result(
            &materialized_view_describe_relation_results(),
            RelationType::MaterializedView,
        )
        .unwrap();

    assert_eq!(materialized_view.name(), "my_materialized_view");
    assert_eq!(materialized_view.schema(), "my_schema");
    assert_eq!(materialized_view.database(), Some("my_database"));
    assert_eq!(
        materialized_view.query(),
        Some("select 42 from meaning_of_life")
    );

    let (index_1, index_2) = expected_indexes(&factory);
    assert_eq!(materialized_view.indexes().len(), 2);
    assert!(materialized_view.indexes().contains(&index_1));
    assert!(materialized_view.indexes().contains(&index_2));
}

#[test]
fn test_describe_keeps_catalog_index_names() {
    let factory = relation_factory();
    let mv = factory
        .make_from_describe_result(
            &materialized_view_describe_relation_results(),
            RelationType::MaterializedView,
        )
        .unwrap();
    let mut names: Vec<_> = mv.indexes().iter().filter_map(|i| i.catalog_name()).collect();
    names.sort();
    assert_eq!(names, vec!["my_index_1", "my_index_2"]);
}

#[test]
fn test_make_from_model_node() {
    let factory = relation_factory();
    let materialized_view = factory
        .make_from_model_node(&materialized_view_model_node())
        .unwrap();

    assert_eq!(materialized_view.name(), "my_materialized_view");
    assert_eq!(materialized_view.schema(), "my_schema");
    assert_eq!(materialized_view.database(), Some("my_database"));
    assert_eq!(
        materialized_view.query(),
        Some("select 42 from meaning_of_life")
    );

    let (index_1, index_2) = expected_indexes(&factory);
    assert!(materialized_view.indexes().contains(&index_1));
    assert!(materialized_view.indexes().contains(&index_2));
}

#[test]
fn test_describe_and_model_node_agree() {
    let factory = relation_factory();
    let actual = factory
        .make_from_describe_result(
            &materialized_view_describe_relation_results(),
            RelationType::MaterializedView,
        )
        .unwrap();
    let desired = factory
        .make_from_model_node(&materialized_view_model_node())
        .unwrap();

    assert_eq!(actual.relation(), desired.relation());
    assert_eq!(actual.indexes(), desired.indexes());
    assert!(desired.index_changes(&actual).is_empty());
    assert_eq!(actual, desired);
}

#[test]
fn test_describe_type_mismatch() {
    let factory = relation_factory();
    let err = factory
        .make_from_describe_result(
            &materialized_view_describe_relation_results(),
            RelationType::Table,
        )
        .unwrap_err();
    match err {
        CoreError::SchemaMismatch {
            expected, found, ..
        } => {
            assert_eq!(expected, "table");
            assert_eq!(found, "materialized_view");
        }
        other => panic!("expected SchemaMismatch, got {other:?}"),
    }
}

#[test]
fn test_describe_unrecognized_type_token_is_mismatch() {
    let factory = relation_factory();
    let mut result = materialized_view_describe_relation_results();
    result.relation.relation_type = "sequence".to_string();
    let err = factory
        .make_from_describe_result(&result, RelationType::MaterializedView)
        .unwrap_err();
    assert!(err.to_string().contains("[R002]"));
}

#[test]
fn test_describe_unknown_method_degrades() {
    let factory = relation_factory();
    let mut result = materialized_view_describe_relation_results();
    result.indexes.push(index_row("my_bloom", "value", "bloom", false));

    let mv = factory
        .make_from_describe_result(&result, RelationType::MaterializedView)
        .unwrap();
    assert_eq!(mv.indexes().len(), 3);
    let unknown = factory
        .make_index(["value"], IndexMethod::Unknown, false)
        .unwrap();
    assert!(mv.indexes().contains(&unknown));
}

#[test]
fn test_describe_skips_expression_only_index() {
    let factory = relation_factory();
    let mut result = materialized_view_describe_relation_results();
    result.indexes.push(index_row("expr_idx", "", "btree", false));

    let mv = factory
        .make_from_describe_result(&result, RelationType::MaterializedView)
        .unwrap();
    assert_eq!(mv.indexes().len(), 2);
}

#[test]
fn test_describe_ignores_indexes_on_unindexable_type() {
    let factory = RelationFactory::new(Dialect::DuckDb);
    let mut result = materialized_view_describe_relation_results();
    result.relation.relation_type = "BASE TABLE".to_string();
    result.relation.definition = None;

    let table = factory
        .make_from_describe_result(&result, RelationType::Table)
        .unwrap();
    assert!(table.indexes().is_empty());
    assert_eq!(table.query(), None);
}

#[test]
fn test_describe_blank_definition_is_none() {
    let factory = relation_factory();
    let mut result = materialized_view_describe_relation_results();
    result.relation.definition = Some("   ".to_string());
    let mv = factory
        .make_from_describe_result(&result, RelationType::MaterializedView)
        .unwrap();
    assert_eq!(mv.query(), None);
}

#[test]
fn test_model_node_missing_name() {
    let factory = relation_factory();
    let mut node = materialized_view_model_node();
    node.name = None;
    let err = factory.make_from_model_node(&node).unwrap_err();
    assert!(matches!(err, CoreError::ConfigValidation { .. }));
    assert!(err.to_string().contains("'name'"));
}

#[test]
fn test_model_node_missing_schema_uses_default() {
    let config = Config::from_yaml_str("dialect: postgres\nschema: analytics\n").unwrap();
    let factory = RelationFactory::from_config(&config);
    let mut node = materialized_view_model_node();
    node.schema = None;
    let mv = factory.make_from_model_node(&node).unwrap();
    assert_eq!(mv.schema(), "analytics");
}

#[test]
fn test_model_node_missing_schema_without_default() {
    let factory = relation_factory();
    let mut node = materialized_view_model_node();
    node.schema = None;
    let err = factory.make_from_model_node(&node).unwrap_err();
    assert!(err.to_string().contains("'schema'"));
}

#[test]
fn test_model_node_missing_query() {
    let factory = relation_factory();
    let mut node = materialized_view_model_node();
    node.query = Some("  ".to_string());
    let err = factory.make_from_model_node(&node).unwrap_err();
    assert!(err.to_string().contains("'query'"));
}

#[test]
fn test_model_node_index_with_zero_columns() {
    let factory = relation_factory();
    let mut node = materialized_view_model_node();
    node.indexes.push(IndexConfig::default());
    let err = factory.make_from_model_node(&node).unwrap_err();
    assert!(matches!(err, CoreError::ConfigValidation { .. }));
    assert!(err.to_string().contains("zero columns"));
}

#[test]
fn test_model_node_index_with_blank_column() {
    let factory = relation_factory();
    let mut node = materialized_view_model_node();
    node.indexes.push(IndexConfig {
        columns: vec![" ".to_string()],
        ..IndexConfig::default()
    });
    assert!(factory.make_from_model_node(&node).is_err());
}

#[test]
fn test_model_node_unknown_index_type() {
    let factory = relation_factory();
    let mut node = materialized_view_model_node();
    node.indexes[0].method = Some("bloom".to_string());
    let err = factory.make_from_model_node(&node).unwrap_err();
    assert!(err.to_string().contains("unknown type 'bloom'"));
}

#[test]
fn test_model_node_index_type_defaults_to_btree() {
    let factory = relation_factory();
    let mut node = materialized_view_model_node();
    node.indexes[1].method = None;
    let mv = factory.make_from_model_node(&node).unwrap();
    let (_, btree) = expected_indexes(&factory);
    assert!(mv.indexes().contains(&btree));
}

#[test]
fn test_model_node_ephemeral_rejected() {
    let factory = relation_factory();
    let mut node = materialized_view_model_node();
    node.materialization = Some("ephemeral".to_string());
    node.indexes.clear();
    let err = factory.make_from_model_node(&node).unwrap_err();
    assert!(err.to_string().contains("does not produce a warehouse object"));
}

#[test]
fn test_model_node_unknown_materialization() {
    let factory = relation_factory();
    let mut node = materialized_view_model_node();
    node.materialization = Some("snapshot".to_string());
    assert!(factory.make_from_model_node(&node).is_err());
}

#[test]
fn test_model_node_indexes_on_view_rejected() {
    let factory = relation_factory();
    let mut node = materialized_view_model_node();
    node.materialization = Some("view".to_string());
    let err = factory.make_from_model_node(&node).unwrap_err();
    assert!(err.to_string().contains("cannot host indexes"));
}

#[test]
fn test_model_node_incremental_is_table() {
    let factory = RelationFactory::new(Dialect::DuckDb);
    let node = RenderedModelNode {
        schema: Some("main".to_string()),
        name: Some("events".to_string()),
        materialization: Some("incremental".to_string()),
        query: Some("select 1 as id".to_string()),
        ..RenderedModelNode::default()
    };
    let table = factory.make_from_model_node(&node).unwrap();
    assert_eq!(table.relation_type(), RelationType::Table);
    assert_eq!(table.database(), None);
    assert_eq!(table.render(), r#""main"."events""#);
}

#[test]
fn test_model_node_invalid_identifier_propagates() {
    let factory = relation_factory();
    let mut node = materialized_view_model_node();
    node.name = Some("bad\nname".to_string());
    let err = factory.make_from_model_node(&node).unwrap_err();
    assert!(matches!(err, CoreError::InvalidIdentifier { .. }));
}

#[test]
fn test_retarget_and_without_indexes() {
    let factory = relation_factory();
    let desired = factory
        .make_from_model_node(&materialized_view_model_node())
        .unwrap();
    let tmp = factory.make_intermediate(desired.relation());
    let moved = desired.retarget(tmp.clone());
    assert_eq!(moved.relation(), &tmp);
    assert_eq!(moved.query(), desired.query());
    assert_eq!(moved.indexes(), desired.indexes());
    // The original is untouched
    assert_eq!(desired.name(), "my_materialized_view");

    let bare = desired.without_indexes();
    assert!(bare.indexes().is_empty());
    assert_eq!(desired.indexes().len(), 2);
}

#[test]
fn test_index_changes_report_both_directions() {
    let factory = relation_factory();
    let desired = factory
        .make_from_model_node(&materialized_view_model_node())
        .unwrap();
    let mut result = materialized_view_describe_relation_results();
    result.indexes.retain(|row| row.index_name == "my_index_2");
    result.indexes.push(index_row("stale_idx", "created_at", "brin", false));
    let actual = factory
        .make_from_describe_result(&result, RelationType::MaterializedView)
        .unwrap();

    let changes = desired.index_changes(&actual);
    let (hash_idx, _) = expected_indexes(&factory);
    assert_eq!(changes.create, vec![hash_idx]);
    assert_eq!(changes.drop.len(), 1);
    assert_eq!(changes.drop[0].catalog_name(), Some("stale_idx"));
}
