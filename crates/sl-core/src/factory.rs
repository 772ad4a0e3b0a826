//! Relation factory
//!
//! The single place where relation refs and materialized objects are built,
//! whether from explicit arguments, a catalog describe result, or a rendered
//! model node. Everything downstream works on the one [`MaterializedObject`]
//! shape regardless of origin.

use crate::config::{Config, DEFAULT_BACKUP_SUFFIX, DEFAULT_INTERMEDIATE_SUFFIX};
use crate::describe::DescribeRelationResult;
use crate::dialect::Dialect;
use crate::error::{CoreError, CoreResult};
use crate::index::{IndexMethod, IndexSpec};
use crate::materialized::MaterializedObject;
use crate::model_node::RenderedModelNode;
use crate::relation::RelationRef;
use crate::relation_type::RelationType;
use crate::render::RenderPolicy;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Builds refs and objects for one dialect.
#[derive(Debug, Clone)]
pub struct RelationFactory {
    dialect: Dialect,
    render: Arc<RenderPolicy>,
    backup_suffix: String,
    intermediate_suffix: String,
    default_schema: Option<String>,
}

/// Index rows sharing one catalog index name
struct IndexGroup {
    columns: Vec<String>,
    method: String,
    unique: bool,
}

impl RelationFactory {
    /// Factory with the dialect's render policy and the default suffixes
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            render: Arc::new(dialect.render_policy()),
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            intermediate_suffix: DEFAULT_INTERMEDIATE_SUFFIX.to_string(),
            default_schema: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            backup_suffix: config.suffixes.backup.clone(),
            intermediate_suffix: config.suffixes.intermediate.clone(),
            default_schema: config.schema.clone(),
            ..Self::new(config.dialect)
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn render_policy(&self) -> &Arc<RenderPolicy> {
        &self.render
    }

    pub fn backup_suffix(&self) -> &str {
        &self.backup_suffix
    }

    pub fn intermediate_suffix(&self) -> &str {
        &self.intermediate_suffix
    }

    /// Build a ref from explicit parts.
    ///
    /// `can_be_renamed` comes from the dialect's capability table.
    pub fn make_ref(
        &self,
        database: Option<&str>,
        schema: &str,
        name: &str,
        relation_type: RelationType,
    ) -> CoreResult<RelationRef> {
        if let Some(db) = database {
            self.check_identifier(db, "database")?;
        }
        self.check_identifier(schema, "schema")?;
        self.check_identifier(name, "name")?;

        Ok(RelationRef::new(
            database.map(String::from),
            schema.to_string(),
            name.to_string(),
            relation_type,
            self.dialect.can_rename(relation_type),
            Arc::clone(&self.render),
        ))
    }

    fn check_identifier(&self, ident: &str, part: &str) -> CoreResult<()> {
        if ident.is_empty() {
            return Err(CoreError::InvalidIdentifier {
                identifier: ident.to_string(),
                reason: format!("{} must not be empty", part),
            });
        }
        if !self.render.can_quote(ident) {
            return Err(CoreError::InvalidIdentifier {
                identifier: ident.escape_debug().to_string(),
                reason: format!("{} contains characters that cannot be quoted", part),
            });
        }
        Ok(())
    }

    /// Ref the live object is moved to during a swap.
    pub fn make_backup_ref(&self, relation: &RelationRef) -> RelationRef {
        relation.with_suffix(&self.backup_suffix)
    }

    /// Ref the replacement is built under before it is swapped in.
    pub fn make_intermediate(&self, relation: &RelationRef) -> RelationRef {
        relation.with_suffix(&self.intermediate_suffix)
    }

    /// Whether `relation` already carries a backup or intermediate suffix.
    pub fn is_derived_name(&self, relation: &RelationRef) -> bool {
        let name = relation.name();
        name.ends_with(&self.backup_suffix) || name.ends_with(&self.intermediate_suffix)
    }

    /// Same location as `relation`, typed as `relation_type`.
    pub fn retype(&self, relation: &RelationRef, relation_type: RelationType) -> RelationRef {
        relation.with_type(relation_type, self.dialect.can_rename(relation_type))
    }

    /// Build an index spec with this factory's render policy.
    pub fn make_index<I, S>(&self, columns: I, method: IndexMethod, unique: bool) -> Option<IndexSpec>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        IndexSpec::try_new(columns, method, unique, Arc::clone(&self.render))
    }

    /// Build the actual state of an object from a catalog describe result.
    ///
    /// Index rows are grouped by index name. An index whose method token is
    /// not recognized is kept with [`IndexMethod::Unknown`] and logged, so one
    /// odd index never blocks the rest of the object.
    pub fn make_from_describe_result(
        &self,
        result: &DescribeRelationResult,
        expected: RelationType,
    ) -> CoreResult<MaterializedObject> {
        let meta = &result.relation;
        let reported = RelationType::from_catalog_token(&meta.relation_type);
        if reported != Some(expected) {
            return Err(CoreError::SchemaMismatch {
                relation: format!("{}.{}", meta.schema, meta.name),
                expected: expected.to_string(),
                found: meta.relation_type.clone(),
            });
        }

        let relation = self.make_ref(meta.database.as_deref(), &meta.schema, &meta.name, expected)?;

        let indexes = if self.dialect.supports_indexes(expected) {
            self.group_index_rows(&relation, result)
        } else {
            if !result.indexes.is_empty() {
                log::warn!(
                    "Ignoring {} index row(s) on {}: {} {} relations do not host managed indexes",
                    result.indexes.len(),
                    relation,
                    self.dialect,
                    expected
                );
            }
            BTreeSet::new()
        };

        let query = meta
            .definition
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(String::from);

        Ok(MaterializedObject::new(relation, query, indexes))
    }

    fn group_index_rows(
        &self,
        relation: &RelationRef,
        result: &DescribeRelationResult,
    ) -> BTreeSet<IndexSpec> {
        let mut groups: BTreeMap<&str, IndexGroup> = BTreeMap::new();
        for row in &result.indexes {
            let group = groups
                .entry(row.index_name.as_str())
                .or_insert_with(|| IndexGroup {
                    columns: Vec::new(),
                    method: row.method.clone(),
                    unique: row.unique,
                });
            if !row.column_name.is_empty() {
                group.columns.push(row.column_name.clone());
            }
        }

        let mut indexes = BTreeSet::new();
        for (index_name, group) in groups {
            let method = IndexMethod::from_catalog_token(&group.method);
            if method == IndexMethod::Unknown {
                log::warn!(
                    "Index {} on {} uses unrecognized method '{}'; treating it as unknown",
                    index_name,
                    relation,
                    group.method
                );
            }
            match self.make_index(&group.columns, method, group.unique) {
                Some(spec) => {
                    indexes.insert(spec.with_catalog_name(index_name));
                }
                None => log::warn!(
                    "Index {} on {} has no plain columns (expression index?); skipping",
                    index_name,
                    relation
                ),
            }
        }
        indexes
    }

    /// Build the desired state of an object from a rendered model node.
    pub fn make_from_model_node(&self, node: &RenderedModelNode) -> CoreResult<MaterializedObject> {
        let model = node.display_name();
        let invalid = |message: String| CoreError::ConfigValidation {
            model: model.to_string(),
            message,
        };

        let name = node
            .name
            .as_deref()
            .ok_or_else(|| invalid("missing required field 'name'".to_string()))?;
        let schema = node
            .schema
            .as_deref()
            .or(self.default_schema.as_deref())
            .ok_or_else(|| invalid("missing required field 'schema'".to_string()))?;
        let token = node
            .materialization
            .as_deref()
            .ok_or_else(|| invalid("missing required field 'materialization'".to_string()))?;

        let relation_type = RelationType::from_materialization(token)
            .ok_or_else(|| invalid(format!("unknown materialization '{}'", token)))?;
        if !relation_type.is_warehouse_object() {
            return Err(invalid(format!(
                "materialization '{}' does not produce a warehouse object",
                token
            )));
        }

        let query = node
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| invalid("missing required field 'query'".to_string()))?;

        if !node.indexes.is_empty() && !self.dialect.supports_indexes(relation_type) {
            return Err(invalid(format!(
                "{} {} relations cannot host indexes",
                self.dialect, relation_type
            )));
        }

        let mut indexes = BTreeSet::new();
        for (i, index) in node.indexes.iter().enumerate() {
            let method = match index.method.as_deref() {
                None => IndexMethod::default(),
                Some(token) => IndexMethod::parse(token)
                    .ok_or_else(|| invalid(format!("index #{} has unknown type '{}'", i, token)))?,
            };
            if index.columns.iter().any(|c| c.trim().is_empty()) {
                return Err(invalid(format!("index #{} lists a blank column name", i)));
            }
            let spec = self
                .make_index(&index.columns, method, index.unique)
                .ok_or_else(|| invalid(format!("index #{} names zero columns", i)))?;
            indexes.insert(spec);
        }

        let relation = self.make_ref(node.database.as_deref(), schema, name, relation_type)?;

        Ok(MaterializedObject::new(
            relation,
            Some(query.to_string()),
            indexes,
        ))
    }
}

#[cfg(test)]
#[path = "factory_test.rs"]
mod tests;
