//! Relation references
//!
//! A [`RelationRef`] identifies one warehouse object. Refs are built by the
//! [`RelationFactory`](crate::factory::RelationFactory) and never mutated;
//! backup and intermediate names are new refs derived from the original.

use crate::relation_type::RelationType;
use crate::render::RenderPolicy;
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a single warehouse object.
///
/// Equality and hashing cover `(database, schema, name, relation_type)` only.
/// Two refs naming the same object compare equal regardless of which render
/// policy they carry or how `can_be_renamed` was derived.
#[derive(Debug, Clone, Serialize)]
pub struct RelationRef {
    database: Option<String>,
    schema: String,
    name: String,
    relation_type: RelationType,
    can_be_renamed: bool,
    #[serde(skip)]
    render: Arc<RenderPolicy>,
}

impl RelationRef {
    pub(crate) fn new(
        database: Option<String>,
        schema: String,
        name: String,
        relation_type: RelationType,
        can_be_renamed: bool,
        render: Arc<RenderPolicy>,
    ) -> Self {
        debug_assert!(!name.is_empty(), "RelationRef name must not be empty");
        Self {
            database,
            schema,
            name,
            relation_type,
            can_be_renamed,
            render,
        }
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Raw, unquoted object name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn relation_type(&self) -> RelationType {
        self.relation_type
    }

    pub fn can_be_renamed(&self) -> bool {
        self.can_be_renamed
    }

    pub fn render_policy(&self) -> &Arc<RenderPolicy> {
        &self.render
    }

    /// Fully qualified, quoted identifier
    pub fn render(&self) -> String {
        self.render
            .render(self.database.as_deref(), &self.schema, &self.name)
    }

    /// Quoted object name without schema or database
    pub fn render_name(&self) -> String {
        self.render.quote(&self.name)
    }

    /// Whether `other` names the same catalog entry, ignoring object type.
    pub fn same_location(&self, other: &RelationRef) -> bool {
        self.database == other.database && self.schema == other.schema && self.name == other.name
    }

    /// Derive a sibling ref whose raw name carries `suffix`.
    ///
    /// Everything except the name is copied, including `can_be_renamed`.
    pub(crate) fn with_suffix(&self, suffix: &str) -> RelationRef {
        RelationRef {
            name: format!("{}{}", self.name, suffix),
            ..self.clone()
        }
    }

    /// Same object location with a different type, keeping the policy.
    pub(crate) fn with_type(&self, relation_type: RelationType, can_be_renamed: bool) -> Self {
        RelationRef {
            relation_type,
            can_be_renamed,
            ..self.clone()
        }
    }
}

impl PartialEq for RelationRef {
    fn eq(&self, other: &Self) -> bool {
        self.same_location(other) && self.relation_type == other.relation_type
    }
}

impl Eq for RelationRef {}

impl Hash for RelationRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.database.hash(state);
        self.schema.hash(state);
        self.name.hash(state);
        self.relation_type.hash(state);
    }
}

impl fmt::Display for RelationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
#[path = "relation_test.rs"]
mod tests;
