//! DDL intents
//!
//! Structured descriptions of the statements the refresh protocol needs run.
//! An execution layer renders them to SQL for its dialect, using the relation
//! refs' own rendering; this crate never produces SQL text.

use crate::index::IndexSpec;
use crate::materialized::MaterializedObject;
use crate::relation::RelationRef;
use serde::Serialize;
use std::fmt;

/// One DDL statement to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DdlIntent {
    /// Create `object` under its own name; fails if the name is taken
    Create { object: MaterializedObject },

    /// Rename `from` to `to`; both share a schema
    Rename { from: RelationRef, to: RelationRef },

    /// Drop `relation` if it exists
    Drop { relation: RelationRef },

    /// Create or replace `object` in one statement
    Replace { object: MaterializedObject },

    CreateIndex {
        relation: RelationRef,
        index: IndexSpec,
    },

    DropIndex {
        relation: RelationRef,
        index: IndexSpec,
    },
}

impl DdlIntent {
    pub fn kind(&self) -> &'static str {
        match self {
            DdlIntent::Create { .. } => "create",
            DdlIntent::Rename { .. } => "rename",
            DdlIntent::Drop { .. } => "drop",
            DdlIntent::Replace { .. } => "replace",
            DdlIntent::CreateIndex { .. } => "create_index",
            DdlIntent::DropIndex { .. } => "drop_index",
        }
    }

    /// The relation this intent acts on (the rename source for renames)
    pub fn relation(&self) -> &RelationRef {
        match self {
            DdlIntent::Create { object } | DdlIntent::Replace { object } => object.relation(),
            DdlIntent::Rename { from, .. } => from,
            DdlIntent::Drop { relation }
            | DdlIntent::CreateIndex { relation, .. }
            | DdlIntent::DropIndex { relation, .. } => relation,
        }
    }
}

impl fmt::Display for DdlIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DdlIntent::Create { object } => {
                write!(f, "create {} {}", object.relation_type(), object.render())
            }
            DdlIntent::Rename { from, to } => {
                write!(f, "rename {} to {}", from.render(), to.render_name())
            }
            DdlIntent::Drop { relation } => {
                write!(f, "drop {} {}", relation.relation_type(), relation.render())
            }
            DdlIntent::Replace { object } => {
                write!(f, "replace {} {}", object.relation_type(), object.render())
            }
            DdlIntent::CreateIndex { relation, index } => {
                write!(f, "create {} index on {}", index, relation.render())
            }
            DdlIntent::DropIndex { relation, index } => {
                write!(f, "drop {} index on {}", index, relation.render())
            }
        }
    }
}
