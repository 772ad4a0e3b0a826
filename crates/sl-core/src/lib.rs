//! sl-core - Core library for Swapline
//!
//! This crate provides the relation identity model shared by every Swapline
//! component: render policies, relation references, index specifications,
//! materialized objects, the relation factory that builds them from explicit
//! arguments, catalog describe results and rendered model nodes, and the DDL
//! intents the refresh protocol emits.

pub mod config;
pub mod describe;
pub mod dialect;
pub mod error;
pub mod factory;
pub mod index;
pub mod intent;
pub mod materialized;
pub mod model_node;
pub mod relation;
pub mod relation_type;
pub mod render;
pub(crate) mod serde_helpers;

pub use config::{Config, DatabaseConfig, IndexMaintenanceConfig, SuffixConfig};
pub use describe::{DescribeRelationResult, IndexRow, RelationMetadata};
pub use dialect::Dialect;
pub use error::{CoreError, CoreResult};
pub use factory::RelationFactory;
pub use index::{IndexChangeSet, IndexMethod, IndexSpec};
pub use intent::DdlIntent;
pub use materialized::MaterializedObject;
pub use model_node::{IndexConfig, RenderedModelNode};
pub use relation::RelationRef;
pub use relation_type::RelationType;
pub use render::{CaseFolding, RenderPolicy};
