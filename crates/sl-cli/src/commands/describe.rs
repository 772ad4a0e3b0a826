//! Describe command implementation

use anyhow::{bail, Result};
use sl_core::{RelationFactory, RelationType};
use sl_refresh::RefreshProtocol;

use crate::cli::{DescribeArgs, GlobalArgs};
use crate::commands::common::{load_config, open_backend};

/// Execute the describe command
pub async fn execute(args: &DescribeArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let factory = RelationFactory::from_config(&config);
    let backend = open_backend(&config)?;

    let database = args.database.as_deref().or(config.database.name.as_deref());
    let relation = factory.make_ref(
        database,
        &args.schema,
        &args.name,
        RelationType::from(args.relation_type),
    )?;

    let protocol = RefreshProtocol::new(backend.as_ref(), &factory);
    let Some(object) = protocol.describe_actual(&relation).await? else {
        bail!("Relation not found: {}", relation);
    };
    if object.relation_type() != relation.relation_type() {
        log::warn!(
            "{} was described as a {} but the catalog reports a {}",
            relation,
            relation.relation_type(),
            object.relation_type()
        );
    }

    println!("{}", serde_json::to_string_pretty(&object)?);
    Ok(())
}
