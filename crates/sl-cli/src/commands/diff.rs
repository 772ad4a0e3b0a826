//! Diff command implementation
//!
//! Compare a rendered model node with the live relation without changing
//! anything.

use anyhow::Result;
use serde::Serialize;
use sl_core::{IndexChangeSet, RelationFactory, RelationType};
use sl_refresh::RefreshProtocol;
use std::collections::BTreeSet;

use crate::cli::{DiffArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{load_config, load_desired, open_backend};

/// Difference summary for JSON output
#[derive(Debug, Serialize)]
struct DiffSummary {
    relation: String,
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_type: Option<RelationType>,
    desired_type: RelationType,
    indexes: IndexChangeSet,
}

/// Execute the diff command
pub async fn execute(args: &DiffArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let factory = RelationFactory::from_config(&config);
    let desired = load_desired(&args.node, &factory)?;
    let backend = open_backend(&config)?;

    let protocol = RefreshProtocol::new(backend.as_ref(), &factory);
    let actual = protocol.describe_actual(desired.relation()).await?;

    let summary = match &actual {
        Some(actual) => DiffSummary {
            relation: desired.render(),
            exists: true,
            current_type: Some(actual.relation_type()),
            desired_type: desired.relation_type(),
            indexes: desired.index_changes(actual),
        },
        None => DiffSummary {
            relation: desired.render(),
            exists: false,
            current_type: None,
            desired_type: desired.relation_type(),
            indexes: IndexChangeSet::between(desired.indexes(), &BTreeSet::new()),
        },
    };

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_summary(&summary),
    }
    Ok(())
}

fn print_summary(summary: &DiffSummary) {
    match summary.current_type {
        None => println!(
            "{}: does not exist, would create {}",
            summary.relation, summary.desired_type
        ),
        Some(current) if current != summary.desired_type => println!(
            "{}: {} would become a {}",
            summary.relation, current, summary.desired_type
        ),
        Some(current) => println!("{}: {}", summary.relation, current),
    }

    if summary.indexes.is_empty() {
        println!("  indexes up to date");
        return;
    }
    for index in &summary.indexes.drop {
        println!("  - {}", index);
    }
    for index in &summary.indexes.create {
        println!("  + {}", index);
    }
}
