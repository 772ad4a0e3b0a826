//! Refresh command implementation
//!
//! Builds the desired object from a rendered model node, introspects the live
//! object, runs the backup/swap protocol and then brings indexes in line.

use anyhow::Result;
use serde::Serialize;
use sl_core::{IndexChangeSet, MaterializedObject, RelationFactory};
use sl_refresh::{CancellationFlag, RefreshError, RefreshProtocol, RefreshReport};

use crate::cli::{GlobalArgs, OutputFormat, RefreshArgs};
use crate::commands::common::{
    exit_code_for, load_config, load_desired, open_backend, ExitCode, EXIT_INDEXES_FAILED,
};

/// Refresh result for JSON output
#[derive(Debug, Serialize)]
struct RefreshSummary {
    #[serde(flatten)]
    report: RefreshReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    indexes: Option<IndexChangeSet>,
}

/// A refresh that got as far as swapping the object in.
#[derive(Debug)]
enum RefreshRun {
    Complete(RefreshSummary),
    /// The new object is live; bringing its indexes in line failed
    IndexesFailed(RefreshSummary, RefreshError),
}

/// Execute the refresh command
pub async fn execute(args: &RefreshArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let factory = RelationFactory::from_config(&config);
    let desired = load_desired(&args.node, &factory)?;
    let backend = open_backend(&config)?;

    let flag = CancellationFlag::new();
    let watcher = {
        let flag = flag.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupt received, stopping at the next safe point");
                flag.cancel();
            }
        })
    };

    let protocol = RefreshProtocol::new(backend.as_ref(), &factory).with_cancellation(flag);
    let maintain = config.indexes.maintain
        && !args.skip_indexes
        && factory.dialect().supports_indexes(desired.relation_type());
    let outcome = run_refresh(&protocol, &desired, maintain).await;
    watcher.abort();

    let (summary, index_error) = match outcome {
        Ok(RefreshRun::Complete(summary)) => (summary, None),
        Ok(RefreshRun::IndexesFailed(summary, err)) => (summary, Some(err)),
        Err(err) => {
            eprintln!("Error: {}", err);
            return Err(ExitCode(exit_code_for(&err)).into());
        }
    };

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_summary(&summary),
    }

    if let Some(err) = index_error {
        eprintln!(
            "Error: {} was refreshed but its indexes were not updated: {}",
            summary.report.relation, err
        );
        return Err(ExitCode(EXIT_INDEXES_FAILED).into());
    }
    Ok(())
}

/// Describe, swap, then sync indexes when `maintain` is set.
///
/// An index failure after a successful swap keeps the report.
async fn run_refresh(
    protocol: &RefreshProtocol<'_>,
    desired: &MaterializedObject,
    maintain: bool,
) -> Result<RefreshRun, RefreshError> {
    let actual = protocol.describe_actual(desired.relation()).await?;
    let report = protocol.run(desired, actual.as_ref()).await?;
    if !maintain {
        return Ok(RefreshRun::Complete(RefreshSummary {
            report,
            indexes: None,
        }));
    }

    match protocol.sync_indexes(desired).await {
        Ok(changes) => Ok(RefreshRun::Complete(RefreshSummary {
            report,
            indexes: Some(changes),
        })),
        Err(err) => {
            log::error!("Index maintenance failed on {}: {}", report.relation, err);
            Ok(RefreshRun::IndexesFailed(
                RefreshSummary {
                    report,
                    indexes: None,
                },
                err,
            ))
        }
    }
}

fn print_summary(summary: &RefreshSummary) {
    let report = &summary.report;
    println!(
        "{}: {} ({} statements)",
        report.relation,
        report.outcome,
        report.intents.len()
    );
    for intent in &report.intents {
        println!("  {}", intent);
    }
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }
    if let Some(changes) = &summary.indexes {
        for index in &changes.drop {
            println!("  dropped index {}", index);
        }
        for index in &changes.create {
            println!("  created index {}", index);
        }
    }
}

#[cfg(test)]
#[path = "refresh_test.rs"]
mod tests;
