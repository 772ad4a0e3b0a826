//! Shared utilities for CLI commands

use anyhow::{bail, Context, Result};
use sl_core::{Config, CoreError, Dialect, MaterializedObject, RelationFactory, RenderedModelNode};
use sl_db::{DdlExecutor, DuckDbBackend};
use sl_refresh::RefreshError;
use std::fmt;
use std::path::Path;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; the failure was already reported
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// The object was refreshed but index maintenance failed afterwards.
pub(crate) const EXIT_INDEXES_FAILED: i32 = 4;

/// Exit code for a refresh error.
///
/// 1: failed, live object intact. 2: cancelled. 3: fatal inconsistency, the
/// canonical name needs manual repair. See also [`EXIT_INDEXES_FAILED`].
pub(crate) fn exit_code_for(err: &RefreshError) -> i32 {
    match err {
        RefreshError::FatalInconsistency { .. } => 3,
        RefreshError::Cancelled { .. } => 2,
        _ => 1,
    }
}

/// Load config from `--config`, or from the current directory, falling back
/// to defaults when no config file exists.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    if let Some(path) = &global.config {
        return Config::load(Path::new(path)).context("Failed to load config");
    }
    match Config::load_from_dir(Path::new(".")) {
        Ok(config) => Ok(config),
        Err(CoreError::ConfigNotFound { .. }) => {
            log::debug!("No swapline.yml found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e).context("Failed to load config"),
    }
}

/// Open the executor for the configured dialect.
///
/// Only DuckDB ships with an executor.
pub(crate) fn open_backend(config: &Config) -> Result<Box<dyn DdlExecutor>> {
    match config.dialect {
        Dialect::DuckDb => {
            let backend = DuckDbBackend::new(&config.database.path)
                .with_context(|| format!("Failed to open database: {}", config.database.path))?;
            Ok(Box::new(backend))
        }
        other => bail!(
            "No bundled executor for dialect '{}'; only duckdb can be executed directly",
            other
        ),
    }
}

/// Read a rendered model node and build its desired object.
pub(crate) fn load_desired(path: &str, factory: &RelationFactory) -> Result<MaterializedObject> {
    let node = RenderedModelNode::load(Path::new(path))
        .with_context(|| format!("Failed to read model node: {}", path))?;
    Ok(factory.make_from_model_node(&node)?)
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
