//! Error types for sl-refresh

use serde::Serialize;
use sl_core::CoreError;
use sl_db::DbError;
use std::fmt;
use thiserror::Error;

/// The protocol step an intent belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStep {
    PreflightCleanup,
    CreateCanonical,
    CreateIntermediate,
    RenameToBackup,
    Replace,
    PromoteIntermediate,
    RestoreBackup,
    DropBackup,
    DropIntermediate,
    CreateIndex,
    DropIndex,
}

impl RefreshStep {
    pub fn as_str(self) -> &'static str {
        match self {
            RefreshStep::PreflightCleanup => "pre-flight cleanup",
            RefreshStep::CreateCanonical => "create",
            RefreshStep::CreateIntermediate => "create intermediate",
            RefreshStep::RenameToBackup => "rename to backup",
            RefreshStep::Replace => "replace",
            RefreshStep::PromoteIntermediate => "promote intermediate",
            RefreshStep::RestoreBackup => "restore backup",
            RefreshStep::DropBackup => "drop backup",
            RefreshStep::DropIntermediate => "drop intermediate",
            RefreshStep::CreateIndex => "create index",
            RefreshStep::DropIndex => "drop index",
        }
    }
}

impl fmt::Display for RefreshStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What state the live object was left in after a failed refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recovery {
    /// The live object was never touched
    Untouched,
    /// The live object was never moved; the orphaned intermediate was dropped
    RolledBackToOriginal,
    /// The live object was moved aside and renamed back
    RolledBackViaBackupRestore,
}

impl fmt::Display for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recovery::Untouched => "live object untouched",
            Recovery::RolledBackToOriginal => "rolled back to original",
            Recovery::RolledBackViaBackupRestore => "rolled back via backup restore",
        })
    }
}

/// Non-fatal problem on an otherwise finished run (W001).
///
/// Leftovers named here are removed by the next run's pre-flight cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupWarning {
    pub step: RefreshStep,
    pub relation: String,
    pub message: String,
}

impl fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[W001] {} of {} failed: {}",
            self.step, self.relation, self.message
        )
    }
}

/// Refresh errors
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    /// An intent failed and the protocol recovered (F001)
    #[error("[F001] Refresh of {relation} failed at {step} ({recovery}): {source}")]
    DdlExecution {
        relation: String,
        step: RefreshStep,
        recovery: Recovery,
        source: DbError,
    },

    /// The swap failed and the backup could not be renamed back (F002)
    #[error(
        "[F002] Fatal inconsistency: {relation} is missing. Promoting {intermediate} failed \
         ({swap_error}) and restoring {backup} failed ({restore_error}). Rename {backup} back \
         to {relation} manually"
    )]
    FatalInconsistency {
        relation: String,
        backup: String,
        intermediate: String,
        swap_error: DbError,
        restore_error: DbError,
    },

    /// Cancelled before the live object was touched (F003)
    #[error("[F003] Refresh of {relation} cancelled ({recovery})")]
    Cancelled { relation: String, recovery: Recovery },
}

impl RefreshError {
    /// Recovery performed, for errors raised after planning
    pub fn recovery(&self) -> Option<Recovery> {
        match self {
            RefreshError::DdlExecution { recovery, .. } | RefreshError::Cancelled { recovery, .. } => {
                Some(*recovery)
            }
            _ => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, RefreshError::FatalInconsistency { .. })
    }
}

/// Result type alias for RefreshError
pub type RefreshResult<T> = Result<T, RefreshError>;
