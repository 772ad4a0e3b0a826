//! Refresh state machine
//!
//! A [`RefreshPlan`] fixes every identifier a run will touch. The plan is a
//! pure transition function: given the current [`RefreshState`] it names the
//! next intent, and given that intent's result it names the next state. No
//! I/O happens here; the driver in [`protocol`](crate::protocol) runs intents
//! and feeds results back.
//!
//! ```text
//! NoExistingObject ──ok──▶ Done(Created)
//! ExistingObject ─▶ IntermediateCreated ─▶ BackupRenamed ─▶ Swapped ─▶ Done(Refreshed)
//!                         │ (not renamable)      │                 ▲
//!                         └──── Replace ─────────┼─────────────────┘
//!                  failure edges: AbandoningIntermediate, RestoringBackup
//! ```

use crate::error::{CleanupWarning, Recovery, RefreshStep};
use serde::Serialize;
use sl_core::{CoreError, CoreResult, DdlIntent, MaterializedObject, RelationFactory, RelationRef};
use sl_db::DbError;
use std::fmt;

/// How a successful run changed the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// No object existed; the desired one was created in place
    Created,
    /// The live object was swapped out by rename
    Refreshed,
    /// The live object was replaced in one statement
    Replaced,
}

impl fmt::Display for RefreshOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RefreshOutcome::Created => "created",
            RefreshOutcome::Refreshed => "refreshed",
            RefreshOutcome::Replaced => "replaced",
        })
    }
}

/// Why a run stopped without reaching its goal.
#[derive(Debug)]
pub enum FailureCause {
    Ddl(DbError),
    Cancelled,
}

/// A recovered failure: which step failed and how the live object was left.
#[derive(Debug)]
pub struct Failure {
    pub step: RefreshStep,
    pub recovery: Recovery,
    pub cause: FailureCause,
}

impl Failure {
    fn ddl(step: RefreshStep, recovery: Recovery, err: DbError) -> Self {
        Self {
            step,
            recovery,
            cause: FailureCause::Ddl(err),
        }
    }

    fn cancelled(step: RefreshStep) -> Self {
        Self {
            step,
            recovery: Recovery::Untouched,
            cause: FailureCause::Cancelled,
        }
    }
}

/// A state with exactly one pending intent.
#[derive(Debug)]
pub enum RefreshState {
    /// Nothing lives under the canonical name
    NoExistingObject,
    /// A live object exists; `stale` lists leftovers still to be dropped
    ExistingObject { stale: Vec<RelationRef> },
    /// The replacement exists under the intermediate name
    IntermediateCreated,
    /// The live object sits under the backup name; canonical is unresolved
    BackupRenamed,
    /// The replacement is live; one leftover remains to be dropped
    Swapped,
    /// Dropping the intermediate after `failure`
    AbandoningIntermediate { failure: Failure },
    /// Renaming the backup back after the promote rename failed
    RestoringBackup { swap_error: DbError },
}

/// End of a run.
#[derive(Debug)]
pub enum Terminal {
    Done(RefreshOutcome),
    Failed(Failure),
    /// Canonical name unresolved; the original sits under the backup name
    Fatal {
        swap_error: DbError,
        restore_error: DbError,
    },
}

#[derive(Debug)]
pub enum Progress {
    Continue(RefreshState),
    Finished(Terminal),
}

/// Result of feeding one intent result back into the plan.
#[derive(Debug)]
pub struct Transition {
    pub next: Progress,
    pub warning: Option<CleanupWarning>,
}

impl Transition {
    fn to(state: RefreshState) -> Self {
        Self {
            next: Progress::Continue(state),
            warning: None,
        }
    }

    fn finish(terminal: Terminal) -> Self {
        Self {
            next: Progress::Finished(terminal),
            warning: None,
        }
    }

    fn warn(mut self, step: RefreshStep, relation: &RelationRef, err: &DbError) -> Self {
        self.warning = Some(CleanupWarning {
            step,
            relation: relation.render(),
            message: err.to_string(),
        });
        self
    }
}

/// Every identifier one refresh run touches.
#[derive(Debug, Clone)]
pub struct RefreshPlan {
    desired: MaterializedObject,
    /// Where the live object is, typed as it actually is
    canonical: RelationRef,
    backup: RelationRef,
    /// The desired object placed under the intermediate name
    intermediate: MaterializedObject,
    exists: bool,
    swap_by_rename: bool,
}

impl RefreshPlan {
    /// Plan a run replacing `actual` (if any) with `desired`.
    ///
    /// Fails when `desired` already carries a derived suffix, or when `actual`
    /// lives somewhere else.
    pub fn new(
        factory: &RelationFactory,
        desired: &MaterializedObject,
        actual: Option<&MaterializedObject>,
    ) -> CoreResult<Self> {
        if factory.is_derived_name(desired.relation()) {
            return Err(CoreError::InvalidIdentifier {
                identifier: desired.name().to_string(),
                reason: format!(
                    "already ends with the backup suffix '{}' or the intermediate suffix '{}'",
                    factory.backup_suffix(),
                    factory.intermediate_suffix()
                ),
            });
        }
        if let Some(actual) = actual {
            if !actual.same_location(desired.relation()) {
                return Err(CoreError::LocationMismatch {
                    relation: desired.render(),
                    expected: location(desired.relation()),
                    found: location(actual.relation()),
                });
            }
        }

        let canonical = actual
            .map(|a| a.relation().clone())
            .unwrap_or_else(|| desired.relation().clone());
        let backup = factory.make_backup_ref(&canonical);
        let intermediate = desired.retarget(factory.make_intermediate(desired.relation()));
        let swap_by_rename = canonical.can_be_renamed() && desired.can_be_renamed();

        Ok(Self {
            desired: desired.clone(),
            canonical,
            backup,
            intermediate,
            exists: actual.is_some(),
            swap_by_rename,
        })
    }

    pub fn desired(&self) -> &MaterializedObject {
        &self.desired
    }

    pub fn canonical(&self) -> &RelationRef {
        &self.canonical
    }

    pub fn backup(&self) -> &RelationRef {
        &self.backup
    }

    pub fn intermediate(&self) -> &RelationRef {
        self.intermediate.relation()
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn swap_by_rename(&self) -> bool {
        self.swap_by_rename
    }

    /// Initial state. `stale` is ignored when nothing exists yet, so a lone
    /// backup from an earlier fatal run is never dropped.
    pub fn begin(&self, stale: Vec<RelationRef>) -> RefreshState {
        if self.exists {
            RefreshState::ExistingObject { stale }
        } else {
            RefreshState::NoExistingObject
        }
    }

    pub fn step(&self, state: &RefreshState) -> RefreshStep {
        match state {
            RefreshState::NoExistingObject => RefreshStep::CreateCanonical,
            RefreshState::ExistingObject { stale } if !stale.is_empty() => {
                RefreshStep::PreflightCleanup
            }
            RefreshState::ExistingObject { .. } => RefreshStep::CreateIntermediate,
            RefreshState::IntermediateCreated if self.swap_by_rename => RefreshStep::RenameToBackup,
            RefreshState::IntermediateCreated => RefreshStep::Replace,
            RefreshState::BackupRenamed => RefreshStep::PromoteIntermediate,
            RefreshState::RestoringBackup { .. } => RefreshStep::RestoreBackup,
            RefreshState::Swapped if self.swap_by_rename => RefreshStep::DropBackup,
            RefreshState::Swapped | RefreshState::AbandoningIntermediate { .. } => {
                RefreshStep::DropIntermediate
            }
        }
    }

    /// The one intent to run in `state`.
    pub fn pending_intent(&self, state: &RefreshState) -> DdlIntent {
        match state {
            RefreshState::NoExistingObject => DdlIntent::Create {
                object: self.desired.clone(),
            },
            RefreshState::ExistingObject { stale } => match stale.first() {
                Some(leftover) => DdlIntent::Drop {
                    relation: leftover.clone(),
                },
                None => DdlIntent::Create {
                    object: self.intermediate.clone(),
                },
            },
            RefreshState::IntermediateCreated if self.swap_by_rename => DdlIntent::Rename {
                from: self.canonical.clone(),
                to: self.backup.clone(),
            },
            RefreshState::IntermediateCreated => DdlIntent::Replace {
                object: self.desired.clone(),
            },
            RefreshState::BackupRenamed => DdlIntent::Rename {
                from: self.intermediate.relation().clone(),
                to: self.desired.relation().clone(),
            },
            RefreshState::RestoringBackup { .. } => DdlIntent::Rename {
                from: self.backup.clone(),
                to: self.canonical.clone(),
            },
            RefreshState::Swapped if self.swap_by_rename => DdlIntent::Drop {
                relation: self.backup.clone(),
            },
            RefreshState::Swapped | RefreshState::AbandoningIntermediate { .. } => DdlIntent::Drop {
                relation: self.intermediate.relation().clone(),
            },
        }
    }

    /// Move past `state` given the result of its pending intent.
    pub fn advance(&self, state: RefreshState, result: Result<(), DbError>) -> Transition {
        let step = self.step(&state);
        match (state, result) {
            (RefreshState::NoExistingObject, Ok(())) => {
                Transition::finish(Terminal::Done(RefreshOutcome::Created))
            }
            (RefreshState::NoExistingObject, Err(e)) => Transition::finish(Terminal::Failed(
                Failure::ddl(step, Recovery::Untouched, e),
            )),

            (RefreshState::ExistingObject { mut stale }, Ok(())) if !stale.is_empty() => {
                stale.remove(0);
                Transition::to(RefreshState::ExistingObject { stale })
            }
            (RefreshState::ExistingObject { stale }, Err(e)) if !stale.is_empty() => {
                Transition::finish(Terminal::Failed(Failure::ddl(step, Recovery::Untouched, e)))
            }
            (RefreshState::ExistingObject { .. }, Ok(())) => {
                Transition::to(RefreshState::IntermediateCreated)
            }
            (RefreshState::ExistingObject { .. }, Err(e)) => {
                // A failed create may still have left something behind
                Transition::to(RefreshState::AbandoningIntermediate {
                    failure: Failure::ddl(step, Recovery::Untouched, e),
                })
            }

            (RefreshState::IntermediateCreated, Ok(())) if self.swap_by_rename => {
                Transition::to(RefreshState::BackupRenamed)
            }
            (RefreshState::IntermediateCreated, Ok(())) => Transition::to(RefreshState::Swapped),
            (RefreshState::IntermediateCreated, Err(e)) => {
                Transition::to(RefreshState::AbandoningIntermediate {
                    failure: Failure::ddl(step, Recovery::RolledBackToOriginal, e),
                })
            }

            (RefreshState::BackupRenamed, Ok(())) => Transition::to(RefreshState::Swapped),
            (RefreshState::BackupRenamed, Err(e)) => {
                Transition::to(RefreshState::RestoringBackup { swap_error: e })
            }

            // The intermediate stays for the next run's pre-flight
            (RefreshState::RestoringBackup { swap_error }, Ok(())) => {
                Transition::finish(Terminal::Failed(Failure::ddl(
                    RefreshStep::PromoteIntermediate,
                    Recovery::RolledBackViaBackupRestore,
                    swap_error,
                )))
            }
            (RefreshState::RestoringBackup { swap_error }, Err(restore_error)) => {
                Transition::finish(Terminal::Fatal {
                    swap_error,
                    restore_error,
                })
            }

            (RefreshState::Swapped, result) => {
                let outcome = if self.swap_by_rename {
                    RefreshOutcome::Refreshed
                } else {
                    RefreshOutcome::Replaced
                };
                let transition = Transition::finish(Terminal::Done(outcome));
                match result {
                    Ok(()) => transition,
                    Err(e) => {
                        let leftover = if self.swap_by_rename {
                            &self.backup
                        } else {
                            self.intermediate.relation()
                        };
                        transition.warn(step, leftover, &e)
                    }
                }
            }

            (RefreshState::AbandoningIntermediate { failure }, result) => {
                let transition = Transition::finish(Terminal::Failed(failure));
                match result {
                    Ok(()) => transition,
                    Err(e) => transition.warn(step, self.intermediate.relation(), &e),
                }
            }
        }
    }

    /// Whether a cancel request is honoured in `state`.
    ///
    /// Only before the live object is first renamed or replaced.
    pub fn is_cancellable(&self, state: &RefreshState) -> bool {
        matches!(
            state,
            RefreshState::NoExistingObject
                | RefreshState::ExistingObject { .. }
                | RefreshState::IntermediateCreated
        )
    }

    /// Apply a cancel request to `state`.
    ///
    /// Before the intermediate exists the run just stops. Once it exists it is
    /// dropped first. Later states are returned unchanged.
    pub fn cancel(&self, state: RefreshState) -> Progress {
        let step = self.step(&state);
        match state {
            RefreshState::NoExistingObject | RefreshState::ExistingObject { .. } => {
                Progress::Finished(Terminal::Failed(Failure::cancelled(step)))
            }
            RefreshState::IntermediateCreated => {
                Progress::Continue(RefreshState::AbandoningIntermediate {
                    failure: Failure::cancelled(step),
                })
            }
            other => Progress::Continue(other),
        }
    }
}

/// Raw `(database, schema, name)`, unaffected by what the render policy drops.
fn location(relation: &RelationRef) -> String {
    format!(
        "{:?}",
        (relation.database(), relation.schema(), relation.name())
    )
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
