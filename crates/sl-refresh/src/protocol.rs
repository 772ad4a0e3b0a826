//! Refresh protocol driver
//!
//! Runs a [`RefreshPlan`] against a [`DdlExecutor`], one awaited intent at a
//! time, and turns the terminal state into a report or an error.

use crate::cancel::CancellationFlag;
use crate::error::{CleanupWarning, Recovery, RefreshError, RefreshResult, RefreshStep};
use crate::indexes::apply_index_changes;
use crate::state::{FailureCause, Progress, RefreshOutcome, RefreshPlan, Terminal};
use serde::Serialize;
use sl_core::{
    DdlIntent, IndexChangeSet, MaterializedObject, RelationFactory, RelationRef, RelationType,
};
use sl_db::{DbError, DdlExecutor};

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub relation: String,
    pub outcome: RefreshOutcome,
    /// Every intent issued, in order
    pub intents: Vec<DdlIntent>,
    pub warnings: Vec<CleanupWarning>,
}

/// Drives refresh runs for one executor.
pub struct RefreshProtocol<'a> {
    executor: &'a dyn DdlExecutor,
    factory: &'a RelationFactory,
    cancel: Option<CancellationFlag>,
}

impl<'a> RefreshProtocol<'a> {
    pub fn new(executor: &'a dyn DdlExecutor, factory: &'a RelationFactory) -> Self {
        Self {
            executor,
            factory,
            cancel: None,
        }
    }

    /// Poll `flag` between intents.
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn cancel_requested(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationFlag::is_cancelled)
    }

    /// Introspect whatever lives at `relation`'s location, typed as the
    /// catalog reports it.
    ///
    /// Returns `None` when nothing is there. A catalog type token this build
    /// does not recognize is reported as a mismatch against `relation`'s type.
    pub async fn describe_actual(
        &self,
        relation: &RelationRef,
    ) -> RefreshResult<Option<MaterializedObject>> {
        let Some(result) = self.executor.describe_relation(relation).await? else {
            return Ok(None);
        };
        let reported = RelationType::from_catalog_token(&result.relation.relation_type)
            .unwrap_or(relation.relation_type());
        let object = self.factory.make_from_describe_result(&result, reported)?;
        if object.relation_type() != relation.relation_type() {
            log::info!(
                "{} is currently a {}; refreshing it as a {}",
                relation,
                object.relation_type(),
                relation.relation_type()
            );
        }
        Ok(Some(object))
    }

    /// Leftover backup and intermediate objects from an earlier run, typed as
    /// the catalog reports them so the drop statement matches.
    async fn find_stale(&self, plan: &RefreshPlan) -> Result<Vec<RelationRef>, DbError> {
        let mut stale = Vec::new();
        for derived in [plan.backup(), plan.intermediate()] {
            if !self.executor.relation_exists(derived).await? {
                continue;
            }
            let typed = match self.executor.describe_relation(derived).await? {
                Some(result) => RelationType::from_catalog_token(&result.relation.relation_type)
                    .map(|ty| self.factory.retype(derived, ty))
                    .unwrap_or_else(|| derived.clone()),
                None => derived.clone(),
            };
            log::info!("Found leftover {} from an earlier run", typed);
            stale.push(typed);
        }
        Ok(stale)
    }

    /// Replace `actual` (if any) with `desired` under the canonical name.
    pub async fn run(
        &self,
        desired: &MaterializedObject,
        actual: Option<&MaterializedObject>,
    ) -> RefreshResult<RefreshReport> {
        let plan = RefreshPlan::new(self.factory, desired, actual)?;
        let relation = plan.canonical().render();

        // A first create has nothing to protect, so it skips the leftover scan
        let stale = if plan.exists() {
            self.find_stale(&plan)
                .await
                .map_err(|source| RefreshError::DdlExecution {
                    relation: relation.clone(),
                    step: RefreshStep::PreflightCleanup,
                    recovery: Recovery::Untouched,
                    source,
                })?
        } else {
            Vec::new()
        };

        let mut state = plan.begin(stale);
        let mut intents = Vec::new();
        let mut warnings = Vec::new();

        let terminal = loop {
            if self.cancel_requested() && plan.is_cancellable(&state) {
                log::warn!("Cancelling refresh of {} before {}", relation, plan.step(&state));
                state = match plan.cancel(state) {
                    Progress::Continue(next) => next,
                    Progress::Finished(terminal) => break terminal,
                };
            }

            let step = plan.step(&state);
            let intent = plan.pending_intent(&state);
            log::debug!("{} [{}] {}", self.executor.db_type(), step, intent);
            let result = self.executor.execute(&intent).await;
            if let Err(e) = &result {
                log::warn!("{} failed for {}: {}", step, relation, e);
            }
            intents.push(intent);

            let transition = plan.advance(state, result);
            if let Some(warning) = transition.warning {
                log::warn!("{}", warning);
                warnings.push(warning);
            }
            match transition.next {
                Progress::Continue(next) => state = next,
                Progress::Finished(terminal) => break terminal,
            }
        };

        match terminal {
            Terminal::Done(outcome) => {
                log::info!("{} {} ({} intents)", relation, outcome, intents.len());
                Ok(RefreshReport {
                    relation,
                    outcome,
                    intents,
                    warnings,
                })
            }
            Terminal::Failed(failure) => {
                log::warn!(
                    "Refresh of {} stopped at {}: {}",
                    relation,
                    failure.step,
                    failure.recovery
                );
                match failure.cause {
                    FailureCause::Ddl(source) => Err(RefreshError::DdlExecution {
                        relation,
                        step: failure.step,
                        recovery: failure.recovery,
                        source,
                    }),
                    FailureCause::Cancelled => Err(RefreshError::Cancelled {
                        relation,
                        recovery: failure.recovery,
                    }),
                }
            }
            Terminal::Fatal {
                swap_error,
                restore_error,
            } => {
                let err = RefreshError::FatalInconsistency {
                    relation,
                    backup: plan.backup().render(),
                    intermediate: plan.intermediate().render(),
                    swap_error,
                    restore_error,
                };
                log::error!("{}", err);
                Err(err)
            }
        }
    }

    /// Bring the live object's indexes in line with `desired`.
    ///
    /// Returns the changes that were applied.
    pub async fn sync_indexes(
        &self,
        desired: &MaterializedObject,
    ) -> RefreshResult<IndexChangeSet> {
        let Some(actual) = self.describe_actual(desired.relation()).await? else {
            return Err(DbError::RelationNotFound(desired.render()).into());
        };
        let changes = desired.index_changes(&actual);
        if changes.is_empty() {
            log::debug!("Indexes on {} already match", desired.relation());
            return Ok(changes);
        }
        apply_index_changes(self.executor, desired.relation(), &changes).await?;
        Ok(changes)
    }
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
