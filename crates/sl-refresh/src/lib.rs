//! sl-refresh - Safe refresh protocol for Swapline
//!
//! Replaces a live warehouse object with a new definition through a
//! create / rename / rename / drop sequence (or create-or-replace where the
//! object type cannot be renamed), recovering from a failure at any step.
//!
//! The sequencing lives in [`RefreshPlan`], a pure transition function over
//! [`RefreshState`]. [`RefreshProtocol`] is the async driver that feeds each
//! pending intent to a [`DdlExecutor`](sl_db::DdlExecutor) and the result back
//! into the plan.

pub mod cancel;
pub mod error;
pub mod indexes;
pub mod protocol;
pub mod state;

pub use cancel::CancellationFlag;
pub use error::{CleanupWarning, Recovery, RefreshError, RefreshResult, RefreshStep};
pub use indexes::{apply_index_changes, index_intents};
pub use protocol::{RefreshProtocol, RefreshReport};
pub use state::{
    Failure, FailureCause, Progress, RefreshOutcome, RefreshPlan, RefreshState, Terminal,
    Transition,
};
