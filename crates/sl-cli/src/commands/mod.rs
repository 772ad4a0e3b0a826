//! CLI command implementations

pub(crate) mod common;
pub(crate) mod describe;
pub(crate) mod diff;
pub(crate) mod refresh;
