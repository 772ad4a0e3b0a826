//! Serde default helpers shared by config types.

/// Serde default for switches that are on unless disabled.
pub fn default_true() -> bool {
    true
}
