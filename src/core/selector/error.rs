//! Selection error types

/// Selection errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// Every candidate is disabled, unhealthy, over its cost limit or excluded
    #[error("no viable provider (excluded: [{}])", .excluded.join(", "))]
    NoViableProvider { excluded: Vec<String> },
}
