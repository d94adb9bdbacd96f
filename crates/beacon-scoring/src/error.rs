//! Scoring error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    /// Scoring was requested but the company has no active strategy.
    #[error("no strategy configured")]
    NoActiveStrategy,

    /// An input was outside its documented range.
    #[error("invalid scoring input: {0}")]
    InvalidInput(String),
}

/// Short-circuit when no strategy is active.
///
/// Alignment scoring never falls back to default or stale weights; callers
/// pass the result of their "current strategy" lookup through here first.
///
/// # Errors
///
/// Returns `ScoringError::NoActiveStrategy` when `strategy` is `None`.
pub fn require_active_strategy<T>(strategy: Option<T>) -> Result<T, ScoringError> {
    strategy.ok_or(ScoringError::NoActiveStrategy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_strategy_is_an_error() {
        let err = require_active_strategy::<u32>(None).unwrap_err();
        assert!(matches!(err, ScoringError::NoActiveStrategy));
        assert_eq!(err.to_string(), "no strategy configured");
    }

    #[test]
    fn present_strategy_passes_through() {
        assert_eq!(require_active_strategy(Some(3)).unwrap(), 3);
    }
}
