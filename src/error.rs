use thiserror::Error;
use uuid::Uuid;

/// Failures the repository and rule construction can surface to a caller.
///
/// Evaluation never appears here: a bad evaluation degrades to the flag's
/// global default instead of failing (see `evaluation`).
#[derive(Debug, Error)]
pub enum FlagError {
    #[error("flag not found: {0}")]
    NotFound(Uuid),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid rule type '{0}'. Must be one of: tenant, user, percentage")]
    InvalidRuleType(String),
}
