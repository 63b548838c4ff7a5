//! Domain error types.

use thiserror::Error;

use crate::order::OrderStatus;

/// Errors raised by the order aggregate and its value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A value or aggregate invariant was violated at construction.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The requested transition is not allowed from the current status.
    #[error("{reason} (from {from} to {to})")]
    InvalidStateTransition {
        from: OrderStatus,
        to: OrderStatus,
        reason: &'static str,
    },
}

impl DomainError {
    /// Returns true for construction-time invariant violations.
    pub fn is_validation(&self) -> bool {
        matches!(self, DomainError::Validation(_))
    }
}
