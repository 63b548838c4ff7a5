//! Order state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The lifecycle status of an order.
///
/// State transitions:
/// ```text
///            ┌──────────► Confirmed
///            │
/// Pending ───┼──────────► Failed ──┐
///            │                     ▼
///            └──────────────────► Cancelled ◄─┐ (idempotent)
///                                     └───────┘
/// ```
///
/// `mark_pending` and `mark_failed` on the aggregate are unguarded and may be
/// applied from any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created, or payment still being processed.
    #[default]
    Pending,

    /// Payment completed.
    Confirmed,

    /// Payment failed or was rejected.
    Failed,

    /// Cancelled by the buyer.
    Cancelled,
}

impl OrderStatus {
    /// Returns true if payment confirmation is allowed from this status.
    pub fn can_confirm(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if a cancel request changes this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Failed)
    }

    /// Returns the status name as stored and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "FAILED" => Ok(OrderStatus::Failed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err(DomainError::Validation(format!("Unknown order status: {s}"))),
        }
    }
}
