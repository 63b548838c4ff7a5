//! Payment service port and in-memory implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{OrderId, PaymentId};
use domain::{Money, PaymentMethod};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{OrchestrationError, Result};
use crate::services::PAYMENT_SERVICE;

/// Settlement status of a charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Result of a charge that the payment service accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentResult {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub transaction_id: String,
}

/// Charges buyers for orders.
///
/// A declined charge is reported as `OrchestrationError::PaymentRejected`;
/// transport or server failures as `OrchestrationError::ExternalService`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(
        &self,
        order_id: OrderId,
        amount: Money,
        payment_method: PaymentMethod,
    ) -> Result<PaymentResult>;
}

/// What the in-memory gateway does with the next charges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    /// Accept the charge with the given status.
    Accept(PaymentStatus),
    /// Decline the charge with the given reason.
    Reject(String),
    /// Fail as if the service were unreachable.
    Outage,
}

impl Default for ChargeOutcome {
    fn default() -> Self {
        ChargeOutcome::Accept(PaymentStatus::Completed)
    }
}

/// A charge attempt seen by the in-memory gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRecord {
    pub order_id: OrderId,
    pub amount: Money,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    charges: Vec<ChargeRecord>,
    next_id: i64,
    outcome: ChargeOutcome,
    latency: Option<Duration>,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a gateway that completes every charge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the outcome of subsequent charges.
    pub fn set_outcome(&self, outcome: ChargeOutcome) {
        self.state.write().outcome = outcome;
    }

    /// Delays every charge by the given duration.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state.write().latency = latency;
    }

    /// Returns every charge attempt in call order.
    pub fn charges(&self) -> Vec<ChargeRecord> {
        self.state.read().charges.clone()
    }

    /// Returns the number of charge attempts.
    pub fn charge_count(&self) -> usize {
        self.state.read().charges.len()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn charge(
        &self,
        order_id: OrderId,
        amount: Money,
        payment_method: PaymentMethod,
    ) -> Result<PaymentResult> {
        let latency = self.state.read().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.write();
        state.charges.push(ChargeRecord {
            order_id,
            amount,
            payment_method,
        });

        match state.outcome.clone() {
            ChargeOutcome::Accept(status) => {
                state.next_id += 1;
                Ok(PaymentResult {
                    payment_id: PaymentId::new(state.next_id),
                    status,
                    transaction_id: format!("TXN-{:04}", state.next_id),
                })
            }
            ChargeOutcome::Reject(reason) => {
                Err(OrchestrationError::PaymentRejected { order_id, reason })
            }
            ChargeOutcome::Outage => Err(OrchestrationError::external(
                PAYMENT_SERVICE,
                "Failed to process payment: connection refused",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_charge_records_attempt() {
        let gateway = InMemoryPaymentGateway::new();

        let result = gateway
            .charge(OrderId::new(1), Money::from_cents(5000), PaymentMethod::CreditCard)
            .await
            .unwrap();

        assert_eq!(result.status, PaymentStatus::Completed);
        assert_eq!(result.payment_id, PaymentId::new(1));
        assert_eq!(gateway.charge_count(), 1);
        assert_eq!(gateway.charges()[0].amount, Money::from_cents(5000));
    }

    #[tokio::test]
    async fn test_reject_outcome() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_outcome(ChargeOutcome::Reject("Card declined".to_string()));

        let result = gateway
            .charge(OrderId::new(1), Money::from_cents(5000), PaymentMethod::DebitCard)
            .await;

        assert!(matches!(
            result,
            Err(OrchestrationError::PaymentRejected { reason, .. }) if reason == "Card declined"
        ));
        assert_eq!(gateway.charge_count(), 1);
    }

    #[tokio::test]
    async fn test_outage_outcome() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_outcome(ChargeOutcome::Outage);

        let result = gateway
            .charge(OrderId::new(1), Money::from_cents(5000), PaymentMethod::BankTransfer)
            .await;
        assert!(matches!(result, Err(OrchestrationError::ExternalService { .. })));
    }
}
