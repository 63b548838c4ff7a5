//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{MemberId, OrderId, PaymentId, Version};
use serde::Serialize;

use crate::error::DomainError;

use super::{Money, OrderItem, OrderStatus, PaymentMethod};

/// Order aggregate root.
///
/// A new order can only come out of [`Order::create`], which enforces the
/// construction invariants; after that, status changes go through the four
/// transition methods. Identity and version are stamped by the repository.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    id: Option<OrderId>,
    member_id: MemberId,
    items: Vec<OrderItem>,
    total_amount: Money,
    payment_method: PaymentMethod,
    status: OrderStatus,
    payment_id: Option<PaymentId>,
    version: Version,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Stored representation of an order, used by repositories to rebuild the
/// aggregate without re-running creation rules.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub id: OrderId,
    pub member_id: MemberId,
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub payment_id: Option<PaymentId>,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new pending order with its total computed from `items`.
    pub fn create(
        member_id: MemberId,
        items: Vec<OrderItem>,
        payment_method: Option<PaymentMethod>,
    ) -> Result<Self, DomainError> {
        if !member_id.is_positive() {
            return Err(DomainError::Validation(
                "Member ID must be positive".to_string(),
            ));
        }
        if items.is_empty() {
            return Err(DomainError::Validation(
                "Order must have at least one item".to_string(),
            ));
        }
        let payment_method = payment_method.ok_or_else(|| {
            DomainError::Validation("Payment method is required".to_string())
        })?;

        let total_amount = items.iter().map(OrderItem::subtotal).sum();
        let now = Utc::now();

        Ok(Self {
            id: None,
            member_id,
            items,
            total_amount,
            payment_method,
            status: OrderStatus::Pending,
            payment_id: None,
            version: Version::initial(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds an order exactly as it was stored.
    pub fn from_record(record: OrderRecord) -> Self {
        Self {
            id: Some(record.id),
            member_id: record.member_id,
            items: record.items,
            total_amount: record.total_amount,
            payment_method: record.payment_method,
            status: record.status,
            payment_id: record.payment_id,
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    /// Returns the order with the identity and version assigned by a save.
    pub fn into_persisted(mut self, id: OrderId, version: Version) -> Self {
        self.id = Some(id);
        self.version = version;
        self
    }
}

// Query methods
impl Order {
    /// Returns the order ID, or `None` before the first save.
    pub fn id(&self) -> Option<OrderId> {
        self.id
    }

    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    /// Returns the line items in the order they were requested.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_id(&self) -> Option<PaymentId> {
        self.payment_id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if the order has been saved at least once.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

// State transitions
impl Order {
    /// Records a completed payment.
    pub fn mark_confirmed(&mut self, payment_id: PaymentId) -> Result<(), DomainError> {
        if !self.status.can_confirm() {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to: OrderStatus::Confirmed,
                reason: "Cannot confirm order",
            });
        }

        self.status = OrderStatus::Confirmed;
        self.payment_id = Some(payment_id);
        self.touch();
        Ok(())
    }

    /// Records a payment that is still being processed.
    // Unguarded: applies from any status, including CONFIRMED.
    pub fn mark_pending(&mut self, payment_id: PaymentId) {
        self.status = OrderStatus::Pending;
        self.payment_id = Some(payment_id);
        self.touch();
    }

    /// Records a failed payment.
    // Unguarded: applies from any status, including CONFIRMED.
    pub fn mark_failed(&mut self) {
        self.status = OrderStatus::Failed;
        self.touch();
    }

    /// Cancels the order.
    ///
    /// Cancelling an already cancelled order is a no-op. Confirmed orders are
    /// paid and cannot be cancelled.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if self.status == OrderStatus::Cancelled {
            return Ok(());
        }
        if !self.status.can_cancel() {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to: OrderStatus::Cancelled,
                reason: "Cannot cancel confirmed order (already paid)",
            });
        }

        self.status = OrderStatus::Cancelled;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;

    fn item(product_id: i64, cents: i64, quantity: u32) -> OrderItem {
        OrderItem::new(
            ProductId::new(product_id),
            format!("Product {product_id}"),
            Money::from_cents(cents),
            quantity,
        )
        .unwrap()
    }

    fn pending_order() -> Order {
        Order::create(
            MemberId::new(1),
            vec![item(101, 10000, 2)],
            Some(PaymentMethod::CreditCard),
        )
        .unwrap()
    }

    #[test]
    fn test_create_order() {
        let order = pending_order();

        assert_eq!(order.id(), None);
        assert!(!order.is_persisted());
        assert_eq!(order.member_id(), MemberId::new(1));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_id(), None);
        assert_eq!(order.version(), Version::initial());
        assert_eq!(order.total_amount(), Money::from_cents(20000));
        assert_eq!(order.created_at(), order.updated_at());
    }

    #[test]
    fn test_total_is_sum_of_subtotals() {
        let order = Order::create(
            MemberId::new(7),
            vec![item(1, 1999, 3), item(2, 50, 1), item(3, 0, 4)],
            Some(PaymentMethod::BankTransfer),
        )
        .unwrap();

        let expected: Money = order.items().iter().map(OrderItem::subtotal).sum();
        assert_eq!(order.total_amount(), expected);
        assert_eq!(order.total_amount(), Money::from_cents(6047));
    }

    #[test]
    fn test_items_keep_request_order() {
        let order = Order::create(
            MemberId::new(1),
            vec![item(3, 100, 1), item(1, 100, 1), item(2, 100, 1)],
            Some(PaymentMethod::DebitCard),
        )
        .unwrap();

        let ids: Vec<i64> = order.items().iter().map(|i| i.product_id().as_i64()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_create_rejects_non_positive_member() {
        for member_id in [0, -1] {
            let result = Order::create(
                MemberId::new(member_id),
                vec![item(101, 100, 1)],
                Some(PaymentMethod::CreditCard),
            );
            assert!(matches!(result, Err(DomainError::Validation(_))));
        }
    }

    #[test]
    fn test_create_rejects_empty_items() {
        let result = Order::create(MemberId::new(1), vec![], Some(PaymentMethod::CreditCard));
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_create_rejects_missing_payment_method() {
        let result = Order::create(MemberId::new(1), vec![item(101, 100, 1)], None);
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_mark_confirmed_from_pending() {
        let mut order = pending_order();
        order.mark_confirmed(PaymentId::new(55)).unwrap();

        assert_eq!(order.status(), OrderStatus::Confirmed);
        assert_eq!(order.payment_id(), Some(PaymentId::new(55)));
        assert!(order.updated_at() >= order.created_at());
    }

    #[test]
    fn test_mark_confirmed_requires_pending() {
        let mut order = pending_order();
        order.mark_failed();

        let result = order.mark_confirmed(PaymentId::new(1));
        assert!(matches!(
            result,
            Err(DomainError::InvalidStateTransition {
                from: OrderStatus::Failed,
                to: OrderStatus::Confirmed,
                ..
            })
        ));
        assert_eq!(order.status(), OrderStatus::Failed);
        assert_eq!(order.payment_id(), None);
    }

    #[test]
    fn test_mark_pending_sets_payment_id() {
        let mut order = pending_order();
        order.mark_pending(PaymentId::new(9));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_id(), Some(PaymentId::new(9)));
    }

    #[test]
    fn test_cancel_pending_and_failed() {
        let mut order = pending_order();
        order.cancel().unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);

        let mut order = pending_order();
        order.mark_failed();
        order.cancel().unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut order = pending_order();
        order.cancel().unwrap();
        let snapshot = order.clone();

        order.cancel().unwrap();
        assert_eq!(order, snapshot);
    }

    #[test]
    fn test_cancel_confirmed_fails_and_leaves_order_untouched() {
        let mut order = pending_order();
        order.mark_confirmed(PaymentId::new(1)).unwrap();
        let snapshot = order.clone();

        let err = order.cancel().unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidStateTransition {
                from: OrderStatus::Confirmed,
                to: OrderStatus::Cancelled,
                ..
            }
        ));
        assert!(err.to_string().contains("already paid"));
        assert_eq!(order, snapshot);
    }

    // Known gap: failure and pending marks are not guarded, so a confirmed
    // order can be moved out of CONFIRMED.
    #[test]
    fn test_unguarded_transitions_override_confirmed() {
        let mut order = pending_order();
        order.mark_confirmed(PaymentId::new(1)).unwrap();
        order.mark_failed();
        assert_eq!(order.status(), OrderStatus::Failed);

        let mut order = pending_order();
        order.mark_confirmed(PaymentId::new(1)).unwrap();
        order.mark_pending(PaymentId::new(2));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_id(), Some(PaymentId::new(2)));
    }

    #[test]
    fn test_into_persisted_and_from_record() {
        let order = pending_order().into_persisted(OrderId::new(10), Version::first());
        assert_eq!(order.id(), Some(OrderId::new(10)));
        assert_eq!(order.version(), Version::first());

        let record = OrderRecord {
            id: OrderId::new(10),
            member_id: order.member_id(),
            items: order.items().to_vec(),
            total_amount: order.total_amount(),
            payment_method: order.payment_method(),
            status: order.status(),
            payment_id: order.payment_id(),
            version: order.version(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        };
        assert_eq!(Order::from_record(record), order);
    }
}
