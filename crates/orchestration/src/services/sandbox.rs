//! Rule-based adapters used when the real services are not deployed.
//!
//! Well-known IDs and amounts trigger each failure path so that the whole
//! order flow can be exercised end to end:
//!
//! | Input | Behaviour |
//! |-------|-----------|
//! | member 999 | not found |
//! | member 998 / 997 | `INACTIVE` / `SUSPENDED` |
//! | product 999 | not found, no stock record |
//! | product 998 / 997 | `DISCONTINUED` / `OUT_OF_STOCK` |
//! | product 996 | only 2 units available |
//! | amount ending in `.99` | charge declined |
//! | amount ending in `.50` | charge left `PENDING` |

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::{MemberId, OrderId, PaymentId, ProductId};
use domain::{Money, PaymentMethod};
use rust_decimal::Decimal;

use crate::error::{OrchestrationError, Result};
use crate::services::{
    MemberInfo, MemberStatus, MemberValidator, PaymentGateway, PaymentResult, PaymentStatus,
    ProductInfo, ProductStatus, ProductValidator, StockInfo,
};

/// Member lookups driven by well-known IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SandboxMemberValidator;

#[async_trait]
impl MemberValidator for SandboxMemberValidator {
    async fn get_member(&self, member_id: MemberId) -> Result<Option<MemberInfo>> {
        let member = match member_id.as_i64() {
            999 => None,
            998 => Some(MemberInfo {
                id: member_id,
                name: "Inactive User".to_string(),
                email: "inactive@test.com".to_string(),
                status: MemberStatus::Inactive,
                grade: Some("BRONZE".to_string()),
            }),
            997 => Some(MemberInfo {
                id: member_id,
                name: "Suspended User".to_string(),
                email: "suspended@test.com".to_string(),
                status: MemberStatus::Suspended,
                grade: Some("BRONZE".to_string()),
            }),
            id => Some(MemberInfo {
                id: member_id,
                name: format!("Mock User {id}"),
                email: format!("user{id}@test.com"),
                status: MemberStatus::Active,
                grade: Some("GOLD".to_string()),
            }),
        };
        tracing::info!(member_id = %member_id, found = member.is_some(), "sandbox member lookup");
        Ok(member)
    }
}

/// Product and stock lookups driven by well-known IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SandboxProductValidator;

#[async_trait]
impl ProductValidator for SandboxProductValidator {
    async fn get_product(&self, product_id: ProductId) -> Result<Option<ProductInfo>> {
        let product = match product_id.as_i64() {
            999 => None,
            998 => Some(ProductInfo {
                id: product_id,
                name: "Discontinued Product".to_string(),
                price: Money::from_cents(9999),
                status: ProductStatus::Discontinued,
            }),
            997 => Some(ProductInfo {
                id: product_id,
                name: "Out of Stock Product".to_string(),
                price: Money::from_cents(4999),
                status: ProductStatus::OutOfStock,
            }),
            id => Some(ProductInfo {
                id: product_id,
                name: format!("Mock Product {id}"),
                price: Money::from_cents(2999),
                status: ProductStatus::Available,
            }),
        };
        tracing::info!(product_id = %product_id, found = product.is_some(), "sandbox product lookup");
        Ok(product)
    }

    async fn get_stock(&self, product_id: ProductId) -> Result<Option<StockInfo>> {
        let stock = match product_id.as_i64() {
            999 => None,
            996 => Some(StockInfo {
                product_id,
                quantity: 10,
                reserved_quantity: 8,
                available_quantity: 2,
            }),
            _ => Some(StockInfo {
                product_id,
                quantity: 1000,
                reserved_quantity: 50,
                available_quantity: 950,
            }),
        };
        Ok(stock)
    }
}

/// Payment gateway whose outcome depends on the cents of the amount.
#[derive(Debug)]
pub struct SandboxPaymentGateway {
    next_id: AtomicI64,
}

impl SandboxPaymentGateway {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(Utc::now().timestamp_millis()),
        }
    }
}

impl Default for SandboxPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for SandboxPaymentGateway {
    async fn charge(
        &self,
        order_id: OrderId,
        amount: Money,
        payment_method: PaymentMethod,
    ) -> Result<PaymentResult> {
        let cents = amount.fractional_part();

        if cents == Decimal::new(99, 2) {
            tracing::warn!(order_id = %order_id, amount = %amount, "sandbox payment declined");
            return Err(OrchestrationError::PaymentRejected {
                order_id,
                reason: "Insufficient funds (mock)".to_string(),
            });
        }

        let (status, prefix) = if cents == Decimal::new(50, 2) {
            (PaymentStatus::Pending, "TXN-MOCK-PENDING")
        } else {
            (PaymentStatus::Completed, "TXN-MOCK-SUCCESS")
        };

        let payment_id = PaymentId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        tracing::info!(
            order_id = %order_id,
            amount = %amount,
            payment_method = %payment_method,
            status = ?status,
            "sandbox payment processed"
        );

        Ok(PaymentResult {
            payment_id,
            status,
            transaction_id: format!("{prefix}-{}", uuid::Uuid::new_v4().simple()),
        })
    }
}
