//! Orchestration error types.

use common::{MemberId, OrderId, ProductId};
use domain::DomainError;
use order_store::StoreError;
use thiserror::Error;

use crate::services::{MemberStatus, ProductStatus};

/// Why a member was refused as a buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRejection {
    NotFound,
    NotActive { status: MemberStatus },
}

impl std::fmt::Display for MemberRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberRejection::NotFound => f.write_str("Member does not exist"),
            MemberRejection::NotActive { status } => {
                write!(f, "Member is not active (status: {status})")
            }
        }
    }
}

/// Why a requested product could not be ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductRejection {
    NotFound,
    Discontinued,
    Unavailable { status: ProductStatus },
    StockUnavailable,
    InsufficientStock { available: u32, requested: u32 },
}

impl std::fmt::Display for ProductRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductRejection::NotFound => f.write_str("Product does not exist"),
            ProductRejection::Discontinued => f.write_str("Product is discontinued"),
            ProductRejection::Unavailable { .. } => f.write_str("Product is not available"),
            ProductRejection::StockUnavailable => {
                f.write_str("Cannot retrieve stock information")
            }
            ProductRejection::InsufficientStock {
                available,
                requested,
            } => write!(
                f,
                "Insufficient stock. Available: {available}, Requested: {requested}"
            ),
        }
    }
}

/// Errors that can occur while orchestrating order use cases.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// The order aggregate refused the operation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The order store failed.
    #[error("Order store error: {0}")]
    Store(#[from] StoreError),

    /// No order exists with the given ID.
    #[error("Order not found with id: {0}")]
    OrderNotFound(OrderId),

    /// The buyer failed validation.
    #[error("{reason}")]
    MemberValidation {
        member_id: MemberId,
        reason: MemberRejection,
    },

    /// A requested product failed validation.
    #[error("{reason}")]
    ProductValidation {
        product_id: ProductId,
        reason: ProductRejection,
    },

    /// The payment service declined the charge.
    #[error("Payment failed for order {order_id}: {reason}")]
    PaymentRejected { order_id: OrderId, reason: String },

    /// A downstream service was unreachable, timed out or answered with an
    /// unexpected error.
    #[error("{service} error: {message}")]
    ExternalService {
        service: &'static str,
        message: String,
    },
}

impl OrchestrationError {
    /// Builds an `ExternalService` error.
    pub fn external(service: &'static str, message: impl Into<String>) -> Self {
        OrchestrationError::ExternalService {
            service,
            message: message.into(),
        }
    }
}

/// Convenience type alias for orchestration results.
pub type Result<T> = std::result::Result<T, OrchestrationError>;
