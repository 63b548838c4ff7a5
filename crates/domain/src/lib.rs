//! Domain layer for the order service.
//!
//! This crate provides the order aggregate and its value objects:
//! - `OrderItem` line-item snapshots and `Money` amounts
//! - `Order` aggregate root with its lifecycle state machine
//! - `DomainError` for invariant and transition violations

pub mod error;
pub mod order;

pub use error::DomainError;
pub use order::{Money, Order, OrderItem, OrderRecord, OrderStatus, PaymentMethod};
