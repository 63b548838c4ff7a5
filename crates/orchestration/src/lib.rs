//! Order use cases.
//!
//! Creating an order validates the buyer with the member service and each
//! line with the product service, persists the order as `PENDING`, charges
//! the payment service and records the outcome:
//!
//! | Payment outcome | Final status | Caller sees |
//! |-----------------|--------------|-------------|
//! | completed | `CONFIRMED` | the order |
//! | pending | `PENDING` | the order |
//! | failed | `FAILED` | the order |
//! | declined | `FAILED` | `PaymentRejected` |
//! | service unreachable | `PENDING` | `ExternalService` |
//!
//! Cancelling loads the order, applies the cancel transition and saves it.

pub mod cancel_order;
pub mod create_order;
pub mod error;
pub mod queries;
pub mod service;
pub mod services;

pub use cancel_order::CancelOrderOrchestrator;
pub use create_order::{CreateOrderOrchestrator, OrderLine};
pub use error::{MemberRejection, OrchestrationError, ProductRejection, Result};
pub use queries::OrderQueries;
pub use service::{OrderPorts, OrderService};
pub use services::{
    ChargeOutcome, DEFAULT_CALL_TIMEOUT, HttpMemberValidator, HttpPaymentGateway,
    HttpProductValidator, InMemoryMemberValidator, InMemoryPaymentGateway,
    InMemoryProductValidator, MemberInfo, MemberStatus, MemberValidator, PaymentGateway,
    PaymentResult, PaymentStatus, ProductInfo, ProductStatus, ProductValidator,
    SandboxMemberValidator, SandboxPaymentGateway, SandboxProductValidator, StockInfo,
};
