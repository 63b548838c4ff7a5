//! Ports to the services an order depends on, with in-memory, sandbox and
//! HTTP adapters.

use std::future::Future;
use std::time::Duration;

use crate::error::{OrchestrationError, Result};

pub mod http;
pub mod member;
pub mod payment;
pub mod product;
pub mod sandbox;

pub use http::{HttpMemberValidator, HttpPaymentGateway, HttpProductValidator};
pub use member::{InMemoryMemberValidator, MemberInfo, MemberStatus, MemberValidator};
pub use payment::{
    ChargeOutcome, ChargeRecord, InMemoryPaymentGateway, PaymentGateway, PaymentResult,
    PaymentStatus,
};
pub use product::{
    InMemoryProductValidator, ProductInfo, ProductStatus, ProductValidator, StockInfo,
};
pub use sandbox::{SandboxMemberValidator, SandboxPaymentGateway, SandboxProductValidator};

/// Name reported for member service failures.
pub const MEMBER_SERVICE: &str = "MemberService";
/// Name reported for product service failures.
pub const PRODUCT_SERVICE: &str = "ProductService";
/// Name reported for payment service failures.
pub const PAYMENT_SERVICE: &str = "PaymentService";

/// Default upper bound for a single port call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs a port call, turning an elapsed deadline into `ExternalService`.
pub(crate) async fn bounded<T, F>(service: &'static str, limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(OrchestrationError::external(
            service,
            format!("call timed out after {} ms", limit.as_millis()),
        )),
    }
}
