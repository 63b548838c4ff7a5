//! Adapters that call the member, product and payment services over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use common::{MemberId, OrderId, PaymentId, ProductId};
use domain::{Money, PaymentMethod};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{OrchestrationError, Result};
use crate::services::{
    MEMBER_SERVICE, MemberInfo, MemberValidator, PAYMENT_SERVICE, PRODUCT_SERVICE,
    PaymentGateway, PaymentResult, PaymentStatus, ProductInfo, ProductValidator, StockInfo,
};

fn build_client(service: &'static str, timeout: Duration) -> Result<Client> {
    Client::builder()
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(timeout)
        .build()
        .map_err(|e| OrchestrationError::external(service, format!("Failed to build client: {e}")))
}

fn join(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Issues a GET and decodes the body, treating 404 as absent.
async fn get_optional<T>(
    client: &Client,
    service: &'static str,
    what: &str,
    url: String,
) -> Result<Option<T>>
where
    T: for<'de> Deserialize<'de>,
{
    tracing::debug!(service, url = %url, "GET");

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| OrchestrationError::external(service, format!("Failed to get {what}: {e}")))?;

    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }

    let response = response
        .error_for_status()
        .map_err(|e| OrchestrationError::external(service, format!("Failed to get {what}: {e}")))?;

    let body = response.json::<T>().await.map_err(|e| {
        OrchestrationError::external(service, format!("Invalid {what} response: {e}"))
    })?;
    Ok(Some(body))
}

/// Member service client.
#[derive(Debug, Clone)]
pub struct HttpMemberValidator {
    client: Client,
    base_url: String,
}

impl HttpMemberValidator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(MEMBER_SERVICE, timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl MemberValidator for HttpMemberValidator {
    async fn get_member(&self, member_id: MemberId) -> Result<Option<MemberInfo>> {
        let url = join(&self.base_url, &format!("/api/members/{member_id}"));
        get_optional(&self.client, MEMBER_SERVICE, "member", url).await
    }
}

/// Product service client.
#[derive(Debug, Clone)]
pub struct HttpProductValidator {
    client: Client,
    base_url: String,
}

impl HttpProductValidator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(PRODUCT_SERVICE, timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ProductValidator for HttpProductValidator {
    async fn get_product(&self, product_id: ProductId) -> Result<Option<ProductInfo>> {
        let url = join(&self.base_url, &format!("/api/products/{product_id}"));
        get_optional(&self.client, PRODUCT_SERVICE, "product", url).await
    }

    async fn get_stock(&self, product_id: ProductId) -> Result<Option<StockInfo>> {
        let url = join(&self.base_url, &format!("/api/products/{product_id}/stock"));
        get_optional(&self.client, PRODUCT_SERVICE, "stock", url).await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentRequest {
    order_id: OrderId,
    amount: Money,
    payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentResponse {
    id: PaymentId,
    status: PaymentStatus,
    #[serde(default)]
    transaction_id: Option<String>,
}

/// Payment service client.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(PAYMENT_SERVICE, timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn charge(
        &self,
        order_id: OrderId,
        amount: Money,
        payment_method: PaymentMethod,
    ) -> Result<PaymentResult> {
        let url = join(&self.base_url, "/api/payments");
        let request = PaymentRequest {
            order_id,
            amount,
            payment_method,
        };
        tracing::debug!(order_id = %order_id, amount = %amount, url = %url, "POST payment");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                OrchestrationError::external(PAYMENT_SERVICE, format!("Failed to process payment: {e}"))
            })?;

        let reason = match response.status() {
            StatusCode::UNPROCESSABLE_ENTITY => Some("Payment rejected by payment service"),
            StatusCode::BAD_REQUEST => Some("Invalid payment request"),
            _ => None,
        };
        if let Some(reason) = reason {
            return Err(OrchestrationError::PaymentRejected {
                order_id,
                reason: reason.to_string(),
            });
        }

        let response = response.error_for_status().map_err(|e| {
            OrchestrationError::external(PAYMENT_SERVICE, format!("Failed to process payment: {e}"))
        })?;

        let body = response.json::<PaymentResponse>().await.map_err(|e| {
            OrchestrationError::external(PAYMENT_SERVICE, format!("Invalid payment response: {e}"))
        })?;

        Ok(PaymentResult {
            payment_id: body.id,
            status: body.status,
            transaction_id: body.transaction_id.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        http::StatusCode as AxumStatus,
        routing::{get, post},
    };
    use serde_json::{Value, json};

    use crate::services::{MemberStatus, ProductStatus};

    /// Serves the router on an ephemeral port and returns its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn timeout() -> Duration {
        Duration::from_secs(2)
    }

    #[tokio::test]
    async fn test_member_found_and_missing() {
        let router = Router::new()
            .route(
                "/api/members/1",
                get(|| async {
                    Json(json!({
                        "id": 1, "name": "Kim", "email": "kim@test.com",
                        "status": "ACTIVE", "grade": "GOLD"
                    }))
                }),
            )
            .route("/api/members/2", get(|| async { AxumStatus::NOT_FOUND }));
        let members = HttpMemberValidator::new(serve(router).await, timeout()).unwrap();

        let member = members.get_member(MemberId::new(1)).await.unwrap().unwrap();
        assert_eq!(member.status, MemberStatus::Active);
        assert_eq!(member.grade.as_deref(), Some("GOLD"));

        assert!(members.get_member(MemberId::new(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_member_server_error_is_external() {
        let router = Router::new().route(
            "/api/members/1",
            get(|| async { AxumStatus::INTERNAL_SERVER_ERROR }),
        );
        let members = HttpMemberValidator::new(serve(router).await, timeout()).unwrap();

        let result = members.get_member(MemberId::new(1)).await;
        assert!(matches!(
            result,
            Err(OrchestrationError::ExternalService { service, .. }) if service == MEMBER_SERVICE
        ));
    }

    #[tokio::test]
    async fn test_product_and_stock() {
        let router = Router::new()
            .route(
                "/api/products/5",
                get(|| async {
                    Json(json!({"id": 5, "name": "Lamp", "price": 12.5, "status": "AVAILABLE"}))
                }),
            )
            .route(
                "/api/products/5/stock",
                get(|| async {
                    Json(json!({
                        "productId": 5, "quantity": 10,
                        "reservedQuantity": 3, "availableQuantity": 7
                    }))
                }),
            );
        let products = HttpProductValidator::new(serve(router).await, timeout()).unwrap();

        let product = products.get_product(ProductId::new(5)).await.unwrap().unwrap();
        assert_eq!(product.status, ProductStatus::Available);
        assert_eq!(product.price, Money::from_cents(1250));

        let stock = products.get_stock(ProductId::new(5)).await.unwrap().unwrap();
        assert_eq!(stock.available_quantity, 7);
        assert!(products.get_stock(ProductId::new(6)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_payment_accepted() {
        let router = Router::new().route(
            "/api/payments",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["paymentMethod"], "CREDIT_CARD");
                Json(json!({
                    "id": 77, "orderId": body["orderId"], "amount": body["amount"],
                    "status": "COMPLETED", "transactionId": "TXN-1",
                    "createdAt": "2024-01-01T10:00:00"
                }))
            }),
        );
        let payments = HttpPaymentGateway::new(serve(router).await, timeout()).unwrap();

        let result = payments
            .charge(OrderId::new(3), Money::from_cents(5998), PaymentMethod::CreditCard)
            .await
            .unwrap();
        assert_eq!(result.payment_id, PaymentId::new(77));
        assert_eq!(result.status, PaymentStatus::Completed);
        assert_eq!(result.transaction_id, "TXN-1");
    }

    #[tokio::test]
    async fn test_payment_rejections_by_status() {
        let router = Router::new().route(
            "/api/payments",
            post(|Json(body): Json<Value>| async move {
                if body["orderId"] == 1 {
                    AxumStatus::UNPROCESSABLE_ENTITY
                } else if body["orderId"] == 2 {
                    AxumStatus::BAD_REQUEST
                } else {
                    AxumStatus::SERVICE_UNAVAILABLE
                }
            }),
        );
        let payments = HttpPaymentGateway::new(serve(router).await, timeout()).unwrap();
        let amount = Money::from_cents(1000);

        let declined = payments
            .charge(OrderId::new(1), amount, PaymentMethod::CreditCard)
            .await;
        assert!(matches!(
            declined,
            Err(OrchestrationError::PaymentRejected { reason, .. })
                if reason == "Payment rejected by payment service"
        ));

        let invalid = payments
            .charge(OrderId::new(2), amount, PaymentMethod::CreditCard)
            .await;
        assert!(matches!(
            invalid,
            Err(OrchestrationError::PaymentRejected { reason, .. }) if reason == "Invalid payment request"
        ));

        let down = payments
            .charge(OrderId::new(3), amount, PaymentMethod::CreditCard)
            .await;
        assert!(matches!(down, Err(OrchestrationError::ExternalService { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_external() {
        let members = HttpMemberValidator::new("http://127.0.0.1:1", timeout()).unwrap();
        let result = members.get_member(MemberId::new(1)).await;
        assert!(matches!(result, Err(OrchestrationError::ExternalService { .. })));
    }
}
