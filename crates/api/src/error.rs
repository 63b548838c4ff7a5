//! API error types with HTTP response mapping.

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use domain::DomainError;
use orchestration::{MemberRejection, OrchestrationError, ProductRejection};
use order_store::StoreError;
use serde::Serialize;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed body, path or query string.
    BadRequest(String),
    /// Well-formed request that breaks a field rule.
    Validation(String),
    /// Failure reported by an order use case.
    Orchestration(OrchestrationError),
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiError {
    /// Resolves the HTTP status, error code and client-facing message.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone()),
            ApiError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            ApiError::Orchestration(err) => orchestration_parts(err),
        }
    }
}

fn orchestration_parts(err: &OrchestrationError) -> (StatusCode, &'static str, String) {
    let (status, code) = match err {
        OrchestrationError::OrderNotFound(_)
        | OrchestrationError::Store(StoreError::OrderNotFound(_)) => {
            (StatusCode::NOT_FOUND, "ORDER_NOT_FOUND")
        }
        OrchestrationError::Domain(DomainError::InvalidStateTransition { .. }) => {
            (StatusCode::BAD_REQUEST, "INVALID_STATE_TRANSITION")
        }
        OrchestrationError::Domain(DomainError::Validation(_)) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        }
        OrchestrationError::MemberValidation { reason, .. } => match reason {
            MemberRejection::NotFound => (StatusCode::NOT_FOUND, "MEMBER_NOT_FOUND"),
            MemberRejection::NotActive { .. } => (StatusCode::BAD_REQUEST, "MEMBER_NOT_ACTIVE"),
        },
        OrchestrationError::ProductValidation { reason, .. } => match reason {
            ProductRejection::NotFound => (StatusCode::NOT_FOUND, "PRODUCT_NOT_FOUND"),
            ProductRejection::Discontinued => (StatusCode::BAD_REQUEST, "PRODUCT_DISCONTINUED"),
            ProductRejection::InsufficientStock { .. } => {
                (StatusCode::BAD_REQUEST, "INSUFFICIENT_STOCK")
            }
            ProductRejection::Unavailable { .. } | ProductRejection::StockUnavailable => {
                (StatusCode::BAD_REQUEST, "PRODUCT_NOT_AVAILABLE")
            }
        },
        OrchestrationError::PaymentRejected { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "PAYMENT_FAILED")
        }
        OrchestrationError::ExternalService { service, .. } => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                format!("External service temporarily unavailable: {service}"),
            );
        }
        OrchestrationError::Store(StoreError::ConcurrencyConflict { .. }) => {
            (StatusCode::CONFLICT, "CONCURRENT_MODIFICATION")
        }
        OrchestrationError::Store(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An unexpected error occurred".to_string(),
            );
        }
    };
    (status, code, err.to_string())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        match &self {
            ApiError::Orchestration(err) if status.is_server_error() => {
                tracing::error!(code, error = %err, "request failed");
            }
            _ => tracing::warn!(code, message = %message, "request rejected"),
        }

        let body = ErrorBody {
            code,
            message,
            timestamp: Utc::now(),
            path: None,
        };
        let mut response = (status, axum::Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Middleware that stamps the request path onto error bodies.
pub async fn attach_path(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<ErrorBody>() {
        Some(body) => {
            let body = ErrorBody {
                path: Some(path),
                ..body
            };
            (response.status(), axum::Json(body)).into_response()
        }
        None => response,
    }
}

impl From<OrchestrationError> for ApiError {
    fn from(err: OrchestrationError) -> Self {
        ApiError::Orchestration(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Orchestration(err.into())
    }
}

#[cfg(test)]
mod tests {
    use common::{MemberId, OrderId, ProductId, Version};
    use domain::OrderStatus;
    use orchestration::MemberStatus;

    use super::*;

    fn parts(err: OrchestrationError) -> (StatusCode, &'static str, String) {
        ApiError::from(err).parts()
    }

    #[test]
    fn test_not_found_mappings() {
        assert_eq!(
            parts(OrchestrationError::OrderNotFound(OrderId::new(9))).1,
            "ORDER_NOT_FOUND"
        );
        let (status, code, _) = parts(OrchestrationError::MemberValidation {
            member_id: MemberId::new(999),
            reason: MemberRejection::NotFound,
        });
        assert_eq!((status, code), (StatusCode::NOT_FOUND, "MEMBER_NOT_FOUND"));
    }

    #[test]
    fn test_member_not_active_is_bad_request() {
        let (status, code, message) = parts(OrchestrationError::MemberValidation {
            member_id: MemberId::new(998),
            reason: MemberRejection::NotActive {
                status: MemberStatus::Inactive,
            },
        });
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "MEMBER_NOT_ACTIVE");
        assert_eq!(message, "Member is not active (status: INACTIVE)");
    }

    #[test]
    fn test_product_codes() {
        let product = |reason| OrchestrationError::ProductValidation {
            product_id: ProductId::new(1),
            reason,
        };
        assert_eq!(parts(product(ProductRejection::NotFound)).0, StatusCode::NOT_FOUND);
        assert_eq!(
            parts(product(ProductRejection::Discontinued)).1,
            "PRODUCT_DISCONTINUED"
        );
        assert_eq!(
            parts(product(ProductRejection::InsufficientStock {
                available: 2,
                requested: 3
            }))
            .1,
            "INSUFFICIENT_STOCK"
        );
        assert_eq!(
            parts(product(ProductRejection::StockUnavailable)).1,
            "PRODUCT_NOT_AVAILABLE"
        );
    }

    #[test]
    fn test_state_transition_and_conflict() {
        let (status, code, _) = parts(OrchestrationError::Domain(
            DomainError::InvalidStateTransition {
                from: OrderStatus::Confirmed,
                to: OrderStatus::Cancelled,
                reason: "Cannot cancel confirmed order (already paid)",
            },
        ));
        assert_eq!((status, code), (StatusCode::BAD_REQUEST, "INVALID_STATE_TRANSITION"));

        let (status, code, _) = parts(OrchestrationError::Store(
            StoreError::ConcurrencyConflict {
                order_id: OrderId::new(1),
                expected: Version::new(1),
                actual: Version::new(2),
            },
        ));
        assert_eq!((status, code), (StatusCode::CONFLICT, "CONCURRENT_MODIFICATION"));
    }

    #[test]
    fn test_external_service_hides_details() {
        let (status, code, message) = parts(OrchestrationError::external(
            "PaymentService",
            "connection refused",
        ));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, "SERVICE_UNAVAILABLE");
        assert_eq!(
            message,
            "External service temporarily unavailable: PaymentService"
        );
    }

    #[test]
    fn test_store_failure_is_internal() {
        let (status, code, message) = parts(OrchestrationError::Store(
            StoreError::InvalidRecord("bad row".to_string()),
        ));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_ERROR");
        assert!(!message.contains("bad row"));
    }
}
