//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{MemberId, OrderId, Page, PageRequest, PaymentId, ProductId};
use domain::{Money, Order, OrderItem, PaymentMethod};
use orchestration::{OrderLine, OrderService};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orders: OrderService,
}

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub member_id: Option<i64>,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: Option<i64>,
    pub quantity: i64,
}

/// A create request that passed field validation.
#[derive(Debug)]
pub struct ValidCreateOrder {
    pub member_id: MemberId,
    pub lines: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
}

impl CreateOrderRequest {
    /// Checks required fields and quantities before any service is called.
    pub fn validate(self) -> Result<ValidCreateOrder, ApiError> {
        let mut problems = Vec::new();

        if self.member_id.is_none() {
            problems.push("Member ID is required");
        }
        if self.items.is_empty() {
            problems.push("Order must have at least one item");
        }
        if self.payment_method.is_none() {
            problems.push("Payment method is required");
        }
        if self.items.iter().any(|item| item.product_id.is_none()) {
            problems.push("Product ID is required");
        }
        if self.items.iter().any(|item| item.quantity < 1) {
            problems.push("Quantity must be at least 1");
        }

        if !problems.is_empty() {
            return Err(ApiError::Validation(problems.join(", ")));
        }

        let lines = self
            .items
            .iter()
            .map(|item| {
                let quantity = u32::try_from(item.quantity)
                    .map_err(|_| ApiError::Validation("Quantity is too large".to_string()))?;
                Ok(OrderLine::new(
                    ProductId::new(item.product_id.unwrap_or_default()),
                    quantity,
                ))
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        let payment_method = self.payment_method.unwrap_or_default().parse::<PaymentMethod>()?;

        Ok(ValidCreateOrder {
            member_id: MemberId::new(self.member_id.unwrap_or_default()),
            lines,
            payment_method,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
}

impl UpdateOrderRequest {
    pub fn is_cancel_request(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("CANCELLED"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersParams {
    pub member_id: Option<i64>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Option<OrderId>,
    pub member_id: MemberId,
    pub items: Vec<OrderItemResponse>,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub status: String,
    pub payment_id: Option<PaymentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub subtotal: Money,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id(),
            product_name: item.product_name().to_string(),
            unit_price: item.unit_price(),
            quantity: item.quantity(),
            subtotal: item.subtotal(),
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id(),
            member_id: order.member_id(),
            items: order.items().iter().map(OrderItemResponse::from).collect(),
            total_amount: order.total_amount(),
            payment_method: order.payment_method(),
            status: order.status().to_string(),
            payment_id: order.payment_id(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        let total_pages = page.total_pages();
        Self {
            content: page.items,
            page: page.page,
            size: page.size,
            total_elements: page.total_items,
            total_pages,
        }
    }
}

fn order_id(path: Result<Path<i64>, PathRejection>) -> Result<OrderId, ApiError> {
    let Path(id) = path.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(OrderId::new(id))
}

// -- Handlers --

/// POST /api/orders — validate, persist and pay for a new order.
#[tracing::instrument(skip(state, body))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let req = req.validate()?;
    tracing::info!(member_id = %req.member_id, lines = req.lines.len(), "create order request");

    let order = state
        .orders
        .create_order(req.member_id, req.lines, req.payment_method)
        .await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /api/orders/{id} — fetch a single order.
#[tracing::instrument(skip(state, path))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id = order_id(path)?;
    let order = state.orders.get_order(id).await?;
    Ok(Json(order.into()))
}

/// GET /api/orders — list orders, optionally for one member.
#[tracing::instrument(skip(state, params))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListOrdersParams>, QueryRejection>,
) -> Result<Json<PageResponse<OrderResponse>>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let page = PageRequest::new(
        params.page.unwrap_or(0),
        params.size.unwrap_or(PageRequest::DEFAULT_SIZE),
    );

    let orders = state
        .orders
        .list_orders(page, params.member_id.map(MemberId::new))
        .await?;

    Ok(Json(orders.map(OrderResponse::from).into()))
}

/// PUT /api/orders/{id} — cancel an order. Only `CANCELLED` is accepted.
#[tracing::instrument(skip(state, path, body))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id = order_id(path)?;
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if req.status.is_none() {
        return Err(ApiError::Validation("Status is required".to_string()));
    }
    if !req.is_cancel_request() {
        return Err(ApiError::BadRequest(
            "Only CANCELLED status is supported for update".to_string(),
        ));
    }

    let order = state.orders.cancel_order(id).await?;
    Ok(Json(order.into()))
}
