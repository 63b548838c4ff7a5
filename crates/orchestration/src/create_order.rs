//! Order creation: validation, persistence, payment and final state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{MemberId, ProductId};
use domain::{DomainError, Order, OrderItem, PaymentMethod};
use order_store::{OrderRepository, StoreError};

use crate::error::{MemberRejection, OrchestrationError, ProductRejection, Result};
use crate::services::{
    DEFAULT_CALL_TIMEOUT, MEMBER_SERVICE, MemberValidator, PAYMENT_SERVICE, PRODUCT_SERVICE,
    PaymentGateway, PaymentStatus, ProductStatus, ProductValidator, bounded,
};

/// One requested line of a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Drives an order from request to its post-payment state.
///
/// The flow runs in four stages:
/// 1. Validate the member
/// 2. Validate every product and its stock, building the order items
/// 3. Persist the new order as `PENDING`
/// 4. Charge the payment service and persist the resulting state
///
/// Validation failures leave nothing behind. A declined charge persists the
/// order as `FAILED` before the rejection is returned. An unreachable payment
/// service leaves the order `PENDING`.
pub struct CreateOrderOrchestrator {
    repository: Arc<dyn OrderRepository>,
    members: Arc<dyn MemberValidator>,
    products: Arc<dyn ProductValidator>,
    payments: Arc<dyn PaymentGateway>,
    call_timeout: Duration,
}

impl CreateOrderOrchestrator {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        members: Arc<dyn MemberValidator>,
        products: Arc<dyn ProductValidator>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            repository,
            members,
            products,
            payments,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Sets the upper bound applied to each member, product and payment call.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Creates an order for `member_id` and attempts to pay for it.
    ///
    /// Returns the order as last persisted: `CONFIRMED`, `PENDING` or
    /// `FAILED` depending on the payment outcome.
    #[tracing::instrument(skip(self, lines), fields(member_id = %member_id, lines = lines.len()))]
    pub async fn create_order(
        &self,
        member_id: MemberId,
        lines: Vec<OrderLine>,
        payment_method: PaymentMethod,
    ) -> Result<Order> {
        let started = Instant::now();
        let result = self.run(member_id, lines, payment_method).await;
        metrics::histogram!("order_creation_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        if let Err(OrchestrationError::ExternalService { service, message }) = &result {
            metrics::counter!("external_service_errors_total", "service" => *service)
                .increment(1);
            tracing::error!(service, message = %message, "external service failure");
        }
        result
    }

    async fn run(
        &self,
        member_id: MemberId,
        lines: Vec<OrderLine>,
        payment_method: PaymentMethod,
    ) -> Result<Order> {
        tracing::info!(stage = "validate_member", "order creation started");
        self.validate_member(member_id)
            .await
            .inspect_err(record_validation_failure)?;

        tracing::info!(stage = "validate_products", "member accepted");
        let items = self
            .build_items(&lines)
            .await
            .inspect_err(record_validation_failure)?;

        let order = Order::create(member_id, items, Some(payment_method))
            .map_err(OrchestrationError::from)
            .inspect_err(record_validation_failure)?;
        let order = self.repository.save(&order).await?;
        tracing::info!(
            stage = "payment",
            order_id = ?order.id(),
            total = %order.total_amount(),
            "order persisted as pending"
        );

        self.settle_payment(order).await
    }

    async fn validate_member(&self, member_id: MemberId) -> Result<()> {
        let member = bounded(
            MEMBER_SERVICE,
            self.call_timeout,
            self.members.get_member(member_id),
        )
        .await?
        .ok_or(OrchestrationError::MemberValidation {
            member_id,
            reason: MemberRejection::NotFound,
        })?;

        if !member.is_active() {
            tracing::warn!(member_id = %member_id, status = %member.status, "member not active");
            return Err(OrchestrationError::MemberValidation {
                member_id,
                reason: MemberRejection::NotActive {
                    status: member.status,
                },
            });
        }
        Ok(())
    }

    /// Validates each line in request order and snapshots name and price.
    async fn build_items(&self, lines: &[OrderLine]) -> Result<Vec<OrderItem>> {
        let mut items = Vec::with_capacity(lines.len());

        for line in lines {
            let product_id = line.product_id;
            let reject =
                |reason: ProductRejection| OrchestrationError::ProductValidation { product_id, reason };

            let product = bounded(
                PRODUCT_SERVICE,
                self.call_timeout,
                self.products.get_product(product_id),
            )
            .await?
            .ok_or_else(|| reject(ProductRejection::NotFound))?;

            if !product.is_available() {
                return Err(reject(match product.status {
                    ProductStatus::Discontinued => ProductRejection::Discontinued,
                    status => ProductRejection::Unavailable { status },
                }));
            }

            let stock = bounded(
                PRODUCT_SERVICE,
                self.call_timeout,
                self.products.get_stock(product_id),
            )
            .await?
            .ok_or_else(|| reject(ProductRejection::StockUnavailable))?;

            tracing::debug!(
                product_id = %product_id,
                available = stock.available_quantity,
                requested = line.quantity,
                "stock checked"
            );
            if !stock.has_available(line.quantity) {
                return Err(reject(ProductRejection::InsufficientStock {
                    available: stock.available_quantity,
                    requested: line.quantity,
                }));
            }

            items.push(OrderItem::new(
                product_id,
                product.name,
                product.price,
                line.quantity,
            )?);
        }

        Ok(items)
    }

    async fn settle_payment(&self, mut order: Order) -> Result<Order> {
        let order_id = order.id().ok_or_else(|| {
            StoreError::InvalidRecord("saved order was not assigned an id".to_string())
        })?;

        let charge = bounded(
            PAYMENT_SERVICE,
            self.call_timeout,
            self.payments
                .charge(order_id, order.total_amount(), order.payment_method()),
        )
        .await;

        match charge {
            Ok(payment) => {
                match payment.status {
                    PaymentStatus::Completed => order.mark_confirmed(payment.payment_id)?,
                    PaymentStatus::Pending => order.mark_pending(payment.payment_id),
                    PaymentStatus::Failed | PaymentStatus::Unknown => {
                        tracing::warn!(order_id = %order_id, status = ?payment.status, "payment not settled");
                        order.mark_failed();
                    }
                }
                let order = self.repository.save(&order).await?;
                tracing::info!(
                    order_id = %order_id,
                    status = %order.status(),
                    transaction_id = %payment.transaction_id,
                    "order creation finished"
                );
                metrics::counter!("orders_created_total", "status" => order.status().as_str())
                    .increment(1);
                Ok(order)
            }
            Err(rejection @ OrchestrationError::PaymentRejected { .. }) => {
                tracing::error!(order_id = %order_id, error = %rejection, "payment rejected");
                metrics::counter!("order_payment_rejections_total").increment(1);
                order.mark_failed();
                let order = self.repository.save(&order).await?;
                metrics::counter!("orders_created_total", "status" => order.status().as_str())
                    .increment(1);
                Err(rejection)
            }
            Err(err) => {
                tracing::error!(order_id = %order_id, error = %err, "payment call failed; order left pending");
                Err(err)
            }
        }
    }
}

/// Returns the validation stage a request was refused at, if it was refused
/// rather than failing on a downstream call.
fn validation_stage(err: &OrchestrationError) -> Option<&'static str> {
    match err {
        OrchestrationError::MemberValidation { .. } => Some("member"),
        OrchestrationError::ProductValidation { .. } => Some("product"),
        OrchestrationError::Domain(DomainError::Validation(_)) => Some("order"),
        _ => None,
    }
}

fn record_validation_failure(err: &OrchestrationError) {
    if let Some(stage) = validation_stage(err) {
        metrics::counter!("order_validation_failures_total", "stage" => stage).increment(1);
    }
}
