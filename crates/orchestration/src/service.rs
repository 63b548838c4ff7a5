//! Single entry point for the order use cases.

use std::sync::Arc;
use std::time::Duration;

use common::{MemberId, OrderId, Page, PageRequest};
use domain::{Order, PaymentMethod};
use order_store::OrderRepository;

use crate::cancel_order::CancelOrderOrchestrator;
use crate::create_order::{CreateOrderOrchestrator, OrderLine};
use crate::error::Result;
use crate::queries::OrderQueries;
use crate::services::{MemberValidator, PaymentGateway, ProductValidator};

/// The ports an [`OrderService`] is wired with.
#[derive(Clone)]
pub struct OrderPorts {
    pub repository: Arc<dyn OrderRepository>,
    pub members: Arc<dyn MemberValidator>,
    pub products: Arc<dyn ProductValidator>,
    pub payments: Arc<dyn PaymentGateway>,
}

/// Creates, reads and cancels orders.
pub struct OrderService {
    create: CreateOrderOrchestrator,
    cancel: CancelOrderOrchestrator,
    queries: OrderQueries,
}

impl OrderService {
    pub fn new(ports: OrderPorts, call_timeout: Duration) -> Self {
        let create = CreateOrderOrchestrator::new(
            ports.repository.clone(),
            ports.members,
            ports.products,
            ports.payments,
        )
        .with_call_timeout(call_timeout);

        Self {
            create,
            cancel: CancelOrderOrchestrator::new(ports.repository.clone()),
            queries: OrderQueries::new(ports.repository),
        }
    }

    pub async fn create_order(
        &self,
        member_id: MemberId,
        lines: Vec<OrderLine>,
        payment_method: PaymentMethod,
    ) -> Result<Order> {
        self.create
            .create_order(member_id, lines, payment_method)
            .await
    }

    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.queries.get_order(order_id).await
    }

    pub async fn list_orders(
        &self,
        page: PageRequest,
        member_id: Option<MemberId>,
    ) -> Result<Page<Order>> {
        self.queries.list_orders(page, member_id).await
    }

    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        self.cancel.cancel_order(order_id).await
    }
}
