use std::sync::Arc;

use common::{MemberId, OrderId, Page, PageRequest};
use domain::Order;
use order_store::OrderRepository;

use crate::error::{OrchestrationError, Result};

/// Read-side access to orders.
#[derive(Clone)]
pub struct OrderQueries {
    repository: Arc<dyn OrderRepository>,
}

impl OrderQueries {
    pub fn new(repository: Arc<dyn OrderRepository>) -> Self {
        Self { repository }
    }

    /// Fetches one order, failing with `OrderNotFound` when it does not exist.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.repository
            .find_by_id(order_id)
            .await?
            .ok_or(OrchestrationError::OrderNotFound(order_id))
    }

    /// Lists orders by ascending ID, optionally only those of one member.
    pub async fn list_orders(
        &self,
        page: PageRequest,
        member_id: Option<MemberId>,
    ) -> Result<Page<Order>> {
        let orders = match member_id {
            Some(member_id) => self.repository.list_by_member(member_id, page).await?,
            None => self.repository.list(page).await?,
        };
        Ok(orders)
    }
}
