use std::sync::Arc;

use common::OrderId;
use domain::Order;
use order_store::OrderRepository;

use crate::error::{OrchestrationError, Result};

/// Cancels orders that have not been paid.
pub struct CancelOrderOrchestrator {
    repository: Arc<dyn OrderRepository>,
}

impl CancelOrderOrchestrator {
    pub fn new(repository: Arc<dyn OrderRepository>) -> Self {
        Self { repository }
    }

    /// Loads the order, applies the cancel transition and persists the result.
    ///
    /// Fails with `OrderNotFound` for unknown IDs and with an invalid state
    /// transition for confirmed orders, in which case nothing is written.
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        let mut order = self
            .repository
            .find_by_id(order_id)
            .await?
            .ok_or(OrchestrationError::OrderNotFound(order_id))?;

        let previous = order.status();
        order.cancel().inspect_err(|e| {
            tracing::warn!(status = %previous, error = %e, "order cannot be cancelled");
        })?;

        let order = self.repository.save(&order).await?;
        tracing::info!(from = %previous, version = %order.version(), "order cancelled");
        metrics::counter!("orders_cancelled_total").increment(1);
        Ok(order)
    }
}
