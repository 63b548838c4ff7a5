use async_trait::async_trait;
use common::{MemberId, OrderId, Page, PageRequest};
use domain::Order;

use crate::Result;

/// Core trait for order persistence.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists an order and returns the stored copy.
    ///
    /// An order without an ID is inserted, receiving a fresh ID and version 1.
    /// An order with an ID is updated only if its version matches the stored
    /// one; the stored version is then incremented. A stale version fails with
    /// `ConcurrencyConflict`.
    async fn save(&self, order: &Order) -> Result<Order>;

    /// Loads an order by ID. Returns `None` if it does not exist.
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists all orders by ascending ID.
    async fn list(&self, page: PageRequest) -> Result<Page<Order>>;

    /// Lists the orders placed by one member by ascending ID.
    async fn list_by_member(&self, member_id: MemberId, page: PageRequest) -> Result<Page<Order>>;
}
