use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use common::{MemberId, OrderId, Page, PageRequest, Version};
use domain::Order;
use tokio::sync::RwLock;

use crate::{OrderRepository, Result, StoreError};

#[derive(Default)]
struct MemoryState {
    orders: BTreeMap<OrderId, Order>,
    last_id: i64,
}

/// In-memory order repository.
///
/// This implementation keeps every order in memory and provides the same
/// versioning behaviour as the PostgreSQL implementation. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<RwLock<MemoryState>>,
    save_calls: Arc<AtomicUsize>,
}

impl InMemoryOrderRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many times `save` has been called, successful or not.
    pub fn save_count(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: &Order) -> Result<Order> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;

        let saved = match order.id() {
            None => {
                state.last_id += 1;
                let id = OrderId::new(state.last_id);
                order.clone().into_persisted(id, Version::first())
            }
            Some(id) => {
                let stored = state
                    .orders
                    .get(&id)
                    .ok_or(StoreError::OrderNotFound(id))?;

                if stored.version() != order.version() {
                    return Err(StoreError::ConcurrencyConflict {
                        order_id: id,
                        expected: order.version(),
                        actual: stored.version(),
                    });
                }

                order.clone().into_persisted(id, order.version().next())
            }
        };

        if let Some(id) = saved.id() {
            state.orders.insert(id, saved.clone());
        }
        tracing::debug!(order_id = ?saved.id(), version = %saved.version(), "order saved");

        Ok(saved)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Order>> {
        let state = self.state.read().await;
        let all: Vec<Order> = state.orders.values().cloned().collect();
        Ok(Page::from_all(all, page))
    }

    async fn list_by_member(&self, member_id: MemberId, page: PageRequest) -> Result<Page<Order>> {
        let state = self.state.read().await;
        let all: Vec<Order> = state
            .orders
            .values()
            .filter(|order| order.member_id() == member_id)
            .cloned()
            .collect();
        Ok(Page::from_all(all, page))
    }
}
