//! Product service port and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::ProductId;
use domain::Money;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{OrchestrationError, Result};
use crate::services::PRODUCT_SERVICE;

/// Catalog status reported by the product service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    Available,
    Discontinued,
    OutOfStock,
    #[serde(other)]
    Unknown,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInfo {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub status: ProductStatus,
}

impl ProductInfo {
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Available
    }
}

/// Stock levels for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInfo {
    pub product_id: ProductId,
    pub quantity: u32,
    pub reserved_quantity: u32,
    pub available_quantity: u32,
}

impl StockInfo {
    /// Stock with nothing reserved.
    pub fn unreserved(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
            reserved_quantity: 0,
            available_quantity: quantity,
        }
    }

    pub fn has_available(&self, requested: u32) -> bool {
        self.available_quantity >= requested
    }
}

/// Looks up products and their stock.
#[async_trait]
pub trait ProductValidator: Send + Sync {
    /// Fetches a product. `Ok(None)` means the product does not exist.
    async fn get_product(&self, product_id: ProductId) -> Result<Option<ProductInfo>>;

    /// Fetches stock for a product. `Ok(None)` means no stock record exists.
    async fn get_stock(&self, product_id: ProductId) -> Result<Option<StockInfo>>;
}

#[derive(Debug, Default)]
struct InMemoryProductState {
    products: HashMap<ProductId, ProductInfo>,
    stock: HashMap<ProductId, StockInfo>,
    calls: usize,
    unavailable: bool,
    latency: Option<Duration>,
}

/// In-memory product catalog for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductValidator {
    state: Arc<RwLock<InMemoryProductState>>,
}

impl InMemoryProductValidator {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a product along with its available stock.
    pub fn add_product(
        &self,
        product_id: ProductId,
        name: impl Into<String>,
        price: Money,
        status: ProductStatus,
        available: u32,
    ) {
        let mut state = self.state.write();
        state.products.insert(
            product_id,
            ProductInfo {
                id: product_id,
                name: name.into(),
                price,
                status,
            },
        );
        state
            .stock
            .insert(product_id, StockInfo::unreserved(product_id, available));
    }

    /// Drops the stock record for a product, leaving the product itself.
    pub fn remove_stock(&self, product_id: ProductId) {
        self.state.write().stock.remove(&product_id);
    }

    /// Makes every lookup fail as if the service were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unavailable = unavailable;
    }

    /// Delays every lookup by the given duration.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state.write().latency = latency;
    }

    /// Returns how many product and stock lookups were made.
    pub fn call_count(&self) -> usize {
        self.state.read().calls
    }

    async fn enter(&self) -> Result<()> {
        let latency = {
            let mut state = self.state.write();
            state.calls += 1;
            state.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.state.read().unavailable {
            return Err(OrchestrationError::external(
                PRODUCT_SERVICE,
                "service unavailable",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductValidator for InMemoryProductValidator {
    async fn get_product(&self, product_id: ProductId) -> Result<Option<ProductInfo>> {
        self.enter().await?;
        Ok(self.state.read().products.get(&product_id).cloned())
    }

    async fn get_stock(&self, product_id: ProductId) -> Result<Option<StockInfo>> {
        self.enter().await?;
        Ok(self.state.read().stock.get(&product_id).copied())
    }
}
