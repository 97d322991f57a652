//! Product catalog service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::ProductId;
use domain::Product;

use crate::error::{GatewayError, Result};

/// Trait for reading products from the catalog.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Fetches the current price and stock of a product.
    async fn product(&self, id: &ProductId) -> Result<Product>;
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    products: HashMap<ProductId, Product>,
    fail_on_fetch: bool,
    fetches: usize,
}

/// In-memory catalog for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub fn insert(&self, product: Product) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.products.insert(product.id.clone(), product);
    }

    /// Changes the stock of a known product.
    pub fn set_stock(&self, id: &ProductId, stock: u32) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(product) = state.products.get_mut(id) {
            product.stock = stock;
        }
    }

    /// Configures every fetch to fail.
    pub fn set_fail_on_fetch(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_fetch = fail;
    }

    /// Returns the number of fetches made.
    pub fn fetch_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .fetches
    }
}

#[async_trait]
impl CatalogService for InMemoryCatalog {
    async fn product(&self, id: &ProductId) -> Result<Product> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.fetches += 1;

        if state.fail_on_fetch {
            return Err(GatewayError::Service {
                operation: "product lookup",
                status: Some(503),
                message: "Catalog unavailable".to_string(),
            });
        }

        state
            .products
            .get(id)
            .cloned()
            .ok_or_else(|| GatewayError::Service {
                operation: "product lookup",
                status: Some(404),
                message: format!("Product {id} not found"),
            })
    }
}
