//! Backend collaborator traits and in-memory implementations.

pub mod addresses;
pub mod catalog;
pub mod orders;

use std::future::Future;
use std::time::Duration;

pub use addresses::{AddressBook, InMemoryAddressBook, PostalCodeLookup};
pub use catalog::{CatalogService, InMemoryCatalog};
pub use orders::{
    InMemoryOrderService, OrderConfirmation, OrderDetail, OrderDetailItem, OrderLine,
    OrderRequest, OrderService, OrderSummary, ShippingAddress,
};

use crate::error::{GatewayError, Result};

/// Runs a backend call under a time bound.
pub(crate) async fn bounded<T>(
    operation: &'static str,
    after: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(after, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, ?after, "backend call timed out");
            Err(GatewayError::Timeout { operation, after })
        }
    }
}
