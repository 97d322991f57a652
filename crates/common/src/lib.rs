//! Shared types for the storefront checkout core.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{AddressId, OrderNumber, ProductId};
