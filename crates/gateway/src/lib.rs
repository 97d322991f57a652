//! Backend side of the storefront.
//!
//! This crate provides:
//! - Collaborator traits for the catalog, address book and orders, with
//!   in-memory and HTTP implementations
//! - The order submission gateway
//! - The [`Storefront`] facade tying cart, checkout and backend together
//! - Client configuration and tracing setup

pub mod config;
pub mod error;
pub mod http;
pub mod services;
pub mod storefront;
pub mod submission;
pub mod telemetry;

pub use config::{ClientConfig, LogFormat};
pub use error::{GatewayError, Result};
pub use http::HttpApiClient;
pub use services::{
    AddressBook, CatalogService, InMemoryAddressBook, InMemoryCatalog, InMemoryOrderService,
    OrderConfirmation, OrderDetail, OrderRequest, OrderService, OrderSummary, PostalCodeLookup,
};
pub use storefront::{StockRefresh, Storefront};
pub use submission::OrderSubmissionGateway;
pub use telemetry::init_tracing;
