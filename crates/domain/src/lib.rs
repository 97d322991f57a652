//! Cart and checkout logic for the storefront.
//!
//! This crate provides:
//! - The stock-bounded cart and its persisted engine
//! - The checkout session state machine and card validation
//! - Observer plumbing for UI layers
//! - A read-only view of the signed-in user

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod error;
pub mod event;
pub mod observer;

pub use auth::AuthSession;
pub use cart::{Cart, CartEngine, CartError, CartEvent, CartLineItem, Product};
pub use checkout::{
    CardDetails, CheckoutError, CheckoutEvent, CheckoutSession, CheckoutSessionState,
    CheckoutStage, CheckoutTotals, ConfirmedSelections, DeliveryAddress, FreightKind,
    FreightSelection, PaymentInput, PaymentMethod,
};
pub use error::DomainError;
pub use event::DomainEvent;
pub use observer::{Observer, Observers};
