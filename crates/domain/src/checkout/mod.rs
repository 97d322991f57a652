//! Checkout session: freight, delivery address and payment selections.

mod address;
mod events;
mod freight;
mod payment;
mod session;
mod stage;

pub use address::DeliveryAddress;
pub use events::CheckoutEvent;
pub use freight::{FreightKind, FreightSelection};
pub use payment::{
    CardDetails, CardField, CardFieldProblem, PaymentInput, PaymentMethod, digits_only,
    format_expiry_input, letters_only,
};
pub use session::{CheckoutSession, CheckoutSessionState, CheckoutTotals, ConfirmedSelections};
pub use stage::CheckoutStage;

use common::AddressId;
use thiserror::Error;

/// Refusals of checkout steps.
///
/// Each names the selection or field the shopper has to fix; the session is
/// left as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Please choose a shipping method")]
    MissingFreightSelection,

    #[error("Please choose a delivery address")]
    MissingAddress,

    #[error("Please choose a payment method")]
    MissingPaymentMethod,

    #[error("Invalid {field}: {problem}")]
    InvalidCardField {
        field: CardField,
        problem: CardFieldProblem,
    },

    #[error("Address {address_id} is not among the saved addresses")]
    AddressNotFound { address_id: AddressId },

    #[error("The cart is empty")]
    EmptyCart,

    #[error("Unknown shipping method: {0}")]
    UnknownFreightKind(String),

    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),
}

impl CheckoutError {
    /// Returns true for refusals caused by a step not yet completed.
    pub fn is_missing_selection(&self) -> bool {
        matches!(
            self,
            CheckoutError::MissingFreightSelection
                | CheckoutError::MissingAddress
                | CheckoutError::MissingPaymentMethod
        )
    }
}
