//! Checkout step sequencing.

use serde::{Deserialize, Serialize};

/// The step a checkout session is at.
///
/// Stage transitions:
/// ```text
/// FreightPending ──► AddressPending ──► PaymentPending ──► ReadyToSubmit ──► Submitted
///        ▲                  ▲                  ▲                 │
///        └──────────────────┴──────────────────┴─────────────────┘
///                        (re-selecting an earlier step)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckoutStage {
    /// No shipping method chosen yet.
    #[default]
    FreightPending,

    /// Shipping chosen, no confirmed delivery address.
    AddressPending,

    /// Shipping and address set, no payment method.
    PaymentPending,

    /// Every selection is in place.
    ReadyToSubmit,

    /// The order was accepted (terminal state).
    Submitted,
}

impl CheckoutStage {
    /// Derives the stage from which selections are present.
    ///
    /// Selections are checked in step order, so a later selection without
    /// an earlier one does not advance the stage.
    pub fn from_selections(has_freight: bool, has_address: bool, has_payment: bool) -> Self {
        match (has_freight, has_address, has_payment) {
            (false, _, _) => CheckoutStage::FreightPending,
            (true, false, _) => CheckoutStage::AddressPending,
            (true, true, false) => CheckoutStage::PaymentPending,
            (true, true, true) => CheckoutStage::ReadyToSubmit,
        }
    }

    /// Returns true if an address can be chosen in this stage.
    pub fn can_select_address(&self) -> bool {
        matches!(
            self,
            CheckoutStage::AddressPending | CheckoutStage::PaymentPending | CheckoutStage::ReadyToSubmit
        )
    }

    /// Returns true if a payment method can be chosen in this stage.
    pub fn can_select_payment(&self) -> bool {
        matches!(
            self,
            CheckoutStage::PaymentPending | CheckoutStage::ReadyToSubmit
        )
    }

    /// Returns true if the order can be submitted in this stage.
    pub fn can_submit(&self) -> bool {
        matches!(self, CheckoutStage::ReadyToSubmit)
    }

    /// Returns true if this is a terminal stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutStage::Submitted)
    }

    /// Returns the stage name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStage::FreightPending => "FreightPending",
            CheckoutStage::AddressPending => "AddressPending",
            CheckoutStage::PaymentPending => "PaymentPending",
            CheckoutStage::ReadyToSubmit => "ReadyToSubmit",
            CheckoutStage::Submitted => "Submitted",
        }
    }
}

impl std::fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
