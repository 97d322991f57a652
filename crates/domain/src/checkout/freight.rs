use std::str::FromStr;

use common::Money;
use serde::{Deserialize, Serialize};

use super::CheckoutError;

/// Shipping methods offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FreightKind {
    /// No shipping cost.
    #[serde(rename = "gratis", alias = "free")]
    Free,

    /// Regular parcel service.
    #[serde(rename = "pac", alias = "standard")]
    Standard,

    /// Expedited delivery.
    #[serde(rename = "sedex", alias = "express")]
    Express,
}

impl FreightKind {
    /// Every kind, in the order they are offered.
    pub const ALL: [FreightKind; 3] = [FreightKind::Free, FreightKind::Standard, FreightKind::Express];

    /// Returns the fixed cost of this kind.
    pub fn amount(&self) -> Money {
        match self {
            FreightKind::Free => Money::zero(),
            FreightKind::Standard => Money::from_cents(1000),
            FreightKind::Express => Money::from_cents(2000),
        }
    }

    /// Returns the persisted tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            FreightKind::Free => "gratis",
            FreightKind::Standard => "pac",
            FreightKind::Express => "sedex",
        }
    }
}

impl std::fmt::Display for FreightKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FreightKind {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gratis" | "free" => Ok(FreightKind::Free),
            "pac" | "standard" => Ok(FreightKind::Standard),
            "sedex" | "express" => Ok(FreightKind::Express),
            other => Err(CheckoutError::UnknownFreightKind(other.to_string())),
        }
    }
}

/// A chosen shipping method together with its cost.
///
/// The pair is persisted as `{ "tipo": ..., "valor": ... }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreightSelection {
    #[serde(rename = "tipo")]
    pub kind: FreightKind,

    #[serde(rename = "valor")]
    pub amount: Money,
}

impl FreightSelection {
    /// Builds the selection for a kind, looking up its cost.
    pub fn new(kind: FreightKind) -> Self {
        Self {
            kind,
            amount: kind.amount(),
        }
    }

    /// Returns the selection with its amount taken from the fixed table.
    pub fn normalized(self) -> Self {
        Self::new(self.kind)
    }

    /// Returns true if the stored amount matches the fixed table.
    pub fn is_consistent(&self) -> bool {
        self.amount == self.kind.amount()
    }
}

impl From<FreightKind> for FreightSelection {
    fn from(kind: FreightKind) -> Self {
        Self::new(kind)
    }
}
