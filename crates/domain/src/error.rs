//! Domain error types.

use storage::StorageError;
use thiserror::Error;

use crate::cart::CartError;
use crate::checkout::CheckoutError;

/// Errors that can occur during cart and checkout operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A cart operation was refused.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// A checkout step was refused.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The persisted store could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DomainError {
    /// Returns true if the shopper can fix the problem and carry on.
    ///
    /// Refusals leave state untouched and only need a warning; storage
    /// failures do not.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DomainError::Cart(_) | DomainError::Checkout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refusals_are_recoverable() {
        let err: DomainError = CheckoutError::MissingAddress.into();
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Please choose a delivery address");

        let err: DomainError = StorageError::Poisoned.into();
        assert!(!err.is_recoverable());
    }
}
