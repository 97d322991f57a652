//! Gateway error types.

use std::time::Duration;

use domain::{CartError, CheckoutError, DomainError};
use storage::StorageError;
use thiserror::Error;

/// Errors that can occur while talking to the backend or placing an order.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Nobody is signed in.
    #[error("Please sign in to continue")]
    AuthenticationRequired,

    /// The backend rejected the bearer token.
    #[error("Your session has expired, please sign in again")]
    SessionExpired,

    /// The order could not be created.
    #[error("Order submission failed: {0}")]
    SubmissionFailed(String),

    /// A backend call did not answer in time.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The backend answered with a body that does not match the contract.
    #[error("Malformed response from {operation}: {reason}")]
    MalformedResponse {
        operation: &'static str,
        reason: String,
    },

    /// A backend call failed.
    #[error("{operation} failed: {message}")]
    Service {
        operation: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// A cart operation was refused.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// A checkout step was refused.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The persisted store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl GatewayError {
    /// Returns true if the shopper has to sign in before anything else.
    ///
    /// This is the one case where the current flow is abandoned; every
    /// other error leaves the shopper on the same step.
    pub fn requires_authentication(&self) -> bool {
        matches!(
            self,
            GatewayError::AuthenticationRequired | GatewayError::SessionExpired
        )
    }

    /// Returns true if the same request may succeed when sent again.
    ///
    /// Covers a failed or timed-out order creation and transport failures
    /// of the other calls. The cart and the checkout session are left as
    /// they were in each case.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::SubmissionFailed(_) | GatewayError::Timeout { .. } => true,
            GatewayError::Service { status, .. } => status.is_none_or(|s| s >= 500),
            _ => false,
        }
    }

    /// Returns the HTTP status, if the backend sent one.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Service { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns a short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::AuthenticationRequired => "authentication_required",
            GatewayError::SessionExpired => "session_expired",
            GatewayError::SubmissionFailed(_) => "submission_failed",
            GatewayError::Timeout { .. } => "timeout",
            GatewayError::MalformedResponse { .. } => "malformed_response",
            GatewayError::Service { .. } => "service",
            GatewayError::Cart(_) => "cart",
            GatewayError::Checkout(_) => "checkout",
            GatewayError::Storage(_) => "storage",
        }
    }
}

impl From<DomainError> for GatewayError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Cart(e) => GatewayError::Cart(e),
            DomainError::Checkout(e) => GatewayError::Checkout(e),
            DomainError::Storage(e) => GatewayError::Storage(e),
        }
    }
}

/// Convenience type alias for gateway results.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_auth_errors_require_sign_in() {
        assert!(GatewayError::SessionExpired.requires_authentication());
        assert!(GatewayError::AuthenticationRequired.requires_authentication());
        assert!(!GatewayError::SubmissionFailed("boom".into()).requires_authentication());
        assert!(!GatewayError::Checkout(CheckoutError::MissingAddress).requires_authentication());
    }

    #[test]
    fn test_failed_and_timed_out_submissions_are_retryable() {
        assert!(GatewayError::SubmissionFailed("boom".into()).is_retryable());
        assert!(
            GatewayError::Timeout {
                operation: "order creation",
                after: std::time::Duration::from_secs(10),
            }
            .is_retryable()
        );
        assert!(!GatewayError::SessionExpired.is_retryable());
        assert!(!GatewayError::Checkout(CheckoutError::MissingAddress).is_retryable());
        assert!(
            !GatewayError::Service {
                operation: "product lookup",
                status: Some(404),
                message: "not found".into(),
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_domain_errors_unwrap() {
        let err: GatewayError = DomainError::Checkout(CheckoutError::EmptyCart).into();
        assert!(matches!(err, GatewayError::Checkout(CheckoutError::EmptyCart)));
        assert_eq!(err.kind(), "checkout");
    }
}
