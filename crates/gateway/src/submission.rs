//! Order submission: from a ready checkout to a placed order.

use std::time::{Duration, Instant};

use domain::{AuthSession, CartEngine, CheckoutSessionState};
use storage::KeyValueStore;

use crate::config::ClientConfig;
use crate::error::{GatewayError, Result};
use crate::services::{OrderConfirmation, OrderRequest, OrderService, bounded};

/// Places orders for a checkout session.
///
/// Nothing is sent unless a user is signed in and every checkout selection
/// is in place. A failed submission leaves the cart and the session as they
/// were so the shopper can retry; a successful one clears the session and,
/// unless configured otherwise, the cart in one store write.
#[derive(Debug, Clone)]
pub struct OrderSubmissionGateway<O: OrderService> {
    orders: O,
    timeout: Duration,
    clear_cart_on_submit: bool,
}

impl<O: OrderService> OrderSubmissionGateway<O> {
    /// Creates a gateway with the default time bound that clears the cart.
    pub fn new(orders: O) -> Self {
        Self::with_config(orders, &ClientConfig::default())
    }

    /// Creates a gateway using the configured time bound and cart policy.
    pub fn with_config(orders: O, config: &ClientConfig) -> Self {
        Self {
            orders,
            timeout: config.request_timeout,
            clear_cart_on_submit: config.clear_cart_on_submit,
        }
    }

    /// Sets the bound on the order creation call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets whether a placed order empties the cart.
    pub fn clear_cart_on_submit(mut self, clear: bool) -> Self {
        self.clear_cart_on_submit = clear;
        self
    }

    /// Returns the order service.
    pub fn orders(&self) -> &O {
        &self.orders
    }

    /// Submits the order described by `cart` and `checkout`.
    ///
    /// `cart` and `checkout` must share one store.
    ///
    /// A backend failure comes back as [`GatewayError::SubmissionFailed`],
    /// except a call that ran past the timeout, which comes back as
    /// [`GatewayError::Timeout`]. Both leave the cart and the session intact
    /// and report [`GatewayError::is_retryable`]. An expired token comes back
    /// as [`GatewayError::SessionExpired`].
    #[tracing::instrument(skip_all, fields(lines = cart.cart().len()))]
    pub async fn submit_order<S: KeyValueStore>(
        &self,
        cart: &mut CartEngine<S>,
        checkout: &mut CheckoutSessionState<S>,
        auth: Option<&AuthSession>,
    ) -> Result<OrderConfirmation> {
        metrics::counter!("order_submissions_total").increment(1);

        let result = self.place(cart, checkout, auth).await;
        if let Err(error) = &result {
            metrics::counter!("order_submission_failures_total", "reason" => error.kind())
                .increment(1);
            tracing::warn!(%error, "order submission refused");
        }
        result
    }

    async fn place<S: KeyValueStore>(
        &self,
        cart: &mut CartEngine<S>,
        checkout: &mut CheckoutSessionState<S>,
        auth: Option<&AuthSession>,
    ) -> Result<OrderConfirmation> {
        let auth = auth.ok_or(GatewayError::AuthenticationRequired)?;
        let selections = checkout.ensure_ready(cart.cart())?;
        let request = OrderRequest::new(&selections, cart.cart());

        let start = Instant::now();
        let confirmation = bounded(
            "order creation",
            self.timeout,
            self.orders.create_order(auth, &request),
        )
        .await
        .map_err(|e| match e {
            GatewayError::SessionExpired | GatewayError::Timeout { .. } => e,
            other => GatewayError::SubmissionFailed(other.to_string()),
        })?;
        metrics::histogram!("order_submission_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        let expected = request.expected_total();
        if confirmation.total != expected {
            tracing::info!(
                order_number = %confirmation.order_number,
                confirmed = %confirmation.total,
                %expected,
                "backend confirmed a different total"
            );
        }

        checkout.complete(
            cart,
            confirmation.order_number.clone(),
            self.clear_cart_on_submit,
        )?;
        tracing::info!(
            order_number = %confirmation.order_number,
            total = %confirmation.total,
            "order placed"
        );
        Ok(confirmation)
    }
}
