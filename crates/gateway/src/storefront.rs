//! The storefront facade the UI layer drives.

use std::time::Duration;

use common::{OrderNumber, ProductId};
use domain::{AuthSession, CartEngine, CheckoutSessionState, DeliveryAddress};
use storage::KeyValueStore;

use crate::config::ClientConfig;
use crate::error::{GatewayError, Result};
use crate::services::{
    AddressBook, CatalogService, OrderConfirmation, OrderDetail, OrderService, OrderSummary,
    PostalCodeLookup, bounded,
};
use crate::submission::OrderSubmissionGateway;

/// Outcome of refreshing stock for every cart line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockRefresh {
    /// Lines whose ceiling or quantity changed.
    pub updated: Vec<ProductId>,
    /// Lines whose product has no stock left.
    pub sold_out: Vec<ProductId>,
    /// Lines the catalog could not answer for; left as they were.
    pub unavailable: Vec<ProductId>,
}

/// Cart, checkout and backend collaborators behind one handle.
///
/// The cart and the checkout state are loaded from the same store.
pub struct Storefront<S, C, A, O>
where
    S: KeyValueStore + Clone,
    C: CatalogService,
    A: AddressBook,
    O: OrderService,
{
    store: S,
    cart: CartEngine<S>,
    checkout: CheckoutSessionState<S>,
    catalog: C,
    addresses: A,
    gateway: OrderSubmissionGateway<O>,
    timeout: Duration,
}

impl<S, C, A, O> Storefront<S, C, A, O>
where
    S: KeyValueStore + Clone,
    C: CatalogService,
    A: AddressBook,
    O: OrderService,
{
    /// Loads the cart and checkout persisted in `store`.
    pub fn open(store: S, catalog: C, addresses: A, orders: O, config: &ClientConfig) -> Result<Self> {
        let cart = CartEngine::load(store.clone())?;
        let checkout = CheckoutSessionState::load(store.clone())?;
        Ok(Self {
            store,
            cart,
            checkout,
            catalog,
            addresses,
            gateway: OrderSubmissionGateway::with_config(orders, config),
            timeout: config.request_timeout,
        })
    }

    pub fn cart(&self) -> &CartEngine<S> {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut CartEngine<S> {
        &mut self.cart
    }

    pub fn checkout(&self) -> &CheckoutSessionState<S> {
        &self.checkout
    }

    pub fn checkout_mut(&mut self) -> &mut CheckoutSessionState<S> {
        &mut self.checkout
    }

    pub fn gateway(&self) -> &OrderSubmissionGateway<O> {
        &self.gateway
    }

    /// Returns the signed-in user, if any.
    pub fn auth(&self) -> Result<Option<AuthSession>> {
        Ok(AuthSession::load(&self.store)?)
    }

    /// Fetches a product and adds one unit of it to the cart.
    #[tracing::instrument(skip(self))]
    pub async fn add_product(&mut self, product_id: &ProductId) -> Result<bool> {
        let product = bounded(
            "product lookup",
            self.timeout,
            self.catalog.product(product_id),
        )
        .await?;
        Ok(self.cart.add_item(&product)?)
    }

    /// Re-reads the stock of every cart line from the catalog.
    ///
    /// A line the catalog fails to answer for keeps its last known ceiling.
    #[tracing::instrument(skip(self))]
    pub async fn enter_cart(&mut self) -> Result<StockRefresh> {
        let ids: Vec<ProductId> = self
            .cart
            .cart()
            .items()
            .iter()
            .map(|item| item.product_id.clone())
            .collect();

        let mut report = StockRefresh::default();
        for id in ids {
            let product = match bounded("product lookup", self.timeout, self.catalog.product(&id)).await {
                Ok(product) => product,
                Err(error) => {
                    tracing::warn!(product_id = %id, %error, "stock refresh skipped");
                    report.unavailable.push(id);
                    continue;
                }
            };

            if self.cart.refresh_stock(&id, product.stock)? {
                report.updated.push(id.clone());
            }
            if !product.in_stock() {
                report.sold_out.push(id);
            }
        }
        Ok(report)
    }

    /// Loads the signed-in customer's saved addresses into the checkout.
    #[tracing::instrument(skip(self))]
    pub async fn load_addresses(&mut self) -> Result<&[DeliveryAddress]> {
        let auth = self.auth()?.ok_or(GatewayError::AuthenticationRequired)?;
        let addresses = bounded(
            "address listing",
            self.timeout,
            self.addresses.saved_addresses(&auth),
        )
        .await?;
        self.checkout.offer_addresses(addresses);
        Ok(self.checkout.offered_addresses())
    }

    /// Looks up street data for a postal code.
    pub async fn lookup_postal_code(&self, postal_code: &str) -> Result<PostalCodeLookup> {
        bounded(
            "postal code lookup",
            self.timeout,
            self.addresses.lookup_postal_code(postal_code),
        )
        .await
    }

    /// Places the order for the current cart and checkout.
    pub async fn submit(&mut self) -> Result<OrderConfirmation> {
        let auth = self.auth()?;
        self.gateway
            .submit_order(&mut self.cart, &mut self.checkout, auth.as_ref())
            .await
    }

    /// Lists the signed-in customer's orders.
    pub async fn order_history(&self) -> Result<Vec<OrderSummary>> {
        let auth = self.auth()?.ok_or(GatewayError::AuthenticationRequired)?;
        bounded(
            "order history",
            self.timeout,
            self.gateway.orders().my_orders(&auth),
        )
        .await
    }

    /// Fetches one of the signed-in customer's orders.
    pub async fn order_detail(&self, number: &OrderNumber) -> Result<OrderDetail> {
        let auth = self.auth()?.ok_or(GatewayError::AuthenticationRequired)?;
        bounded(
            "order detail",
            self.timeout,
            self.gateway.orders().order_detail(&auth, number),
        )
        .await
    }
}
