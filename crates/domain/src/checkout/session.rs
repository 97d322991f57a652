use std::sync::Arc;

use common::{AddressId, Money, OrderNumber};
use serde::de::DeserializeOwned;
use storage::json::encode_json;
use storage::{JsonStoreExt, KeyValueStore, StorageError, StoreWrite, keys};

use crate::cart::{Cart, CartEngine};
use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::observer::{Observer, Observers};

use super::{
    CheckoutError, CheckoutEvent, CheckoutStage, DeliveryAddress, FreightKind, FreightSelection,
    PaymentInput, PaymentMethod,
};

/// The selections made so far, each absent until its step completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutSession {
    pub freight: Option<FreightSelection>,
    pub address: Option<DeliveryAddress>,
    pub payment: Option<PaymentMethod>,
}

impl CheckoutSession {
    /// Returns the stage these selections put the session at.
    pub fn stage(&self) -> CheckoutStage {
        CheckoutStage::from_selections(
            self.freight.is_some(),
            self.address.is_some(),
            self.payment.is_some(),
        )
    }

    /// Returns true if no selection has been made.
    pub fn is_empty(&self) -> bool {
        self.freight.is_none() && self.address.is_none() && self.payment.is_none()
    }
}

/// Every selection needed to place an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedSelections {
    pub freight: FreightSelection,
    pub address: DeliveryAddress,
    pub payment: PaymentMethod,
}

/// Amounts shown on the order summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutTotals {
    pub subtotal: Money,
    /// Zero until a shipping method is chosen.
    pub freight: Money,
    pub grand_total: Money,
}

/// Checkout selections bound to their persisted copies.
///
/// Each selection lives under its own key next to the cart, so a reload
/// resumes at the step the shopper left. Writes happen before the in-memory
/// session changes, then observers are notified.
pub struct CheckoutSessionState<S: KeyValueStore> {
    store: S,
    session: CheckoutSession,
    offered: Vec<DeliveryAddress>,
    chosen: Option<AddressId>,
    submitted: Option<OrderNumber>,
    observers: Observers<CheckoutEvent>,
}

impl<S: KeyValueStore> CheckoutSessionState<S> {
    /// Loads the selections persisted in `store`.
    ///
    /// A selection that cannot be decoded is treated as not made.
    pub fn load(store: S) -> Result<Self, DomainError> {
        let session = read_session(&store)?;
        tracing::debug!(stage = %session.stage(), "checkout session loaded");
        Ok(Self {
            store,
            session,
            offered: Vec::new(),
            chosen: None,
            submitted: None,
            observers: Observers::new(),
        })
    }

    /// Returns the current selections.
    pub fn session(&self) -> &CheckoutSession {
        &self.session
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the current stage.
    pub fn stage(&self) -> CheckoutStage {
        if self.submitted.is_some() {
            CheckoutStage::Submitted
        } else {
            self.session.stage()
        }
    }

    /// Returns the number of the order placed by this session, if any.
    pub fn submitted_order(&self) -> Option<&OrderNumber> {
        self.submitted.as_ref()
    }

    pub fn freight(&self) -> Option<&FreightSelection> {
        self.session.freight.as_ref()
    }

    pub fn address(&self) -> Option<&DeliveryAddress> {
        self.session.address.as_ref()
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.session.payment
    }

    /// Returns the addresses offered by the address book.
    pub fn offered_addresses(&self) -> &[DeliveryAddress] {
        &self.offered
    }

    /// Returns the address chosen but not yet confirmed.
    pub fn chosen_address(&self) -> Option<&DeliveryAddress> {
        let id = self.chosen.as_ref()?;
        self.offered.iter().find(|address| &address.id == id)
    }

    /// Registers an observer of session changes.
    pub fn subscribe(&mut self, observer: Arc<dyn Observer<CheckoutEvent>>) {
        self.observers.subscribe(observer);
    }

    /// Records the shipping method.
    #[tracing::instrument(skip(self))]
    pub fn select_freight(&mut self, kind: FreightKind) -> Result<FreightSelection, DomainError> {
        let selection = FreightSelection::new(kind);
        self.store.set_json(keys::FREIGHT, &selection)?;

        self.session.freight = Some(selection);
        self.submitted = None;
        self.emit(CheckoutEvent::FreightSelected(selection));
        Ok(selection)
    }

    /// Replaces the list the shopper chooses a delivery address from.
    ///
    /// A pending choice that is no longer offered is dropped.
    pub fn offer_addresses(&mut self, addresses: Vec<DeliveryAddress>) {
        if let Some(id) = &self.chosen {
            if !addresses.iter().any(|address| &address.id == id) {
                self.chosen = None;
            }
        }
        let count = addresses.len();
        self.offered = addresses;
        self.emit(CheckoutEvent::AddressesOffered { count });
    }

    /// Picks one of the offered addresses, pending confirmation.
    pub fn choose_address(&mut self, address_id: &AddressId) -> Result<(), CheckoutError> {
        self.require_freight()?;

        if !self.offered.iter().any(|address| &address.id == address_id) {
            return Err(CheckoutError::AddressNotFound {
                address_id: address_id.clone(),
            });
        }
        self.chosen = Some(address_id.clone());
        Ok(())
    }

    /// Confirms the chosen address as the delivery address.
    #[tracing::instrument(skip(self))]
    pub fn confirm_address(&mut self) -> Result<DeliveryAddress, DomainError> {
        self.require_freight()?;

        let address = self
            .chosen_address()
            .cloned()
            .ok_or(CheckoutError::MissingAddress)?;
        self.store_address(address.clone())?;
        Ok(address)
    }

    /// Sets the delivery address without going through the offered list.
    #[tracing::instrument(skip(self, address), fields(address_id = %address.id))]
    pub fn select_address(&mut self, address: DeliveryAddress) -> Result<(), DomainError> {
        self.require_freight()?;
        self.chosen = Some(address.id.clone());
        self.store_address(address)
    }

    /// Validates the payment step and records the method.
    ///
    /// Card details are checked and discarded; only the method is kept.
    #[tracing::instrument(skip(self, input), fields(method = %input.method()))]
    pub fn select_payment(&mut self, input: &PaymentInput) -> Result<PaymentMethod, DomainError> {
        self.require_freight()?;
        if self.session.address.is_none() {
            return Err(CheckoutError::MissingAddress.into());
        }

        let method = input.validate().inspect_err(|error| {
            tracing::info!(%error, "payment step refused");
        })?;
        self.store.set(keys::PAYMENT_METHOD, method.as_str())?;

        self.session.payment = Some(method);
        self.submitted = None;
        self.emit(CheckoutEvent::PaymentSelected { method });
        Ok(method)
    }

    /// Computes the order summary amounts for `cart`.
    pub fn totals(&self, cart: &Cart) -> CheckoutTotals {
        let subtotal = cart.subtotal();
        let freight = self
            .session
            .freight
            .map(|selection| selection.amount)
            .unwrap_or_default();
        CheckoutTotals {
            subtotal,
            freight,
            grand_total: subtotal + freight,
        }
    }

    /// Returns the selections if an order for `cart` can be placed.
    ///
    /// Missing selections are reported in step order; an empty cart is
    /// checked last.
    pub fn ensure_ready(&self, cart: &Cart) -> Result<ConfirmedSelections, CheckoutError> {
        let freight = self
            .session
            .freight
            .ok_or(CheckoutError::MissingFreightSelection)?;
        let address = self
            .session
            .address
            .clone()
            .ok_or(CheckoutError::MissingAddress)?;
        let payment = self
            .session
            .payment
            .ok_or(CheckoutError::MissingPaymentMethod)?;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        Ok(ConfirmedSelections {
            freight,
            address,
            payment,
        })
    }

    /// Ends the session after the order was accepted.
    ///
    /// The selections (and, with `clear_cart`, the cart) are removed in one
    /// batched store write. `cart` must be backed by the same store.
    #[tracing::instrument(skip(self, cart))]
    pub fn complete(
        &mut self,
        cart: &mut CartEngine<S>,
        order_number: OrderNumber,
        clear_cart: bool,
    ) -> Result<(), DomainError> {
        let mut writes: Vec<StoreWrite> = keys::CHECKOUT_SESSION
            .iter()
            .map(|key| StoreWrite::remove(*key))
            .collect();
        if clear_cart {
            writes.push(StoreWrite::set(keys::CART, encode_json(keys::CART, &Cart::new())?));
        }
        self.store.write_batch(writes)?;

        self.session = CheckoutSession::default();
        self.offered.clear();
        self.chosen = None;
        self.submitted = Some(order_number.clone());
        if clear_cart {
            cart.mark_cleared();
        }

        tracing::info!(%order_number, cart_cleared = clear_cart, "checkout completed");
        self.emit(CheckoutEvent::Completed {
            order_number,
            cart_cleared: clear_cart,
        });
        Ok(())
    }

    /// Discards every selection without placing an order.
    pub fn clear(&mut self) -> Result<(), DomainError> {
        let writes = keys::CHECKOUT_SESSION
            .iter()
            .map(|key| StoreWrite::remove(*key))
            .collect();
        self.store.write_batch(writes)?;

        self.session = CheckoutSession::default();
        self.chosen = None;
        self.submitted = None;
        self.emit(CheckoutEvent::Cleared);
        Ok(())
    }

    /// Replaces the in-memory selections with the persisted ones.
    pub fn reload(&mut self) -> Result<(), DomainError> {
        self.session = read_session(&self.store)?;
        Ok(())
    }

    fn require_freight(&self) -> Result<(), CheckoutError> {
        if self.session.freight.is_none() {
            return Err(CheckoutError::MissingFreightSelection);
        }
        Ok(())
    }

    fn store_address(&mut self, address: DeliveryAddress) -> Result<(), DomainError> {
        self.store.set_json(keys::DELIVERY_ADDRESS, &address)?;

        let address_id = address.id.clone();
        self.session.address = Some(address);
        self.submitted = None;
        self.emit(CheckoutEvent::AddressConfirmed { address_id });
        Ok(())
    }

    fn emit(&self, event: CheckoutEvent) {
        tracing::debug!(event_type = event.event_type(), stage = %self.stage(), "checkout changed");
        self.observers.notify_all(std::slice::from_ref(&event));
    }
}

impl<S: KeyValueStore> std::fmt::Debug for CheckoutSessionState<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutSessionState")
            .field("session", &self.session)
            .field("stage", &self.stage())
            .field("offered", &self.offered.len())
            .finish()
    }
}

fn read_session<S: KeyValueStore>(store: &S) -> Result<CheckoutSession, DomainError> {
    let freight = read_lenient::<FreightSelection, _>(store, keys::FREIGHT)?.map(|stored| {
        if !stored.is_consistent() {
            tracing::warn!(kind = %stored.kind, amount = %stored.amount, "stored freight amount differs from the table");
        }
        stored.normalized()
    });
    let address = read_lenient::<DeliveryAddress, _>(store, keys::DELIVERY_ADDRESS)?;
    let payment = match store.get(keys::PAYMENT_METHOD)? {
        Some(raw) => match raw.trim_matches('"').parse::<PaymentMethod>() {
            Ok(method) => Some(method),
            Err(error) => {
                tracing::warn!(%error, "ignoring stored payment method");
                None
            }
        },
        None => None,
    };

    Ok(CheckoutSession {
        freight,
        address,
        payment,
    })
}

fn read_lenient<T: DeserializeOwned, S: KeyValueStore>(
    store: &S,
    key: &str,
) -> Result<Option<T>, DomainError> {
    match store.get_json::<T>(key) {
        Ok(value) => Ok(value),
        Err(StorageError::Serialization { source, .. }) => {
            tracing::warn!(key, error = %source, "ignoring unreadable selection");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
