use std::sync::Arc;

use common::{Money, ProductId};
use storage::{JsonStoreExt, KeyValueStore, keys};

use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::observer::{Observer, Observers};

use super::{Cart, CartError, CartEvent, Product};

/// The cart bound to its persisted copy.
///
/// Every successful mutation is written to the store under
/// [`keys::CART`] before the in-memory cart changes, then observers are
/// notified. A refused mutation or a failed write leaves both copies as they
/// were.
pub struct CartEngine<S: KeyValueStore> {
    store: S,
    cart: Cart,
    observers: Observers<CartEvent>,
}

impl<S: KeyValueStore> CartEngine<S> {
    /// Loads the cart persisted in `store`.
    ///
    /// A missing cart loads as empty. So does a cart that cannot be decoded;
    /// the unreadable value is left in place until the next mutation
    /// overwrites it.
    pub fn load(store: S) -> Result<Self, DomainError> {
        let cart = read_cart(&store)?;
        tracing::debug!(items = cart.len(), "cart loaded");
        Ok(Self {
            store,
            cart,
            observers: Observers::new(),
        })
    }

    /// Returns the current cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registers an observer of cart changes.
    pub fn subscribe(&mut self, observer: Arc<dyn Observer<CartEvent>>) {
        self.observers.subscribe(observer);
    }

    /// Adds one unit of `product`. Returns true once the unit is in the cart.
    #[tracing::instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_item(&mut self, product: &Product) -> Result<bool, DomainError> {
        let events = self.cart.add(product).inspect_err(refused)?;
        self.commit(events)?;
        metrics::counter!("cart_items_added_total").increment(1);
        Ok(true)
    }

    /// Removes a line. Returns false if the product was not in the cart.
    #[tracing::instrument(skip(self))]
    pub fn remove_item(&mut self, product_id: &ProductId) -> Result<bool, DomainError> {
        let events = self.cart.remove(product_id);
        self.commit(events)
    }

    /// Sets the quantity of a line, bounded by `stock_ceiling`.
    ///
    /// Returns false if the product was not in the cart or already had that
    /// quantity.
    #[tracing::instrument(skip(self))]
    pub fn set_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
        stock_ceiling: u32,
    ) -> Result<bool, DomainError> {
        let events = self
            .cart
            .set_quantity(product_id, quantity, stock_ceiling)
            .inspect_err(refused)?;
        self.commit(events)
    }

    /// Takes one unit off a line, stopping at one unit.
    #[tracing::instrument(skip(self))]
    pub fn decrement_quantity(&mut self, product_id: &ProductId) -> Result<bool, DomainError> {
        let events = self.cart.decrement(product_id).inspect_err(refused)?;
        self.commit(events)
    }

    /// Removes every line.
    #[tracing::instrument(skip(self))]
    pub fn clear(&mut self) -> Result<(), DomainError> {
        let events = self.cart.clear();
        self.commit(events)?;
        Ok(())
    }

    /// Records a fresh stock reading for a line.
    #[tracing::instrument(skip(self))]
    pub fn refresh_stock(
        &mut self,
        product_id: &ProductId,
        stock_ceiling: u32,
    ) -> Result<bool, DomainError> {
        let events = self.cart.refresh_stock(product_id, stock_ceiling);
        if stock_ceiling == 0 && !events.is_empty() {
            tracing::warn!(%product_id, "product sold out while in the cart");
        }
        self.commit(events)
    }

    /// Returns the sum of every line total.
    pub fn compute_subtotal(&self) -> Money {
        self.cart.subtotal()
    }

    /// Replaces the in-memory cart with the persisted one.
    ///
    /// Used when another writer may have changed the store.
    pub fn reload(&mut self) -> Result<(), DomainError> {
        self.cart = read_cart(&self.store)?;
        Ok(())
    }

    /// Empties the in-memory cart after the store was cleared elsewhere.
    pub(crate) fn mark_cleared(&mut self) {
        let events = self.cart.clear();
        self.cart.apply_events(events.clone());
        self.observers.notify_all(&events);
    }

    /// Persists the cart with `events` applied, then swaps it in.
    ///
    /// Returns false if there was nothing to apply.
    fn commit(&mut self, events: Vec<CartEvent>) -> Result<bool, DomainError> {
        if events.is_empty() {
            return Ok(false);
        }

        let mut next = self.cart.clone();
        next.apply_events(events.iter().cloned());
        self.store.set_json(keys::CART, &next)?;
        self.cart = next;

        for event in &events {
            tracing::debug!(event_type = event.event_type(), "cart changed");
        }
        self.observers.notify_all(&events);
        Ok(true)
    }
}

impl<S: KeyValueStore> std::fmt::Debug for CartEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartEngine")
            .field("cart", &self.cart)
            .field("observers", &self.observers)
            .finish()
    }
}

fn read_cart<S: KeyValueStore>(store: &S) -> Result<Cart, DomainError> {
    match store.get_json::<Cart>(keys::CART) {
        Ok(cart) => Ok(cart.unwrap_or_default()),
        Err(storage::StorageError::Serialization { source, .. }) => {
            tracing::warn!(error = %source, "persisted cart is unreadable, starting empty");
            Ok(Cart::new())
        }
        Err(e) => Err(e.into()),
    }
}

fn refused(error: &CartError) {
    let reason = match error {
        CartError::OutOfStock { .. } => "out_of_stock",
        CartError::StockLimitReached { .. } => "stock_limit",
        CartError::InvalidQuantity { .. } => "invalid_quantity",
        CartError::InvalidPrice { .. } => "invalid_price",
        CartError::DuplicateLine { .. } => "duplicate_line",
    };
    metrics::counter!("cart_mutations_refused_total", "reason" => reason).increment(1);
    tracing::info!(%error, "cart mutation refused");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use storage::InMemoryStore;

    fn mug(stock: u32) -> Product {
        Product::new("1", "Mug", Money::from_cents(5000), stock).unwrap()
    }

    #[test]
    fn test_add_persists_cart() {
        let store = InMemoryStore::new();
        let mut engine = CartEngine::load(store.clone()).unwrap();

        assert!(engine.add_item(&mug(3)).unwrap());

        let persisted: Cart = store.get_json(keys::CART).unwrap().unwrap();
        assert_eq!(&persisted, engine.cart());
    }

    #[test]
    fn test_refused_add_writes_nothing() {
        let store = InMemoryStore::new();
        let mut engine = CartEngine::load(store.clone()).unwrap();

        let result = engine.add_item(&mug(0));
        assert!(matches!(
            result,
            Err(DomainError::Cart(CartError::OutOfStock { .. }))
        ));
        assert_eq!(store.write_count(), 0);
        assert!(engine.cart().is_empty());
    }

    #[test]
    fn test_noop_writes_nothing() {
        let store = InMemoryStore::new();
        let mut engine = CartEngine::load(store.clone()).unwrap();

        assert!(!engine.remove_item(&"missing".into()).unwrap());
        assert!(!engine.decrement_quantity(&"missing".into()).unwrap());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_observers_see_committed_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut engine = CartEngine::load(InMemoryStore::new()).unwrap();
        engine.subscribe(Arc::new(move |event: &CartEvent| {
            sink.lock().unwrap().push(event.event_type());
        }));

        engine.add_item(&mug(3)).unwrap();
        engine.add_item(&mug(3)).unwrap();
        let _ = engine.add_item(&mug(0));
        engine.clear().unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["ItemAdded", "QuantityChanged", "Cleared"]
        );
    }

    #[test]
    fn test_corrupt_cart_loads_empty() {
        let store = InMemoryStore::new();
        store.set(keys::CART, "{oops").unwrap();

        let engine = CartEngine::load(store).unwrap();
        assert!(engine.cart().is_empty());
    }

    #[test]
    fn test_reload_picks_up_external_writes() {
        let store = InMemoryStore::new();
        let mut first = CartEngine::load(store.clone()).unwrap();
        let mut second = CartEngine::load(store.clone()).unwrap();

        first.add_item(&mug(3)).unwrap();
        assert!(second.cart().is_empty());

        second.reload().unwrap();
        assert_eq!(second.cart().total_quantity(), 1);
    }
}
