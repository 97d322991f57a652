use common::{Money, ProductId};
use serde::{Deserialize, Deserializer, Serialize};

use super::{CartError, CartEvent, CartLineItem, Product};

/// The ordered collection of cart lines, keyed by product id.
///
/// Commands validate against the current lines and return the events they
/// would produce without touching state; [`Cart::apply`] is the only place
/// lines change. An empty event list means the command was a no-op.
///
/// Deserializing goes through [`Cart::from_lines`], so a stored cart that
/// breaks the line invariants is rejected at load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// Builds a cart from stored lines, checking each one.
    ///
    /// A zero quantity, a negative price or a product listed twice is
    /// refused. A quantity above a non-zero ceiling is lowered to the
    /// ceiling. A line with a ceiling of zero is kept as stale.
    pub fn from_lines(lines: Vec<CartLineItem>) -> Result<Self, CartError> {
        let mut cart = Cart::new();

        for mut line in lines {
            if line.quantity < 1 {
                return Err(CartError::InvalidQuantity {
                    quantity: line.quantity,
                });
            }
            if line.unit_price.is_negative() {
                return Err(CartError::InvalidPrice {
                    product_id: line.product_id,
                    price: line.unit_price,
                });
            }
            if cart.get(&line.product_id).is_some() {
                return Err(CartError::DuplicateLine {
                    product_id: line.product_id,
                });
            }
            if line.stock_ceiling > 0 && line.quantity > line.stock_ceiling {
                tracing::warn!(
                    product_id = %line.product_id,
                    quantity = line.quantity,
                    stock_ceiling = line.stock_ceiling,
                    "stored quantity above stock ceiling, lowering it"
                );
                line.quantity = line.stock_ceiling;
            }
            cart.items.push(line);
        }

        Ok(cart)
    }
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let lines = Vec::<CartLineItem>::deserialize(deserializer)?;
        Cart::from_lines(lines).map_err(serde::de::Error::custom)
    }
}

// Query methods
impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lines in insertion order.
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Returns the line for a product.
    pub fn get(&self, product_id: &ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    /// Returns the number of distinct products.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the total number of units across lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Returns the sum of `unit_price * quantity` over every line.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartLineItem::total_price).sum()
    }
}

// Command methods (return events)
impl Cart {
    /// Adds one unit of a product.
    ///
    /// The product's current stock is the ceiling: a new product enters with
    /// one unit, a present one grows by one unit while below the ceiling.
    pub fn add(&self, product: &Product) -> Result<Vec<CartEvent>, CartError> {
        product.validate()?;

        if !product.in_stock() {
            return Err(CartError::OutOfStock {
                product_id: product.id.clone(),
            });
        }

        match self.get(&product.id) {
            Some(existing) if existing.quantity >= product.stock => {
                Err(CartError::StockLimitReached {
                    product_id: product.id.clone(),
                    stock_ceiling: product.stock,
                })
            }
            Some(existing) => Ok(vec![CartEvent::QuantityChanged {
                product_id: product.id.clone(),
                previous: existing.quantity,
                quantity: existing.quantity + 1,
                stock_ceiling: product.stock,
            }]),
            None => Ok(vec![CartEvent::ItemAdded(CartLineItem::for_product(product))]),
        }
    }

    /// Removes a line. Removing an absent product is a no-op.
    pub fn remove(&self, product_id: &ProductId) -> Vec<CartEvent> {
        if self.get(product_id).is_none() {
            return vec![];
        }
        vec![CartEvent::ItemRemoved {
            product_id: product_id.clone(),
        }]
    }

    /// Overwrites the quantity of a line, checked against `stock_ceiling`.
    pub fn set_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
        stock_ceiling: u32,
    ) -> Result<Vec<CartEvent>, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        if quantity > stock_ceiling {
            return Err(CartError::StockLimitReached {
                product_id: product_id.clone(),
                stock_ceiling,
            });
        }

        let Some(existing) = self.get(product_id) else {
            return Ok(vec![]);
        };

        if existing.quantity == quantity && existing.stock_ceiling == stock_ceiling {
            return Ok(vec![]);
        }

        Ok(vec![CartEvent::QuantityChanged {
            product_id: product_id.clone(),
            previous: existing.quantity,
            quantity,
            stock_ceiling,
        }])
    }

    /// Takes one unit off a line, never going below one unit.
    ///
    /// A line already at one unit stays in the cart; removal is a separate
    /// operation. A line whose stock dropped to zero refuses adjustment.
    pub fn decrement(&self, product_id: &ProductId) -> Result<Vec<CartEvent>, CartError> {
        let Some(existing) = self.get(product_id) else {
            return Ok(vec![]);
        };

        if existing.is_out_of_stock() {
            return Err(CartError::OutOfStock {
                product_id: product_id.clone(),
            });
        }

        if existing.quantity <= 1 {
            return Ok(vec![]);
        }

        Ok(vec![CartEvent::QuantityChanged {
            product_id: product_id.clone(),
            previous: existing.quantity,
            quantity: existing.quantity - 1,
            stock_ceiling: existing.stock_ceiling,
        }])
    }

    /// Empties the cart.
    pub fn clear(&self) -> Vec<CartEvent> {
        vec![CartEvent::Cleared]
    }

    /// Records a stock ceiling freshly read from the catalog.
    ///
    /// A quantity above a new non-zero ceiling is lowered to the ceiling. A
    /// zero ceiling leaves the quantity alone: the line is kept as stale and
    /// further adjustments are refused until the shopper removes it.
    pub fn refresh_stock(&self, product_id: &ProductId, stock_ceiling: u32) -> Vec<CartEvent> {
        let Some(existing) = self.get(product_id) else {
            return vec![];
        };

        if existing.stock_ceiling == stock_ceiling {
            return vec![];
        }

        let quantity = if stock_ceiling > 0 {
            existing.quantity.min(stock_ceiling)
        } else {
            existing.quantity
        };

        vec![CartEvent::StockRefreshed {
            product_id: product_id.clone(),
            stock_ceiling,
            quantity,
        }]
    }
}

// Apply event helpers
impl Cart {
    /// Applies an event to the lines.
    ///
    /// Events are facts that already passed validation, so applying never
    /// fails; an event naming an absent product is ignored.
    pub fn apply(&mut self, event: CartEvent) {
        match event {
            CartEvent::ItemAdded(item) => {
                if self.get(&item.product_id).is_none() {
                    self.items.push(item);
                }
            }
            CartEvent::QuantityChanged {
                product_id,
                quantity,
                stock_ceiling,
                ..
            } => {
                if let Some(item) = self.get_mut(&product_id) {
                    item.quantity = quantity;
                    item.stock_ceiling = stock_ceiling;
                }
            }
            CartEvent::ItemRemoved { product_id } => {
                self.items.retain(|item| item.product_id != product_id);
            }
            CartEvent::Cleared => self.items.clear(),
            CartEvent::StockRefreshed {
                product_id,
                stock_ceiling,
                quantity,
            } => {
                if let Some(item) = self.get_mut(&product_id) {
                    item.stock_ceiling = stock_ceiling;
                    item.quantity = quantity;
                }
            }
        }
    }

    /// Applies multiple events in sequence.
    pub fn apply_events(&mut self, events: impl IntoIterator<Item = CartEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    fn get_mut(&mut self, product_id: &ProductId) -> Option<&mut CartLineItem> {
        self.items
            .iter_mut()
            .find(|item| &item.product_id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, cents: i64, stock: u32) -> Product {
        Product::new(id, format!("Product {id}"), Money::from_cents(cents), stock).unwrap()
    }

    fn cart_with(product: &Product, times: u32) -> Cart {
        let mut cart = Cart::new();
        for _ in 0..times {
            let events = cart.add(product).unwrap();
            cart.apply_events(events);
        }
        cart
    }

    #[test]
    fn test_add_new_product_inserts_one_unit() {
        let cart = cart_with(&product("A", 5000, 3), 1);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&"A".into()).unwrap().quantity, 1);
    }

    #[test]
    fn test_add_present_product_increments() {
        let cart = cart_with(&product("A", 5000, 3), 3);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_add_beyond_stock_is_refused() {
        let a = product("A", 5000, 3);
        let cart = cart_with(&a, 3);

        let result = cart.add(&a);
        assert_eq!(
            result,
            Err(CartError::StockLimitReached {
                product_id: "A".into(),
                stock_ceiling: 3
            })
        );
    }

    #[test]
    fn test_add_out_of_stock_is_refused() {
        let cart = Cart::new();
        let result = cart.add(&product("A", 5000, 0));
        assert!(matches!(result, Err(CartError::OutOfStock { .. })));
    }

    #[test]
    fn test_add_uses_latest_stock_as_ceiling() {
        let cart = cart_with(&product("A", 5000, 3), 2);
        // Stock dropped to two units since the item was added.
        let result = cart.add(&product("A", 5000, 2));
        assert!(matches!(result, Err(CartError::StockLimitReached { .. })));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let cart = cart_with(&product("A", 5000, 3), 1);
        assert!(cart.remove(&"B".into()).is_empty());
    }

    #[test]
    fn test_set_quantity_bounds() {
        let cart = cart_with(&product("A", 5000, 3), 1);
        let id: ProductId = "A".into();

        assert_eq!(
            cart.set_quantity(&id, 0, 3),
            Err(CartError::InvalidQuantity { quantity: 0 })
        );
        assert!(matches!(
            cart.set_quantity(&id, 4, 3),
            Err(CartError::StockLimitReached { .. })
        ));
        assert_eq!(cart.set_quantity(&id, 3, 3).unwrap().len(), 1);
    }

    #[test]
    fn test_set_quantity_same_value_is_noop() {
        let cart = cart_with(&product("A", 5000, 3), 2);
        assert!(cart.set_quantity(&"A".into(), 2, 3).unwrap().is_empty());
    }

    #[test]
    fn test_set_quantity_absent_is_noop() {
        let cart = Cart::new();
        assert!(cart.set_quantity(&"A".into(), 2, 3).unwrap().is_empty());
    }

    #[test]
    fn test_decrement_floors_at_one() {
        let mut cart = cart_with(&product("A", 5000, 3), 2);
        let id: ProductId = "A".into();

        for _ in 0..5 {
            let events = cart.decrement(&id).unwrap();
            cart.apply_events(events);
        }

        assert_eq!(cart.get(&id).unwrap().quantity, 1);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_refresh_stock_clamps_quantity() {
        let mut cart = cart_with(&product("A", 5000, 5), 4);
        let id: ProductId = "A".into();

        cart.apply_events(cart.refresh_stock(&id, 2));
        let line = cart.get(&id).unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.stock_ceiling, 2);
    }

    #[test]
    fn test_refresh_to_zero_keeps_stale_line() {
        let mut cart = cart_with(&product("A", 5000, 5), 2);
        let id: ProductId = "A".into();

        cart.apply_events(cart.refresh_stock(&id, 0));
        let line = cart.get(&id).unwrap();
        assert_eq!(line.quantity, 2);
        assert!(line.is_out_of_stock());

        assert!(matches!(cart.decrement(&id), Err(CartError::OutOfStock { .. })));
        assert!(matches!(
            cart.set_quantity(&id, 1, 0),
            Err(CartError::StockLimitReached { .. })
        ));
    }

    #[test]
    fn test_subtotal() {
        let mut cart = cart_with(&product("A", 5000, 3), 3);
        let events = cart.add(&product("B", 1999, 10)).unwrap();
        cart.apply_events(events);

        assert_eq!(cart.subtotal(), Money::from_cents(15000 + 1999));
    }

    #[test]
    fn test_empty_cart_subtotal_is_zero() {
        assert_eq!(Cart::new().subtotal(), Money::zero());
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut cart = Cart::new();
        for id in ["C", "A", "B"] {
            let events = cart.add(&product(id, 100, 1)).unwrap();
            cart.apply_events(events);
        }
        let ids: Vec<&str> = cart.items().iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    fn line(id: &str, quantity: u32, stock_ceiling: u32) -> CartLineItem {
        CartLineItem {
            product_id: id.into(),
            name: format!("Product {id}"),
            unit_price: Money::from_cents(1000),
            quantity,
            stock_ceiling,
        }
    }

    #[test]
    fn test_from_lines_refuses_zero_quantity() {
        let result = Cart::from_lines(vec![line("A", 0, 3)]);
        assert_eq!(result, Err(CartError::InvalidQuantity { quantity: 0 }));
    }

    #[test]
    fn test_from_lines_refuses_duplicate_product() {
        let result = Cart::from_lines(vec![line("A", 1, 3), line("A", 2, 3)]);
        assert_eq!(
            result,
            Err(CartError::DuplicateLine {
                product_id: "A".into()
            })
        );
    }

    #[test]
    fn test_from_lines_lowers_quantity_to_ceiling() {
        let cart = Cart::from_lines(vec![line("A", 9, 2), line("B", 4, 0)]).unwrap();
        assert_eq!(cart.get(&"A".into()).unwrap().quantity, 2);
        // Stale line keeps its quantity.
        assert_eq!(cart.get(&"B".into()).unwrap().quantity, 4);
    }

    #[test]
    fn test_deserialize_rejects_invalid_lines() {
        let raw = r#"[{"id":"A","nome":"A","preco":10.0,"quantidade":0,"quantidadeEstoque":3}]"#;
        assert!(serde_json::from_str::<Cart>(raw).is_err());
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let cart = cart_with(&product("A", 5000, 3), 1);
        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
    }
}
